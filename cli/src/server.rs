pub mod http {
    use axum::{
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post},
        Router,
    };
    use dicecalc::{CollectionAnalysis, Engine};
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};
    use tower_http::cors::CorsLayer;
    use tracing::{debug, error, info};

    #[derive(Debug, Deserialize)]
    pub struct AnalyzeRequest {
        pub source: String,
        /// Parameter id → override value
        #[serde(default)]
        pub params: HashMap<String, i64>,
    }

    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: String,
    }

    /// What became of a submitted request
    #[derive(Debug)]
    pub enum Outcome {
        Analyzed(CollectionAnalysis),
        /// A newer request arrived before the quiet period ended
        Superseded,
    }

    struct Job {
        request: AnalyzeRequest,
        reply: oneshot::Sender<Outcome>,
    }

    /// Debouncing front of a single engine.
    ///
    /// Requests queue up in a channel. The worker waits until no new request
    /// has arrived for the quiet period, answers every older request with
    /// [`Outcome::Superseded`] and evaluates only the latest one. The engine
    /// and its cache live on the worker; analyses run on a blocking thread.
    #[derive(Clone)]
    pub struct AnalysisScheduler {
        jobs: mpsc::Sender<Job>,
    }

    impl AnalysisScheduler {
        /// Start the worker on the current tokio runtime
        pub fn spawn(engine: Engine, quiet_period: Duration) -> Self {
            let (jobs, receiver) = mpsc::channel(64);
            tokio::spawn(run_worker(engine, receiver, quiet_period));
            Self { jobs }
        }

        /// Queue a request and wait for its outcome.
        ///
        /// Returns `None` when the worker is gone.
        pub async fn submit(&self, request: AnalyzeRequest) -> Option<Outcome> {
            let (reply, outcome) = oneshot::channel();
            self.jobs.send(Job { request, reply }).await.ok()?;
            outcome.await.ok()
        }
    }

    async fn run_worker(
        mut engine: Engine,
        mut jobs: mpsc::Receiver<Job>,
        quiet_period: Duration,
    ) {
        while let Some(mut latest) = jobs.recv().await {
            // every arrival restarts the quiet period
            loop {
                match tokio::time::timeout(quiet_period, jobs.recv()).await {
                    Ok(Some(newer)) => {
                        debug!("Request superseded before evaluation");
                        let _ = latest.reply.send(Outcome::Superseded);
                        latest = newer;
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            let Job { request, reply } = latest;
            let task = tokio::task::spawn_blocking(move || {
                let analysis = engine.analyze(&request.source, &request.params);
                let evicted = engine.sweep_cache();
                (engine, analysis, evicted)
            });

            match task.await {
                Ok((returned, analysis, evicted)) => {
                    engine = returned;
                    info!(
                        results = analysis.results.len(),
                        errors = analysis.errors.len(),
                        evicted,
                        "Analyzed collection"
                    );
                    let _ = reply.send(Outcome::Analyzed(analysis));
                }
                Err(e) => {
                    // the engine went down with the task; start over with a cold cache
                    error!("Analysis task failed: {}", e);
                    engine = Engine::new();
                }
            }
        }
    }

    pub fn router(scheduler: AnalysisScheduler) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/analyze", post(analyze))
            .layer(CorsLayer::permissive())
            .with_state(scheduler)
    }

    pub async fn start_server(
        engine: Engine,
        host: &str,
        port: u16,
        quiet_period: Duration,
    ) -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "dicecalc=info,tower_http=info".into()),
            )
            .init();

        let app = router(AnalysisScheduler::spawn(engine, quiet_period));

        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        info!(
            "dicecalc server listening on {} (quiet period {:?})",
            addr, quiet_period
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    async fn health_check() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "ok",
            "service": "dicecalc",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn analyze(
        State(scheduler): State<AnalysisScheduler>,
        Json(payload): Json<AnalyzeRequest>,
    ) -> Result<Json<CollectionAnalysis>, (StatusCode, Json<ErrorResponse>)> {
        match scheduler.submit(payload).await {
            Some(Outcome::Analyzed(analysis)) => Ok(Json(analysis)),
            Some(Outcome::Superseded) => Err((
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "Superseded by a newer request".to_string(),
                }),
            )),
            None => {
                error!("Analysis worker is not running");
                Err((
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse {
                        error: "Analysis worker is not running".to_string(),
                    }),
                ))
            }
        }
    }

}
