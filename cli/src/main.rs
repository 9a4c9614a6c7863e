mod error_formatter;
mod formatter;
#[cfg(feature = "server")]
mod server;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use dicecalc::bundled;
use dicecalc::{parse_document, Engine, ResourceLimits};
use formatter::Formatter;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dicecalc")]
#[command(about = "Exact damage distributions for tabletop spell formulas.")]
#[command(
    long_about = "dicecalc computes exact probability distributions for dice formulas.\nThe CLI analyzes collection documents (.dice files or the bundled spell lists) and can run as an HTTP server for live editors."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where a collection document comes from
#[derive(Args)]
struct SourceArgs {
    /// Path to a collection document
    #[arg(value_name = "FILE", required_unless_present = "bundle")]
    file: Option<PathBuf>,
    /// Use a bundled collection instead of a file (see `dicecalc list`)
    #[arg(short, long, conflicts_with = "file")]
    bundle: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a collection and print the statistics of every formula
    ///
    /// Parameters keep their declared defaults unless overridden on the
    /// command line.
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Parameter overrides (format: id=value)
        ///
        /// Examples: level=5, ac=18
        #[arg(short, long = "param", value_name = "ID=VALUE")]
        params: Vec<String>,
        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
        /// Draw a histogram of each result's likely outcomes
        #[arg(long, conflicts_with = "json")]
        histogram: bool,
    },
    /// Show document structure
    ///
    /// Lists parameter groups, named definitions and formulas without
    /// evaluating anything.
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the bundled collections
    List,
    /// Start HTTP REST API server (default: localhost:3000)
    ///
    /// API: POST /analyze with {source, params}. Bursts of requests are
    /// debounced; only the most recent one is evaluated.
    Server {
        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port number to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
        /// Quiet period in milliseconds before a request is evaluated
        #[arg(long, default_value = "10")]
        quiet_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run {
            source,
            params,
            json,
            histogram,
        } => run_command(source, params, *json, *histogram),
        Commands::Show { source } => show_command(source),
        Commands::List => list_command(),
        Commands::Server {
            host,
            port,
            quiet_ms,
        } => server_command(host, *port, *quiet_ms),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            if let Some(dice_err) = e.downcast_ref::<dicecalc::DiceError>() {
                eprintln!("{}", error_formatter::format_error(dice_err));
            } else {
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Analyze and print. Returns false when the document had errors.
fn run_command(
    source: &SourceArgs,
    params: &[String],
    json: bool,
    histogram: bool,
) -> Result<bool> {
    let (source_id, text) = load_source(source)?;
    let overrides = parse_params(params)?;

    let analysis = Engine::new().analyze(&text, &overrides);

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        let formatter = Formatter::default();
        print!("{}", formatter.format_analysis(&analysis, histogram));
    }

    for diagnostic in &analysis.errors {
        eprintln!(
            "{}",
            error_formatter::format_diagnostic(diagnostic, &source_id, &text)
        );
    }

    Ok(!analysis.has_errors())
}

fn show_command(source: &SourceArgs) -> Result<bool> {
    let (source_id, text) = load_source(source)?;
    let parsed = parse_document(&text, &ResourceLimits::default())?;

    let formatter = Formatter::default();
    print!("{}", formatter.format_document(&parsed.document));

    for diagnostic in &parsed.diagnostics {
        eprintln!(
            "{}",
            error_formatter::format_diagnostic(diagnostic, &source_id, &text)
        );
    }

    Ok(parsed.diagnostics.is_empty())
}

fn list_command() -> Result<bool> {
    let formatter = Formatter::default();
    print!("{}", formatter.format_bundles(bundled::BUNDLES));
    Ok(true)
}

fn server_command(host: &str, port: u16, quiet_ms: u64) -> Result<bool> {
    #[cfg(feature = "server")]
    {
        use tokio::runtime::Runtime;
        let rt = Runtime::new()?;
        rt.block_on(async {
            let quiet_period = std::time::Duration::from_millis(quiet_ms);
            server::http::start_server(Engine::new(), host, port, quiet_period).await
        })?;
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (host, port, quiet_ms);
        eprintln!("Error: Server feature not enabled");
        eprintln!("Recompile with: cargo build --features server");
        std::process::exit(1);
    }

    Ok(true)
}

/// Read the document named by the arguments, returning a display id and its text
fn load_source(source: &SourceArgs) -> Result<(String, String)> {
    if let Some(name) = &source.bundle {
        let bundle = bundled::find(name).with_context(|| {
            let names: Vec<&str> = bundled::BUNDLES.iter().map(|b| b.name).collect();
            format!(
                "Bundle '{}' not found (available: {})",
                name,
                names.join(", ")
            )
        })?;
        return Ok((bundle.name.to_string(), bundle.source.to_string()));
    }

    let path = source
        .file
        .as_ref()
        .context("No document specified: pass a FILE or --bundle NAME")?;
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok((path.display().to_string(), text))
}

/// Parse `id=value` overrides
fn parse_params(params: &[String]) -> Result<HashMap<String, i64>> {
    params
        .iter()
        .map(|param| {
            let (id, value) = param
                .split_once('=')
                .with_context(|| format!("Invalid parameter '{}': expected ID=VALUE", param))?;
            let value: i64 = value.trim().parse().with_context(|| {
                format!("Invalid value for parameter '{}': expected an integer", id)
            })?;
            Ok((id.trim().to_string(), value))
        })
        .collect()
}
