use crate::Engine;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

/// Browser front door: one engine, and its cache, per worker
#[wasm_bindgen]
pub struct WasmEngine {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook::set_once();

        WasmEngine {
            engine: Engine::new(),
        }
    }

    /// Analyze `source` with parameter overrides given as a JSON object of
    /// integers. Returns the analysis as JSON.
    #[wasm_bindgen(js_name = analyze)]
    pub fn analyze(&mut self, source: &str, params_json: &str) -> String {
        let overrides: HashMap<String, i64> = if params_json.trim().is_empty() {
            HashMap::new()
        } else {
            match serde_json::from_str(params_json) {
                Ok(overrides) => overrides,
                Err(e) => {
                    return error_json(&format!(
                        "Parameters must be a JSON object of integers: {}",
                        e
                    ))
                }
            }
        };

        let analysis = self.engine.analyze(source, &overrides);
        match serde_json::to_string(&analysis) {
            Ok(json) => json,
            Err(e) => error_json(&format!("Failed to serialize analysis: {}", e)),
        }
    }

    /// Drop cache entries unused since the previous sweep; returns how many.
    #[wasm_bindgen(js_name = sweepCache)]
    pub fn sweep_cache(&mut self) -> usize {
        self.engine.sweep_cache()
    }
}

impl Default for WasmEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({
        "results": [],
        "errors": [message],
        "parameter_groups": [],
    })
    .to_string()
}
