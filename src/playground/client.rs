//! Rust playground evaluation client.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::http_client;
use crate::core::config::PlaygroundConfig;
use crate::core::models::EvaluationResult;

/// Runs a complete program somewhere and reports what happened.
#[async_trait]
pub trait Evaluate: Send + Sync {
    async fn evaluate(&self, code: &str) -> EvaluationResult;
}

pub struct PlaygroundClient {
    http: Client,
    url: String,
    base_request: Map<String, Value>,
}

impl PlaygroundClient {
    #[must_use]
    pub fn new(config: &PlaygroundConfig) -> Self {
        Self {
            http: http_client(config.timeout),
            url: config.evaluate_url.clone(),
            base_request: config.base_request.clone(),
        }
    }

    /// Builds a fresh request body from the base flags plus `code`.
    #[must_use]
    pub fn build_request(&self, code: &str) -> Value {
        let mut body = self.base_request.clone();
        body.insert("code".to_string(), Value::String(code.to_string()));
        Value::Object(body)
    }

    async fn post(&self, code: &str) -> Result<Value, reqwest::Error> {
        let body = self.build_request(code);
        let response = self.http.post(&self.url).json(&body).send().await?;
        let status = response.status();
        let value = response.json::<Value>().await?;
        debug!(%status, "playground responded");
        Ok(value)
    }
}

#[async_trait]
impl Evaluate for PlaygroundClient {
    async fn evaluate(&self, code: &str) -> EvaluationResult {
        match self.post(code).await {
            Ok(body) => classify(&body),
            Err(e) => {
                warn!("Playground request failed: {}", e);
                EvaluationResult::Unknown
            }
        }
    }
}

/// Compiler diagnostics win over program output; anything else is unknown.
#[must_use]
pub fn classify(body: &Value) -> EvaluationResult {
    let field = |name: &str| {
        body.get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    if let Some(rustc) = field("rustc") {
        EvaluationResult::CompileError(rustc)
    } else if let Some(program) = field("program") {
        EvaluationResult::Success(program)
    } else {
        EvaluationResult::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn config() -> PlaygroundConfig {
        let mut base_request = Map::new();
        base_request.insert("version".to_string(), json!("stable"));
        base_request.insert("optimize".to_string(), json!("0"));
        PlaygroundConfig {
            evaluate_url: "http://127.0.0.1:9/evaluate.json".to_string(),
            share_url: "https://play.rust-lang.org/".to_string(),
            template: "$snippet".to_string(),
            base_request,
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn classify_prefers_compiler_output() {
        let body = json!({"rustc": "error[E0425]", "program": "ignored"});
        assert_eq!(
            classify(&body),
            EvaluationResult::CompileError("error[E0425]".to_string())
        );
    }

    #[test]
    fn classify_program_output_is_success() {
        let body = json!({"rustc": "", "program": "2\n"});
        assert_eq!(classify(&body), EvaluationResult::Success("2\n".to_string()));
    }

    #[test]
    fn classify_empty_or_foreign_shapes_are_unknown() {
        assert_eq!(classify(&json!({})), EvaluationResult::Unknown);
        assert_eq!(
            classify(&json!({"rustc": "", "program": ""})),
            EvaluationResult::Unknown
        );
        assert_eq!(classify(&json!({"rustc": 42})), EvaluationResult::Unknown);
        assert_eq!(classify(&json!([1, 2, 3])), EvaluationResult::Unknown);
    }

    #[test]
    fn build_request_leaves_base_untouched() {
        let client = PlaygroundClient::new(&config());
        let first = client.build_request("fn main() {}");
        let second = client.build_request("fn main() { 1; }");

        assert_eq!(first["code"], "fn main() {}");
        assert_eq!(second["code"], "fn main() { 1; }");
        assert_eq!(second["version"], "stable");
        assert!(!client.base_request.contains_key("code"));
    }

    #[tokio::test]
    async fn unreachable_service_is_unknown() {
        let client = PlaygroundClient::new(&config());
        assert_eq!(client.evaluate("fn main() {}").await, EvaluationResult::Unknown);
    }
}
