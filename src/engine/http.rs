use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{BuiltBundle, BundleHandle, EngineError, LoadedBundle, PipeInfo, PipelineEngine};
use crate::stuff::{PipeOutput, WorkingMemory};

/// Error body returned by the engine service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    #[serde(default)]
    error_type: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
struct BuildRequest<'a> {
    brief: &'a str,
}

#[derive(Serialize)]
struct LoadRequest<'a> {
    plx_content: &'a str,
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    pipe_code: &'a str,
    inputs: &'a WorkingMemory,
}

#[derive(Deserialize)]
struct PipesResponse {
    pipes: Vec<PipeInfo>,
}

/// [`PipelineEngine`] backed by a Pipelex API service.
pub struct HttpEngine {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pipelex-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, EngineError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let raw = resp.text().await.unwrap_or_default();
        Err(error_from_body(status.as_u16(), &raw))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, EngineError> {
        let resp = self.send(req).await?;
        resp.json::<T>()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }
}

/// Classify a non-2xx engine response.
fn error_from_body(status: u16, raw: &str) -> EngineError {
    let body = serde_json::from_str::<EngineErrorBody>(raw).unwrap_or(EngineErrorBody {
        error_type: String::new(),
        message: raw.trim().to_string(),
    });

    match body.error_type.as_str() {
        "pipe_definition_error" => EngineError::PipeDefinition(body.message),
        "dry_run_error" => EngineError::DryRun(body.message),
        "pipe_not_found" => EngineError::PipeNotFound(body.message),
        _ => EngineError::Status {
            status,
            message: body.message,
        },
    }
}

#[async_trait]
impl PipelineEngine for HttpEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        self.send(self.client.get(self.url("/health"))).await?;
        Ok(())
    }

    async fn build_bundle(&self, brief: &str) -> Result<BuiltBundle, EngineError> {
        debug!(brief_length = brief.len(), "engine build");
        self.send_json(
            self.client
                .post(self.url("/api/v1/build"))
                .json(&BuildRequest { brief }),
        )
        .await
    }

    async fn load_bundle(&self, plx_content: &str) -> Result<LoadedBundle, EngineError> {
        debug!(plx_length = plx_content.len(), "engine load bundle");
        self.send_json(
            self.client
                .post(self.url("/api/v1/bundles"))
                .json(&LoadRequest { plx_content }),
        )
        .await
    }

    async fn remove_bundle(&self, handle: &BundleHandle) -> Result<(), EngineError> {
        debug!(bundle = %handle, "engine remove bundle");
        self.send(
            self.client
                .delete(self.url(&format!("/api/v1/bundles/{}", handle.0))),
        )
        .await?;
        Ok(())
    }

    async fn execute(
        &self,
        pipe_code: &str,
        inputs: &WorkingMemory,
    ) -> Result<PipeOutput, EngineError> {
        debug!(pipe_code, stuffs = inputs.len(), "engine execute");
        let value: serde_json::Value = self
            .send_json(
                self.client
                    .post(self.url("/api/v1/pipeline/execute"))
                    .json(&ExecuteRequest { pipe_code, inputs }),
            )
            .await?;
        Ok(PipeOutput::new(value))
    }

    async fn list_pipes(&self) -> Result<Vec<PipeInfo>, EngineError> {
        let resp: PipesResponse = self.send_json(self.client.get(self.url("/api/v1/pipes"))).await?;
        Ok(resp.pipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_definition_errors() {
        let err = error_from_body(
            422,
            r#"{"error_type":"pipe_definition_error","message":"bad pipe"}"#,
        );
        assert!(matches!(err, EngineError::PipeDefinition(m) if m == "bad pipe"));
    }

    #[test]
    fn classifies_dry_run_errors() {
        let err = error_from_body(422, r#"{"error_type":"dry_run_error","message":"boom"}"#);
        assert!(matches!(err, EngineError::DryRun(m) if m == "boom"));
    }

    #[test]
    fn non_json_body_becomes_status_error() {
        let err = error_from_body(502, "Bad Gateway\n");
        match err {
            EngineError::Status { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let engine = HttpEngine::new("http://localhost:8081/", None).unwrap();
        assert_eq!(engine.url("/health"), "http://localhost:8081/health");
    }
}
