//! In-memory engine used by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pipelex_mcp_server::config::ServerConfig;
use pipelex_mcp_server::engine::{
    BuiltBundle, BundleHandle, ConceptRef, EngineError, InputRequirement, LoadedBundle, PipeInfo,
    PipelineEngine,
};
use pipelex_mcp_server::state::ServerState;
use pipelex_mcp_server::stuff::{PipeOutput, WorkingMemory};
use serde_json::json;

pub const PLX: &str = r#"domain = "summaries"
main_pipe = "summarize"

[pipe.summarize]
type = "PipeLLM"
inputs = { text = "Text" }
output = "Summary"
"#;

#[derive(Debug, Clone)]
pub enum Failure {
    Definition(String),
    DryRun(String),
    Unavailable,
    Slow(Duration),
}

impl Failure {
    async fn raise<T>(&self) -> Result<T, EngineError> {
        match self {
            Failure::Definition(m) => Err(EngineError::PipeDefinition(m.clone())),
            Failure::DryRun(m) => Err(EngineError::DryRun(m.clone())),
            Failure::Unavailable => Err(EngineError::Unavailable("connection refused".into())),
            Failure::Slow(d) => {
                tokio::time::sleep(*d).await;
                Err(EngineError::Unavailable("too slow".into()))
            }
        }
    }
}

pub struct FakeEngine {
    pub library: Vec<PipeInfo>,
    pub bundle: LoadedBundle,
    pub built_main_pipe: Option<String>,
    pub build_failure: Option<Failure>,
    pub load_failure: Option<Failure>,
    pub execute_failure: Option<Failure>,
    pub calls: Mutex<Vec<String>>,
    pub last_inputs: Mutex<Option<WorkingMemory>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            library: library_pipes(),
            bundle: summarize_bundle(),
            built_main_pipe: Some("summarize".into()),
            build_failure: None,
            load_failure: None,
            execute_failure: None,
            calls: Mutex::new(Vec::new()),
            last_inputs: Mutex::new(None),
        }
    }
}

impl FakeEngine {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl PipelineEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn probe(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn build_bundle(&self, brief: &str) -> Result<BuiltBundle, EngineError> {
        self.record(format!("build:{brief}"));
        if let Some(f) = &self.build_failure {
            return f.raise().await;
        }
        Ok(BuiltBundle {
            plx_content: PLX.to_string(),
            main_pipe: self.built_main_pipe.clone(),
        })
    }

    async fn load_bundle(&self, _plx_content: &str) -> Result<LoadedBundle, EngineError> {
        self.record("load");
        if let Some(f) = &self.load_failure {
            return f.raise().await;
        }
        Ok(self.bundle.clone())
    }

    async fn remove_bundle(&self, handle: &BundleHandle) -> Result<(), EngineError> {
        self.record(format!("remove:{handle}"));
        Ok(())
    }

    async fn execute(
        &self,
        pipe_code: &str,
        inputs: &WorkingMemory,
    ) -> Result<PipeOutput, EngineError> {
        self.record(format!("execute:{pipe_code}"));
        *self.last_inputs.lock().unwrap() = Some(inputs.clone());
        if let Some(f) = &self.execute_failure {
            return f.raise().await;
        }
        Ok(PipeOutput::new(json!({
            "working_memory": {
                "root": {
                    "summary": {
                        "concept": "summaries.Summary",
                        "content": { "text": "Un résumé court." }
                    }
                },
                "aliases": { "main_stuff": "summary" }
            },
            "pipeline_run_id": "run-1"
        })))
    }

    async fn list_pipes(&self) -> Result<Vec<PipeInfo>, EngineError> {
        self.record("list_pipes");
        Ok(self.library.clone())
    }
}

pub fn pipe(domain: &str, code: &str, inputs: &[(&str, &str)], output: &str) -> PipeInfo {
    PipeInfo {
        code: code.into(),
        domain: domain.into(),
        description: Some(format!("{code} pipe")),
        inputs: inputs
            .iter()
            .map(|(name, concept)| InputRequirement {
                name: (*name).into(),
                concept: ConceptRef::new(*concept),
            })
            .collect(),
        output: ConceptRef::new(output),
    }
}

pub fn library_pipes() -> Vec<PipeInfo> {
    vec![
        pipe("summaries", "summarize", &[("text", "native.Text")], "summaries.Summary"),
        pipe("builder", "pipe_builder", &[("brief", "builder.UserBrief")], "builder.PipelexBundleSpec"),
        pipe("docs", "extract_invoice", &[("page", "native.Page"), ("hint", "docs.Hint")], "docs.Invoice"),
        pipe("docs", "classify", &[], "docs.Category"),
    ]
}

pub fn summarize_bundle() -> LoadedBundle {
    let summary_schema = json!({
        "type": "object",
        "properties": { "text": { "type": "string" } }
    });
    let mut summarize = pipe("summaries", "summarize", &[("text", "native.Text")], "summaries.Summary");
    summarize.output = summarize.output.with_schema(summary_schema);
    LoadedBundle {
        handle: BundleHandle("bundle-1".into()),
        domain: "summaries".into(),
        main_pipe: Some("summarize".into()),
        pipes: vec![summarize],
    }
}

pub fn state_with(engine: Arc<FakeEngine>, root: &Path) -> ServerState {
    let mut config = ServerConfig::for_output_root(root);
    config.tool_timeout = Duration::from_secs(5);
    ServerState::new(config, engine)
}

/// Parse the single text block of a tool result.
pub fn result_json(result: &pipelex_mcp_server::protocol::ToolResult) -> serde_json::Value {
    serde_json::from_str(&result.content[0].text).expect("tool result text must be JSON")
}
