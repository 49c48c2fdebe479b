use std::collections::BTreeMap;

use serde::Serialize;

use super::engine_call;
use crate::engine::PipeInfo;
use crate::protocol::ToolResult;
use crate::state::ServerState;

/// Domains holding the engine's own machinery, hidden from listings.
const INTERNAL_DOMAINS: &[&str] = &["builder", "pipe_design", "concept", "inputs_handler"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipeSummary {
    pub description: String,
    pub inputs: String,
    pub output: String,
}

/// domain → pipe code → summary
pub type PipeListing = BTreeMap<String, BTreeMap<String, PipeSummary>>;

/// Handle a `list_available_pipes` tool call.
pub async fn handle(state: &ServerState) -> ToolResult {
    match engine_call(state.config.tool_timeout, "list_pipes", state.engine.list_pipes()).await {
        Ok(pipes) => ToolResult::json(&group_pipes(pipes)),
        Err(err) => err.into(),
    }
}

/// Group pipes by domain, skipping internal domains.
pub fn group_pipes(mut pipes: Vec<PipeInfo>) -> PipeListing {
    pipes.sort_by(|a, b| (&a.domain, &a.code).cmp(&(&b.domain, &b.code)));

    let mut listing = PipeListing::new();
    for pipe in pipes {
        if INTERNAL_DOMAINS.contains(&pipe.domain.as_str()) {
            continue;
        }

        let inputs = pipe
            .inputs
            .iter()
            .map(|req| format!("{}: {}", req.name, format_concept_code(&req.concept.code, &pipe.domain)))
            .collect::<Vec<_>>()
            .join(", ");

        let summary = PipeSummary {
            description: pipe.description.clone().unwrap_or_default(),
            inputs,
            output: format_concept_code(&pipe.output.code, &pipe.domain),
        };
        listing
            .entry(pipe.domain.clone())
            .or_default()
            .insert(pipe.code, summary);
    }
    listing
}

/// Drop the domain prefix of a concept code when it is the current domain.
pub fn format_concept_code(concept_code: &str, current_domain: &str) -> String {
    let parts: Vec<&str> = concept_code.split('.').collect();
    match parts.as_slice() {
        [domain, code] if *domain == current_domain => (*code).to_string(),
        _ => concept_code.to_string(),
    }
}
