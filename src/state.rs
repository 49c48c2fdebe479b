use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::PipelineEngine;

/// Everything a request handler needs. Cheap to clone.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub engine: Arc<dyn PipelineEngine>,
}

impl ServerState {
    pub fn new(config: ServerConfig, engine: Arc<dyn PipelineEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
        }
    }
}
