use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Default timeout for a single engine call (10 minutes; pipeline runs are slow).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

/// Default base URL of the Pipelex API service.
const DEFAULT_ENGINE_URL: &str = "http://127.0.0.1:8081";

/// File name (without extension) of a built bundle.
const BUNDLE_FILE_NAME: &str = "bundle";

/// Base name of numbered builder output directories.
const BUILDER_DIR_BASE_NAME: &str = "pipeline";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("--host must not be empty")]
    EmptyHost,

    #[error("PIPELEX_MCP_TOOL_TIMEOUT_SECS must be a positive integer")]
    ZeroTimeout,

    #[error("PIPELEX_API_URL must be an http(s) URL, got '{0}'")]
    EngineUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout (for desktop agents).
    Stdio,
    /// JSON-RPC over HTTP POST (for local development).
    Http,
}

/// Pipelex MCP Server
#[derive(Debug, Clone, Parser)]
#[command(name = "pipelex-mcp-server", version, about, long_about = None)]
pub struct Cli {
    /// Use 'stdio' for Claude/Cursor. Use 'http' for local dev.
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// HTTP host (IP address or host name)
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// HTTP port
    #[arg(long, default_value_t = 9003)]
    pub port: u16,

    /// Log level or filter directive (default: info)
    #[arg(long, env = "PIPELEX_MCP_LOG", default_value = "info")]
    pub log_level: String,

    /// If set, logs go to this file. Otherwise stderr.
    #[arg(long, env = "PIPELEX_MCP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Base URL of the Pipelex API service
    #[arg(long, env = "PIPELEX_API_URL", default_value = DEFAULT_ENGINE_URL)]
    pub engine_url: String,

    /// Bearer token for the Pipelex API service
    #[arg(long, env = "PIPELEX_API_TOKEN", hide_env_values = true)]
    pub engine_token: Option<String>,

    /// Max seconds per engine call
    #[arg(long, env = "PIPELEX_MCP_TOOL_TIMEOUT_SECS", default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
    pub tool_timeout_secs: u64,

    /// Root directory for built pipelines
    #[arg(long, env = "PIPELEX_MCP_OUTPUT_DIR", default_value = "results")]
    pub output_dir: PathBuf,

    /// Directory receiving pipe_output.json after each run
    #[arg(long, env = "PIPELEX_MCP_RESULTS_DIR", default_value = "results/mcp")]
    pub results_dir: PathBuf,
}

/// Where and how built bundles are saved.
#[derive(Debug, Clone)]
pub struct BuilderOutput {
    pub output_dir: PathBuf,
    pub dir_base_name: String,
    pub bundle_file_name: String,
}

impl BuilderOutput {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            dir_base_name: BUILDER_DIR_BASE_NAME.to_string(),
            bundle_file_name: BUNDLE_FILE_NAME.to_string(),
        }
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: Transport,
    /// Host name or address; resolved when the HTTP listener binds.
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub engine_url: String,
    pub engine_token: Option<String>,
    pub tool_timeout: Duration,
    pub builder: BuilderOutput,
    pub results_dir: PathBuf,
}

impl ServerConfig {
    /// Resolve command-line arguments (with their environment fallbacks).
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let host = cli.host.trim().to_string();
        if host.is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        if cli.tool_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        if !cli.engine_url.starts_with("http://") && !cli.engine_url.starts_with("https://") {
            return Err(ConfigError::EngineUrl(cli.engine_url));
        }

        Ok(Self {
            transport: cli.transport,
            host,
            port: cli.port,
            log_level: cli.log_level,
            log_file: cli.log_file,
            engine_url: cli.engine_url,
            engine_token: cli.engine_token.filter(|t| !t.is_empty()),
            tool_timeout: Duration::from_secs(cli.tool_timeout_secs),
            builder: BuilderOutput::new(cli.output_dir),
            results_dir: cli.results_dir,
        })
    }

    /// Configuration rooted in `dir`, with defaults everywhere else.
    pub fn for_output_root(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 9003,
            log_level: "info".to_string(),
            log_file: None,
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            engine_token: None,
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            builder: BuilderOutput::new(dir.clone()),
            results_dir: dir.join("mcp"),
        }
    }
}
