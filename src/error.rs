use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Load-time failures. None of these abort a registry load: the offending
/// tool or command is skipped and the error is logged.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    #[error("no tool module registered under '{0}'")]
    UnknownModule(String),

    #[error("TOOL_SPEC missing in {0}")]
    MissingSpec(String),

    #[error("TOOL_SPEC invalid in {module}: {source}")]
    MalformedSpec {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing function '{function}' for {intent}.{command}")]
    MissingHandler {
        intent: String,
        command: String,
        function: String,
    },

    #[error("{intent}.{command} references undeclared parameter '{param}'")]
    UndeclaredParam {
        intent: String,
        command: String,
        param: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("match threshold must lie in [0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// Handler failures as seen by the dispatcher. Always converted into a reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0:#}")]
    Failed(anyhow::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),
}
