use std::path::PathBuf;

use thiserror::Error;

/// Every failure a launch can run into, fatal or not.
///
/// Only the fatal variants (see [`LaunchError::is_fatal`]) abort the run and
/// change the exit code. The rest are logged as warnings and the run goes on.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("invalid launch request: {0}")]
    InvalidRequest(String),

    #[error("required dependency missing: {tool}\n{detail}")]
    DependencyMissing { tool: String, detail: String },

    #[error("could not reclaim container {container} on port {port}: {detail}")]
    PortReclaimWarning {
        port: u16,
        container: String,
        detail: String,
    },

    #[error("failed to launch container {name}:\n{stderr}")]
    LaunchFailure { name: String, stderr: String },

    #[error("{url} did not answer 200 after {attempts} attempts")]
    ReadinessTimeout { url: String, attempts: u32 },

    #[error("failed to write shell configuration {}: {source}", path.display())]
    ConfigWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("packaging tool `{command}` failed: {detail}")]
    PackagingInvocationFailure { command: String, detail: String },

    #[error("teardown step `{step}` failed: {detail}")]
    TeardownWarning { step: &'static str, detail: String },
}

impl LaunchError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_)
                | Self::DependencyMissing { .. }
                | Self::LaunchFailure { .. }
                | Self::ConfigWriteFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LaunchError>;
