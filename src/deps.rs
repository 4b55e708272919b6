//! Pre-flight checks. Read-only: nothing is started or written.

use tracing::{info, warn};

use crate::docker::ContainerRuntime;
use crate::error::{LaunchError, Result};
use crate::packager::Packager;

/// What a passing check still found missing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DependencyReport {
    /// Tools whose absence only degrades the run.
    pub missing_optional: Vec<String>,
}

/// Fail if the container runtime is unusable; note a missing packager.
pub fn verify(
    runtime: &dyn ContainerRuntime,
    packager: &dyn Packager,
) -> Result<DependencyReport> {
    info!("checking dependencies");

    runtime
        .check_available()
        .map_err(|e| LaunchError::DependencyMissing {
            tool: "docker".to_string(),
            detail: format!("{e:#}"),
        })?;

    let mut report = DependencyReport::default();
    if !packager.is_available() {
        warn!(
            program = packager.program(),
            "packaging tool not found; the desktop shell cannot be started"
        );
        report.missing_optional.push(packager.program().to_string());
    }

    info!("dependencies check passed");
    Ok(report)
}
