//! One launch, from dependency check to teardown.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::{LaunchRequest, PackageMode};
use crate::deps;
use crate::docker::{CancelToken, ContainerRuntime, InstanceManager, RuntimeInstance};
use crate::error::{LaunchError, Result};
use crate::naming;
use crate::packager::{Packager, PackagerExit};
use crate::readiness::{Poller, Probe, Readiness};
use crate::shell::{self, CONFIG_FILE_NAME, ConfigSlot, ShellConfig};

/// What happened during a run that did not abort.
#[derive(Debug, Default)]
pub struct RunReport {
    pub missing_optional: Vec<String>,
    /// Conflicting containers removed before launch.
    pub reclaimed: Vec<String>,
    pub readiness: Option<Readiness>,
    pub packager: Option<PackagerExit>,
    /// Non-fatal problems, already logged.
    pub warnings: Vec<LaunchError>,
    pub interrupted: bool,
}

/// Owns everything one launch touches and releases it on teardown.
///
/// Teardown runs at the end of [`Controller::run`] and again on drop; the
/// second time it finds nothing to do.
pub struct Controller {
    request: LaunchRequest,
    tauri_dir: PathBuf,
    instances: InstanceManager,
    packager: Box<dyn Packager>,
    probe: Box<dyn Probe>,
    poller: Poller,
    cancel: CancelToken,
    slot: ConfigSlot,
    instance: Option<RuntimeInstance>,
    released: Option<RuntimeInstance>,
}

impl Controller {
    pub fn new(
        request: LaunchRequest,
        tauri_dir: impl Into<PathBuf>,
        runtime: Box<dyn ContainerRuntime>,
        packager: Box<dyn Packager>,
        probe: Box<dyn Probe>,
        cancel: CancelToken,
    ) -> Self {
        let tauri_dir = tauri_dir.into();
        let slot = ConfigSlot::new(tauri_dir.join(CONFIG_FILE_NAME));
        Self {
            request,
            tauri_dir,
            instances: InstanceManager::new(runtime),
            packager,
            probe,
            poller: Poller::default(),
            cancel,
            slot,
            instance: None,
            released: None,
        }
    }

    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    pub fn config_path(&self) -> &Path {
        self.slot.path()
    }

    /// The live container, if one is running.
    pub fn instance(&self) -> Option<&RuntimeInstance> {
        self.instance.as_ref()
    }

    /// The container as it was left by teardown.
    pub fn released(&self) -> Option<&RuntimeInstance> {
        self.released.as_ref()
    }

    /// Run every phase, then tear down whatever was set up.
    pub fn run(&mut self) -> Result<RunReport> {
        let result = self.execute();
        if let Err(e) = &result {
            error!("{e}");
        }
        self.teardown();
        result
    }

    fn execute(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();

        let deps = deps::verify(self.instances.runtime(), self.packager.as_ref())?;
        report.missing_optional = deps.missing_optional;
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        let name = naming::instance_name(self.request.image(), self.request.host_port());
        info!(port = self.request.host_port(), "stopping existing containers");
        let reclaim = self.instances.reclaim_port(self.request.host_port(), &name);
        report.reclaimed = reclaim.removed;
        report.warnings.extend(reclaim.warnings);
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        self.instance = Some(self.instances.start(&self.request)?);
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        let url = self.request.dev_url();
        let readiness = self.poller.wait(self.probe.as_ref(), &url, &self.cancel);
        if let Readiness::TimedOut { attempts } = readiness {
            report.warnings.push(LaunchError::ReadinessTimeout {
                url: url.clone(),
                attempts,
            });
        }
        report.readiness = Some(readiness);
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        self.write_shell_config()?;
        if self.interrupted(&mut report) {
            return Ok(report);
        }

        self.invoke_packager(&mut report);
        Ok(report)
    }

    fn interrupted(&self, report: &mut RunReport) -> bool {
        if self.cancel.is_cancelled() {
            info!("interrupted by user");
            report.interrupted = true;
        }
        report.interrupted
    }

    fn write_shell_config(&mut self) -> Result<()> {
        info!("updating shell configuration");
        let doc = ShellConfig::generate(&self.request);
        let json = doc
            .to_json()
            .map_err(|e| LaunchError::ConfigWriteFailure {
                path: self.slot.path().to_path_buf(),
                source: std::io::Error::other(e),
            })?;
        self.slot.write(json.as_bytes())?;

        match shell::ensure_placeholder_icon(&self.tauri_dir) {
            Ok(true) => info!("created placeholder icon"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not create placeholder icon"),
        }
        Ok(())
    }

    fn invoke_packager(&self, report: &mut RunReport) {
        let mode = self.request.mode();
        let command = self.packager.describe(mode);
        let outcome = match mode {
            PackageMode::Dev => self.packager.run_dev(&self.tauri_dir, &self.cancel),
            PackageMode::Release { target } => {
                self.packager
                    .run_build(&self.tauri_dir, target.as_deref(), &self.cancel)
            }
        };
        // The tool may die from the same signal that cancelled us.
        let outcome = match outcome {
            Ok(PackagerExit::Failed { .. }) if self.cancel.is_cancelled() => {
                Ok(PackagerExit::Interrupted)
            }
            other => other,
        };

        let failure = match outcome {
            Ok(PackagerExit::Success) => {
                info!(command = %command, "packaging tool finished");
                report.packager = Some(PackagerExit::Success);
                return;
            }
            Ok(PackagerExit::Interrupted) => {
                info!("application interrupted by user");
                report.interrupted = true;
                report.packager = Some(PackagerExit::Interrupted);
                return;
            }
            Ok(exit @ PackagerExit::Failed { code }) => {
                report.packager = Some(exit);
                match code {
                    Some(code) => format!("exited with status {code}"),
                    None => "terminated by a signal".to_string(),
                }
            }
            Err(e) => format!("{e:#}"),
        };

        let err = LaunchError::PackagingInvocationFailure {
            command,
            detail: failure,
        };
        error!("{err}");
        info!(url = %self.request.dev_url(), "container is still reachable");
        if let Some(id) = self.instance.as_ref().and_then(|i| i.id.as_deref()) {
            info!(id, "container id");
        }
        report.warnings.push(err);
    }

    /// Stop and remove the container, then restore the previous shell config.
    ///
    /// Safe to call at any point and any number of times.
    pub fn teardown(&mut self) {
        if self.instance.is_none() && !self.slot.has_backup() {
            return;
        }
        info!("cleaning up");

        if let Some(mut instance) = self.instance.take() {
            self.instances.stop(&mut instance);
            self.instances.remove(&mut instance);
            self.released = Some(instance);
        }

        self.slot.restore();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Process exit code for the outcome of [`Controller::run`].
pub fn exit_code(result: &Result<RunReport>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) if e.is_fatal() => 1,
        Err(_) => 0,
    }
}
