//! Drive the desktop packaging tool (`cargo tauri dev` / `cargo tauri build`).

use std::path::Path;
use std::process::{Child, Command};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::config::PackageMode;
use crate::docker::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How a packaging run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackagerExit {
    Success,
    Failed { code: Option<i32> },
    /// Killed because cancellation was requested.
    Interrupted,
}

/// The packaging operations a launch needs.
///
/// `Err` means the tool could not be started at all.
pub trait Packager {
    /// Executable the tool is launched through.
    fn program(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Human-readable command line for `mode`, used in diagnostics.
    fn describe(&self, mode: &PackageMode) -> String;

    /// Foreground dev session. Blocks until the app is closed.
    fn run_dev(&self, project_dir: &Path, cancel: &CancelToken) -> Result<PackagerExit>;

    /// Release build, optionally cross-compiled for `target`.
    fn run_build(
        &self,
        project_dir: &Path,
        target: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<PackagerExit>;
}

/// [`Packager`] backed by the Tauri CLI.
#[derive(Debug, Clone)]
pub struct TauriCli {
    program: String,
    base_args: Vec<String>,
}

impl Default for TauriCli {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            base_args: vec!["tauri".to_string()],
        }
    }
}

impl TauriCli {
    /// Parse a command line such as `cargo tauri` or `npx tauri`.
    pub fn from_command_line(line: &str) -> Result<Self> {
        let mut words = shell_words::split(line)
            .with_context(|| format!("invalid packager command: {line:?}"))?
            .into_iter();
        let Some(program) = words.next() else {
            bail!("packager command cannot be blank");
        };
        Ok(Self {
            program,
            base_args: words.collect(),
        })
    }

    /// Arguments after the program name for `mode`.
    pub fn args(&self, mode: &PackageMode) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.push(mode.as_str().to_string());
        if let PackageMode::Release {
            target: Some(target),
        } = mode
        {
            args.push("--target".to_string());
            args.push(target.clone());
        }
        args
    }

    fn run(
        &self,
        mode: &PackageMode,
        project_dir: &Path,
        cancel: &CancelToken,
    ) -> Result<PackagerExit> {
        let args = self.args(mode);
        info!(
            command = %self.describe(mode),
            dir = %project_dir.display(),
            "starting packaging tool"
        );

        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(project_dir)
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program))?;

        Ok(wait(child, cancel))
    }
}

impl Packager for TauriCli {
    fn program(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn describe(&self, mode: &PackageMode) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args(mode))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run_dev(&self, project_dir: &Path, cancel: &CancelToken) -> Result<PackagerExit> {
        self.run(&PackageMode::Dev, project_dir, cancel)
    }

    fn run_build(
        &self,
        project_dir: &Path,
        target: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<PackagerExit> {
        let mode = PackageMode::Release {
            target: target.map(str::to_string),
        };
        self.run(&mode, project_dir, cancel)
    }
}

/// Wait for `child`, killing it if `cancel` fires first.
fn wait(mut child: Child, cancel: &CancelToken) -> PackagerExit {
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return PackagerExit::Success,
            // A terminal Ctrl-C reaches the child and us at the same time.
            Ok(Some(_)) if cancel.is_cancelled() => return PackagerExit::Interrupted,
            Ok(Some(status)) => {
                return PackagerExit::Failed {
                    code: status.code(),
                };
            }
            Ok(None) => {}
            Err(e) => {
                debug!(error = %e, "lost track of packaging process");
                return PackagerExit::Failed { code: None };
            }
        }

        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return PackagerExit::Interrupted;
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}
