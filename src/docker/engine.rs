use std::process::{Command, Output};

use anyhow::{Context, Result, bail};
use tracing::debug;

use super::types::ContainerSpec;

/// The container operations a launch needs.
///
/// Errors carry the runtime's own diagnostics so they can be shown verbatim.
pub trait ContainerRuntime {
    /// Liveness query against the daemon.
    fn check_available(&self) -> Result<()>;

    /// Create and start a detached container, returning its id.
    fn start_instance(&self, spec: &ContainerSpec) -> Result<String>;

    fn stop_instance(&self, handle: &str) -> Result<()>;

    fn remove_instance(&self, handle: &str) -> Result<()>;

    /// Ids of running containers publishing `port`, plus any container
    /// (in any state) named exactly `name`. No duplicates.
    fn list_by_port_or_name(&self, port: u16, name: &str) -> Result<Vec<String>>;
}

/// [`ContainerRuntime`] backed by the `docker` CLI.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl DockerCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn exec(&self, args: &[&str]) -> Result<Output> {
        debug!(program = %self.program, ?args, "exec");
        Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| {
                format!(
                    "failed to invoke `{}`; is it installed and on PATH?",
                    self.program
                )
            })
    }

    /// Run and return trimmed stdout, or fail with stderr verbatim.
    fn exec_ok(&self, args: &[&str]) -> Result<String> {
        let output = self.exec(args)?;
        if !output.status.success() {
            bail!("{}", diagnostics(&output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl ContainerRuntime for DockerCli {
    fn check_available(&self) -> Result<()> {
        let output = self.exec(&["info"])?;
        if !output.status.success() {
            bail!(
                "docker daemon is not running ({}):\n{}",
                output.status,
                diagnostics(&output)
            );
        }
        Ok(())
    }

    fn start_instance(&self, spec: &ContainerSpec) -> Result<String> {
        let args = spec.run_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let id = self.exec_ok(&args)?;
        if id.is_empty() {
            bail!("docker run printed no container id");
        }
        Ok(id)
    }

    fn stop_instance(&self, handle: &str) -> Result<()> {
        self.exec_ok(&["stop", handle]).map(drop)
    }

    fn remove_instance(&self, handle: &str) -> Result<()> {
        self.exec_ok(&["rm", handle]).map(drop)
    }

    fn list_by_port_or_name(&self, port: u16, name: &str) -> Result<Vec<String>> {
        let by_port = self.exec_ok(&["ps", "-q", "--filter", &format!("publish={port}")])?;
        let by_name = self.exec_ok(&["ps", "-aq", "--filter", &format!("name=^/{name}$")])?;
        Ok(merge_ids(&by_port, &by_name))
    }
}

/// stderr if the tool wrote any, else stdout.
fn diagnostics(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.to_string()
    }
}

fn merge_ids(first: &str, second: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in first.lines().chain(second.lines()).map(str::trim) {
        if !id.is_empty() && !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
