use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Raised by SIGINT/SIGTERM and checked between launch phases.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// The underlying flag, for handing to signal handlers.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Everything needed to `docker run` the workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
}

impl ContainerSpec {
    /// Arguments passed to `docker` to start the container detached.
    pub fn run_args(&self) -> Vec<String> {
        vec![
            "run".into(),
            "-d".into(),
            "-p".into(),
            format!("{}:{}", self.host_port, self.container_port),
            "--name".into(),
            self.name.clone(),
            "--restart".into(),
            "unless-stopped".into(),
            self.image.clone(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Created,
    Running,
    Stopped,
    Removed,
}

/// The container owned by the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInstance {
    pub name: String,
    pub id: Option<String>,
    pub status: InstanceStatus,
}

impl RuntimeInstance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            status: InstanceStatus::Created,
        }
    }

    /// Id if the runtime assigned one, otherwise the name. Docker accepts both.
    pub fn handle(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_flag_reaches_every_clone() {
        let token = CancelToken::new();
        let held_by_controller = token.clone();
        assert!(!held_by_controller.is_cancelled());

        // What signal-hook does on SIGINT.
        token.flag().store(true, Ordering::SeqCst);
        assert!(held_by_controller.is_cancelled());
        held_by_controller.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn run_args_publish_port_and_restart_policy() {
        let spec = ContainerSpec {
            name: "dock2tauri-nginx-alpine-8088".into(),
            image: "nginx:alpine".into(),
            host_port: 8088,
            container_port: 80,
        };
        assert_eq!(
            spec.run_args(),
            [
                "run",
                "-d",
                "-p",
                "8088:80",
                "--name",
                "dock2tauri-nginx-alpine-8088",
                "--restart",
                "unless-stopped",
                "nginx:alpine",
            ]
        );
    }

    #[test]
    fn handle_prefers_id() {
        let mut inst = RuntimeInstance::new("dock2tauri-x-1");
        assert_eq!(inst.handle(), "dock2tauri-x-1");
        inst.id = Some("abc123".into());
        assert_eq!(inst.handle(), "abc123");
    }
}
