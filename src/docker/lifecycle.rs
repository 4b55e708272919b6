use tracing::{debug, info, warn};

use crate::config::LaunchRequest;
use crate::error::{LaunchError, Result};
use crate::naming;

use super::engine::ContainerRuntime;
use super::types::{ContainerSpec, InstanceStatus, RuntimeInstance};

/// Outcome of clearing a port before launch.
#[derive(Debug, Default)]
pub struct ReclaimReport {
    /// Containers that were stopped and removed.
    pub removed: Vec<String>,
    /// Per-container failures. Never fatal.
    pub warnings: Vec<LaunchError>,
}

/// Starts, stops and removes the workload container.
pub struct InstanceManager {
    runtime: Box<dyn ContainerRuntime>,
}

impl InstanceManager {
    pub fn new(runtime: Box<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &dyn ContainerRuntime {
        self.runtime.as_ref()
    }

    /// Stop and remove anything on `port` or already called `name`.
    ///
    /// Finding nothing is a success.
    pub fn reclaim_port(&self, port: u16, name: &str) -> ReclaimReport {
        let mut report = ReclaimReport::default();

        let occupants = match self.runtime.list_by_port_or_name(port, name) {
            Ok(ids) => ids,
            Err(e) => {
                let warning = LaunchError::PortReclaimWarning {
                    port,
                    container: name.to_string(),
                    detail: format!("{e:#}"),
                };
                warn!("{warning}");
                report.warnings.push(warning);
                return report;
            }
        };

        if occupants.is_empty() {
            debug!(port, name, "no conflicting containers");
            return report;
        }

        for id in occupants {
            // A container created with --restart but never started still needs removing.
            if let Err(e) = self.runtime.stop_instance(&id) {
                debug!(container = %id, error = %e, "stop before remove failed");
            }
            match self.runtime.remove_instance(&id) {
                Ok(()) => {
                    info!(container = %id, port, "removed conflicting container");
                    report.removed.push(id);
                }
                Err(e) => {
                    let warning = LaunchError::PortReclaimWarning {
                        port,
                        container: id,
                        detail: format!("{e:#}"),
                    };
                    warn!("{warning}");
                    report.warnings.push(warning);
                }
            }
        }
        report
    }

    /// Start the workload container for `request`.
    pub fn start(&self, request: &LaunchRequest) -> Result<RuntimeInstance> {
        let spec = ContainerSpec {
            name: naming::instance_name(request.image(), request.host_port()),
            image: request.image().to_string(),
            host_port: request.host_port(),
            container_port: request.container_port(),
        };
        let mut instance = RuntimeInstance::new(&spec.name);

        info!(
            image = %spec.image,
            host_port = spec.host_port,
            container_port = spec.container_port,
            "launching container"
        );

        match self.runtime.start_instance(&spec) {
            Ok(id) => {
                info!(id = %id, url = %request.dev_url(), "container launched");
                instance.id = Some(id);
                instance.status = InstanceStatus::Running;
                Ok(instance)
            }
            Err(e) => {
                // `docker run` can leave a created-but-unstarted container behind.
                if let Err(rm) = self.runtime.remove_instance(&spec.name) {
                    debug!(name = %spec.name, error = %rm, "nothing left to remove");
                }
                Err(LaunchError::LaunchFailure {
                    name: spec.name,
                    stderr: format!("{e:#}"),
                })
            }
        }
    }

    /// Best-effort stop. Failures are logged, never returned.
    pub fn stop(&self, instance: &mut RuntimeInstance) {
        if !matches!(
            instance.status,
            InstanceStatus::Created | InstanceStatus::Running
        ) {
            return;
        }
        if let Err(e) = self.runtime.stop_instance(instance.handle()) {
            warn!(
                "{}",
                LaunchError::TeardownWarning {
                    step: "stop container",
                    detail: format!("{e:#}"),
                }
            );
        }
        instance.status = InstanceStatus::Stopped;
    }

    /// Best-effort remove. An already removed instance is left alone.
    pub fn remove(&self, instance: &mut RuntimeInstance) {
        if instance.status == InstanceStatus::Removed {
            return;
        }
        match self.runtime.remove_instance(instance.handle()) {
            Ok(()) => {
                instance.status = InstanceStatus::Removed;
                info!(name = %instance.name, "container stopped and removed");
            }
            Err(e) => warn!(
                "{}",
                LaunchError::TeardownWarning {
                    step: "remove container",
                    detail: format!("{e:#}"),
                }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::bail;

    use super::*;
    use crate::config::PackageMode;

    #[derive(Default)]
    struct Script {
        occupants: Vec<String>,
        fail_start: Option<String>,
        fail_remove: bool,
        calls: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct FakeRuntime(Rc<RefCell<Script>>);

    impl ContainerRuntime for FakeRuntime {
        fn check_available(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn start_instance(&self, spec: &ContainerSpec) -> anyhow::Result<String> {
            let mut s = self.0.borrow_mut();
            s.calls.push(format!("start {}", spec.name));
            if let Some(stderr) = &s.fail_start {
                bail!("{stderr}");
            }
            Ok("c0ffee".into())
        }

        fn stop_instance(&self, handle: &str) -> anyhow::Result<()> {
            self.0.borrow_mut().calls.push(format!("stop {handle}"));
            Ok(())
        }

        fn remove_instance(&self, handle: &str) -> anyhow::Result<()> {
            let mut s = self.0.borrow_mut();
            s.calls.push(format!("rm {handle}"));
            if s.fail_remove {
                bail!("Error: No such container: {handle}");
            }
            Ok(())
        }

        fn list_by_port_or_name(&self, _port: u16, _name: &str) -> anyhow::Result<Vec<String>> {
            Ok(self.0.borrow().occupants.clone())
        }
    }

    fn manager(script: Script) -> (InstanceManager, FakeRuntime) {
        let fake = FakeRuntime(Rc::new(RefCell::new(script)));
        (InstanceManager::new(Box::new(fake.clone())), fake)
    }

    fn request() -> LaunchRequest {
        LaunchRequest::new("nginx:alpine", 8088, 80, PackageMode::Dev).unwrap()
    }

    #[test]
    fn reclaim_with_no_occupant_is_a_noop() {
        let (mgr, fake) = manager(Script::default());
        let report = mgr.reclaim_port(8088, "dock2tauri-nginx-alpine-8088");
        assert!(report.removed.is_empty());
        assert!(report.warnings.is_empty());
        assert!(fake.0.borrow().calls.is_empty());

        // Idempotent.
        let again = mgr.reclaim_port(8088, "dock2tauri-nginx-alpine-8088");
        assert!(again.removed.is_empty() && again.warnings.is_empty());
    }

    #[test]
    fn reclaim_stops_and_removes_each_occupant() {
        let (mgr, fake) = manager(Script {
            occupants: vec!["old1".into(), "old2".into()],
            ..Script::default()
        });
        let report = mgr.reclaim_port(8088, "dock2tauri-nginx-alpine-8088");
        assert_eq!(report.removed, ["old1", "old2"]);
        assert_eq!(
            fake.0.borrow().calls,
            ["stop old1", "rm old1", "stop old2", "rm old2"]
        );
    }

    #[test]
    fn reclaim_failures_are_warnings() {
        let (mgr, _fake) = manager(Script {
            occupants: vec!["stuck".into()],
            fail_remove: true,
            ..Script::default()
        });
        let report = mgr.reclaim_port(8088, "n");
        assert!(report.removed.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(!report.warnings[0].is_fatal());
    }

    #[test]
    fn start_assigns_id_and_running_status() {
        let (mgr, fake) = manager(Script::default());
        let inst = mgr.start(&request()).unwrap();
        assert_eq!(inst.name, "dock2tauri-nginx-alpine-8088");
        assert_eq!(inst.id.as_deref(), Some("c0ffee"));
        assert_eq!(inst.status, InstanceStatus::Running);
        assert_eq!(fake.0.borrow().calls, ["start dock2tauri-nginx-alpine-8088"]);
    }

    #[test]
    fn start_failure_carries_stderr_and_cleans_leftover() {
        let stderr = "docker: Error response from daemon: pull access denied for nope";
        let (mgr, fake) = manager(Script {
            fail_start: Some(stderr.into()),
            ..Script::default()
        });
        let err = mgr.start(&request()).unwrap_err();
        match &err {
            LaunchError::LaunchFailure { stderr: got, .. } => assert!(got.contains(stderr)),
            other => panic!("expected LaunchFailure, got {other:?}"),
        }
        assert!(err.is_fatal());
        assert_eq!(
            fake.0.borrow().calls.last().map(String::as_str),
            Some("rm dock2tauri-nginx-alpine-8088")
        );
    }

    #[test]
    fn stop_and_remove_transition_once() {
        let (mgr, fake) = manager(Script::default());
        let mut inst = mgr.start(&request()).unwrap();

        mgr.stop(&mut inst);
        mgr.remove(&mut inst);
        assert_eq!(inst.status, InstanceStatus::Removed);

        mgr.stop(&mut inst);
        mgr.remove(&mut inst);
        let calls = fake.0.borrow().calls.clone();
        assert_eq!(calls.iter().filter(|c| c.starts_with("rm")).count(), 1);
        assert_eq!(calls.iter().filter(|c| c.starts_with("stop")).count(), 1);
    }

    #[test]
    fn failed_remove_keeps_status() {
        let (mgr, _fake) = manager(Script {
            fail_remove: true,
            ..Script::default()
        });
        let mut inst = mgr.start(&request()).unwrap();
        mgr.stop(&mut inst);
        mgr.remove(&mut inst);
        assert_eq!(inst.status, InstanceStatus::Stopped);
    }
}
