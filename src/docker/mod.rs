// Docker orchestration: runtime CLI, container lifecycle, cancellation.

pub mod engine;
pub mod lifecycle;
pub mod types;

pub use engine::{ContainerRuntime, DockerCli};
pub use lifecycle::{InstanceManager, ReclaimReport};
pub use types::{CancelToken, ContainerSpec, InstanceStatus, RuntimeInstance};
