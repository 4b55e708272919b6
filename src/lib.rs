pub mod config;
pub mod controller;
pub mod deps;
pub mod docker;
pub mod error;
pub mod naming;
pub mod packager;
pub mod readiness;
pub mod shell;

pub use controller::{Controller, RunReport, exit_code};
pub use error::LaunchError;
