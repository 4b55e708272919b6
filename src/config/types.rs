use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{LaunchError, Result};

pub const DEFAULT_IMAGE: &str = "nginx:alpine";
pub const DEFAULT_HOST_PORT: u16 = 8088;
pub const DEFAULT_CONTAINER_PORT: u16 = 80;
pub const DEFAULT_READINESS_ATTEMPTS: u32 = 30;

/// How the packaging tool is driven once the workload is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageMode {
    /// `tauri dev`: blocks until the window is closed.
    Dev,
    /// `tauri build`, optionally for a specific target triple.
    Release { target: Option<String> },
}

impl PackageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageMode::Dev => "dev",
            PackageMode::Release { .. } => "build",
        }
    }
}

/// One validated launch. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    image: String,
    host_port: u16,
    container_port: u16,
    mode: PackageMode,
}

impl LaunchRequest {
    pub fn new(
        image: impl Into<String>,
        host_port: u16,
        container_port: u16,
        mode: PackageMode,
    ) -> Result<Self> {
        let image = image.into();
        if image.trim().is_empty() {
            return Err(LaunchError::InvalidRequest(
                "image reference cannot be blank".into(),
            ));
        }
        if image.chars().any(char::is_whitespace) {
            return Err(LaunchError::InvalidRequest(format!(
                "image reference contains whitespace: {image:?}"
            )));
        }
        for (label, port) in [("host", host_port), ("container", container_port)] {
            if port == 0 {
                return Err(LaunchError::InvalidRequest(format!(
                    "{label} port must be in 1..=65535"
                )));
            }
        }
        Ok(Self {
            image,
            host_port,
            container_port,
            mode,
        })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    pub fn container_port(&self) -> u16 {
        self.container_port
    }

    pub fn mode(&self) -> &PackageMode {
        &self.mode
    }

    /// Address the workload is published on.
    pub fn dev_url(&self) -> String {
        format!("http://localhost:{}", self.host_port)
    }
}

/// Settings read from `.dock2tauri.yaml`. CLI flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image: String,
    pub host_port: u16,
    pub container_port: u16,
    /// Packaging project, relative to the project directory.
    pub tauri_dir: PathBuf,
    /// Command line of the packaging tool, without the `dev`/`build` verb.
    pub packager_command: String,
    pub readiness_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            host_port: DEFAULT_HOST_PORT,
            container_port: DEFAULT_CONTAINER_PORT,
            tauri_dir: PathBuf::from("src-tauri"),
            packager_command: "cargo tauri".to_string(),
            readiness_attempts: DEFAULT_READINESS_ATTEMPTS,
        }
    }
}
