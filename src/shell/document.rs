use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::LaunchRequest;
use crate::naming;

const SCHEMA: &str = "../node_modules/@tauri-apps/cli/schema.json";
const TITLE_PREFIX: &str = "Dock2Tauri";

/// `tauri.conf.json` as written for one launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellConfig {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub product_name: String,
    pub version: String,
    pub identifier: String,
    pub build: BuildSection,
    pub app: AppSection,
    pub bundle: BundleSection,
    pub plugins: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSection {
    pub before_build_command: String,
    pub before_dev_command: String,
    pub dev_url: String,
    pub frontend_dist: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub security: Security,
    pub windows: Vec<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Security {
    /// Serialized as `null`: no content security policy.
    pub csp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub resizable: bool,
    pub fullscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSection {
    pub active: bool,
    pub targets: Vec<String>,
    pub icon: Vec<String>,
    pub resources: Vec<String>,
    pub external_bin: Vec<String>,
    pub copyright: String,
    pub category: String,
    pub short_description: String,
    pub long_description: String,
}

/// Installer formats the host can produce.
pub fn bundle_targets() -> Vec<String> {
    let targets: &[&str] = if cfg!(target_os = "macos") {
        &["app", "dmg"]
    } else if cfg!(windows) {
        &["msi", "nsis"]
    } else {
        &["appimage", "deb", "rpm"]
    };
    targets.iter().map(|t| t.to_string()).collect()
}

impl ShellConfig {
    /// Build the shell configuration pointing at the launched workload.
    pub fn generate(request: &LaunchRequest) -> Self {
        let image = request.image();
        Self {
            schema: SCHEMA.to_string(),
            product_name: format!("{TITLE_PREFIX} - {}", naming::product_slug(image)),
            version: "1.0.0".to_string(),
            identifier: format!("com.dock2tauri.{}", naming::identifier_slug(image)),
            build: BuildSection {
                before_build_command: String::new(),
                before_dev_command: String::new(),
                dev_url: request.dev_url(),
                frontend_dist: "../app".to_string(),
            },
            app: AppSection {
                security: Security { csp: None },
                windows: vec![WindowSpec {
                    title: format!("{TITLE_PREFIX} - {image}"),
                    width: 1200,
                    height: 800,
                    min_width: 600,
                    min_height: 400,
                    resizable: true,
                    fullscreen: false,
                }],
            },
            bundle: BundleSection {
                active: true,
                targets: bundle_targets(),
                icon: Vec::new(),
                resources: Vec::new(),
                external_bin: Vec::new(),
                copyright: String::new(),
                category: "DeveloperTool".to_string(),
                short_description: "Docker App in Tauri".to_string(),
                long_description: format!("Running {image} as desktop application"),
            },
            plugins: Map::new(),
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}
