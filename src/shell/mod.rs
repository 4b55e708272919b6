// Desktop shell configuration: generation, backup slot, project scaffolding.

mod document;
mod icon;
mod slot;

pub use document::{
    AppSection, BuildSection, BundleSection, Security, ShellConfig, WindowSpec, bundle_targets,
};
pub use icon::ensure_placeholder_icon;
pub use slot::ConfigSlot;

/// File name the packaging tool reads.
pub const CONFIG_FILE_NAME: &str = "tauri.conf.json";
