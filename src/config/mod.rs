mod loader;
mod types;

pub use loader::{CONFIG_FILE, load};
pub use types::{
    Config, DEFAULT_CONTAINER_PORT, DEFAULT_HOST_PORT, DEFAULT_IMAGE, DEFAULT_READINESS_ATTEMPTS,
    LaunchRequest, PackageMode,
};
