use std::fs;
use std::io;
use std::path::Path;

/// Minimal valid PNG: one opaque black pixel.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
    0xDE, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xF8, 0xCF, 0xC0, 0x00,
    0x00, 0x03, 0x01, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x8F, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E,
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Write `icons/icon.png` under `tauri_dir` unless one is already there.
///
/// Returns whether a placeholder was written. tauri-build refuses to compile
/// a project without it.
pub fn ensure_placeholder_icon(tauri_dir: &Path) -> io::Result<bool> {
    let icon = tauri_dir.join("icons").join("icon.png");
    if icon.exists() {
        return Ok(false);
    }
    fs::create_dir_all(tauri_dir.join("icons"))?;
    fs::write(&icon, PLACEHOLDER_PNG)?;
    Ok(true)
}
