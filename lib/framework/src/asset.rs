use std::env::current_exe;
use std::path::Path;
use std::path::PathBuf;

use crate::exception;
use crate::exception::CoreRsResult;
use crate::exception::error_code;

/// Resolves an asset shipped next to the executable, e.g. `assets/conf.json`.
///
/// Debug builds running from `target/debug` fall back to the crate source folder.
pub fn asset_path(path: &str) -> CoreRsResult<PathBuf> {
    let exe_path = current_exe()?;
    let asset_path = find_asset_path(&exe_path, path);
    if asset_path.exists() {
        return Ok(asset_path);
    }
    Err(exception!(
        code = error_code::NOT_FOUND,
        message = format!(
            "asset not found, asset={}, exe={}",
            asset_path.to_string_lossy(),
            exe_path.to_string_lossy()
        )
    ))
}

#[cfg(debug_assertions)]
fn find_asset_path(exe_path: &Path, path: &str) -> PathBuf {
    let asset_path = exe_path.with_file_name(path);
    if asset_path.exists() {
        return asset_path;
    }
    let in_target_dir = exe_path
        .parent()
        .is_some_and(|dir| dir.ends_with("target/debug") || dir.ends_with("target/debug/deps"));
    if in_target_dir && let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let source_path = PathBuf::from(manifest_dir).join(path);
        if source_path.exists() {
            tracing::info!("load asset from source folder, asset={}", source_path.to_string_lossy());
            return source_path;
        }
    }
    asset_path
}

#[cfg(not(debug_assertions))]
fn find_asset_path(exe_path: &Path, path: &str) -> PathBuf {
    exe_path.with_file_name(path)
}
