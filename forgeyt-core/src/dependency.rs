use std::path::{Path, PathBuf};

use crate::config::AdvancedSettings;
use crate::error::DependencyError;

#[cfg(target_os = "windows")]
pub const DOWNLOADER_BINARY: &str = "yt-dlp.exe";
#[cfg(not(target_os = "windows"))]
pub const DOWNLOADER_BINARY: &str = "yt-dlp";

/// Get the directory where the current executable is located
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe_path| exe_path.parent().map(|p| p.to_path_buf()))
}

/// Find the downloader the host should spawn.
///
/// An explicitly configured path must exist. Otherwise the bundled copy next
/// to the host executable is preferred, then whatever `PATH` provides.
pub fn locate_downloader(settings: &AdvancedSettings) -> Result<PathBuf, DependencyError> {
    if let Some(configured) = &settings.yt_dlp_path {
        return if configured.exists() {
            Ok(configured.clone())
        } else {
            Err(DependencyError::MissingPath {
                binary: DOWNLOADER_BINARY.to_string(),
                path: configured.clone(),
            })
        };
    }

    resolve_binary(Path::new(DOWNLOADER_BINARY), executable_dir().as_deref()).ok_or_else(|| {
        DependencyError::NotFound {
            binary: DOWNLOADER_BINARY.to_string(),
        }
    })
}

/// Resolve binary path with the following priority:
/// 1. If candidate is an absolute/relative path, check if it exists
/// 2. Check in the bundle directory
/// 3. Check in PATH
pub fn resolve_binary(candidate: &Path, bundle_dir: Option<&Path>) -> Option<PathBuf> {
    if candidate.components().count() > 1 {
        return candidate.exists().then(|| candidate.to_path_buf());
    }

    let binary_name = candidate.file_name()?;

    if let Some(dir) = bundle_dir {
        let bundled_path = dir.join(binary_name);
        if bundled_path.is_file() {
            return Some(bundled_path);
        }
    }

    which::which(candidate).ok()
}
