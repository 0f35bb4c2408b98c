//! Persisted auth session (`session.json` in the data directory).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cinescope_api::supabase::Session;

/// Session file location under `data_dir`.
#[must_use]
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

/// Reads the saved session, if any.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_session(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .map(Some)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Writes the session, creating parent directories if needed.
///
/// # Errors
///
/// Returns an error if directory creation or file write fails.
pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(session).context("failed to serialize session")?;
    std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Removes the saved session. Missing files are not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_session(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}
