//! Process-scoped scratch storage for decoded attachments.
//!
//! One directory is created at startup and removed wholesale when the guard
//! drops, on every exit path. Files inside it are uniquely named, with the
//! sanitized declared filename kept as a readable suffix so downstream
//! extension checks still see it.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{MailprintError, Result};

/// Scoped scratch directory; recursively removed on drop.
#[derive(Debug)]
pub struct ScratchDir {
    dir: Option<TempDir>,
}

impl ScratchDir {
    /// Create a fresh scratch directory under the system temp root.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("mailprint-")
            .tempdir()
            .map_err(|e| MailprintError::io(std::env::temp_dir(), e))?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir: Some(dir) })
    }

    /// Path of the scratch directory.
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            // Only reachable mid-drop.
            None => Path::new(""),
        }
    }

    /// Write fully decoded attachment bytes to a new uniquely named file and
    /// return its path.
    ///
    /// The attachment is discarded on any write failure; no truncated file
    /// stays behind for the caller to reference.
    pub fn store(&self, declared_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let suffix = format!("_{}", sanitize_filename_part(declared_name, 120));
        let mut file = tempfile::Builder::new()
            .prefix("att-")
            .suffix(&suffix)
            .tempfile_in(self.path())
            .map_err(|e| MailprintError::io(self.path(), e))?;

        file.write_all(bytes)
            .map_err(|e| MailprintError::io(file.path(), e))?;

        let path = file.path().to_path_buf();
        file.keep()
            .map_err(|e| MailprintError::io(&path, e.error))?;
        Ok(path)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            // Never remove the OS-wide temp root, even if directory creation
            // degenerated to it.
            if dir.path() == std::env::temp_dir() {
                tracing::warn!(
                    path = %dir.path().display(),
                    "scratch directory is the system temp root; leaving it in place"
                );
                std::mem::forget(dir);
            }
        }
    }
}

/// Sanitize a declared filename for use as a storage-name suffix.
///
/// Replaces path separators and other unsafe characters with `_` and
/// truncates to `max_len` characters, keeping the extension intact.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '@') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        return "unnamed".to_string();
    }
    if sanitized.chars().count() <= max_len {
        return sanitized;
    }

    match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().count() < max_len => {
            let keep = max_len - ext.chars().count() - 1;
            let stem: String = stem.chars().take(keep).collect();
            format!("{stem}.{ext}")
        }
        _ => sanitized.chars().take(max_len).collect(),
    }
}
