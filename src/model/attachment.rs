//! Extracted attachment files.

use std::path::PathBuf;

/// An attachment decoded from a message and saved to the scratch directory.
///
/// `path` always refers to a fully written file: a failed write discards the
/// attachment instead of leaving a truncated file referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAttachment {
    /// Uniquely named file inside the scratch directory holding the decoded
    /// bytes. Lives until the scratch directory is removed at shutdown.
    pub path: PathBuf,

    /// Filename as declared in the message headers. May be empty or
    /// adversarial; it is only ever used, sanitized, as a readable suffix of
    /// the generated storage name.
    pub declared_name: String,
}

impl SavedAttachment {
    /// Lowercased extension of the storage path (text after the final `.`).
    ///
    /// `None` when the storage name carries no extension.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}
