//! Centralized error types for mailprint.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailprint library.
///
/// Setup-phase variants (connect, login, select, scratch I/O) and
/// [`MailprintError::Fetch`] abort a run; everything else is downgraded to a
/// logged, per-item outcome by the pipeline.
#[derive(Error, Debug)]
pub enum MailprintError {
    /// Configuration is missing required values or contains invalid ones.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// TCP connection to the IMAP server failed.
    #[error("cannot connect to '{addr}': {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// TLS handshake with the IMAP server failed.
    #[error("TLS handshake with '{host}' failed: {reason}")]
    Tls { host: String, reason: String },

    /// The IMAP LOGIN was rejected.
    #[error("login failed for '{user}': {source}")]
    Login { user: String, source: imap::Error },

    /// The requested mailbox could not be selected.
    #[error("cannot select mailbox '{mailbox}': {source}")]
    Select {
        mailbox: String,
        source: imap::Error,
    },

    /// Fetching the message range failed at the transport level.
    #[error("mailbox fetch failed: {0}")]
    Fetch(String),

    /// Any other IMAP protocol error (store, expunge, logout).
    #[error("IMAP protocol error: {0}")]
    Imap(#[from] imap::Error),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The raw bytes could not be parsed as a MIME message.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A print submission was rejected by the printing subsystem.
    #[error("print submission failed: {0}")]
    Print(String),
}

/// Convenience alias for `Result<T, MailprintError>`.
pub type Result<T> = std::result::Result<T, MailprintError>;

impl MailprintError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `MailprintError`
/// when no path context is available (rare — prefer `MailprintError::io`).
impl From<std::io::Error> for MailprintError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
