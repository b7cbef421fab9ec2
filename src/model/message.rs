//! Normalized in-memory representation of one fetched message.

use chrono::{DateTime, Utc};

use super::attachment::SavedAttachment;

/// A mailbox message reduced to what the print pipeline needs.
///
/// Built fresh per raw message by the extractor, owned by the pipeline for
/// the duration of one batch run, and discarded (together with its scratch
/// files) at shutdown.
#[derive(Debug, Clone)]
pub struct ParsedMail {
    /// Parsed `Date:` header; current wall-clock time when the header is
    /// absent or unparseable.
    pub received_at: DateTime<Utc>,

    /// First address of the `From:` header; empty when none could be
    /// extracted.
    pub from_address: String,

    /// Decoded subject line; empty when absent.
    pub subject: String,

    /// Trimmed decoded content of the last inline part parsed. Later inline
    /// parts overwrite earlier ones; there is no concatenation.
    pub body_text: String,

    /// Extracted attachments in document order. Never null, possibly empty.
    pub attachments: Vec<SavedAttachment>,
}

impl ParsedMail {
    /// Whether any attachment survived extraction.
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
