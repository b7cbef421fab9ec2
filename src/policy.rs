//! Admission policy: which messages, and which of their attachments, may be
//! printed.
//!
//! Pure decision logic with no I/O. Sender matching is case-sensitive exact
//! membership in the allow-list; extension matching is case-insensitive on
//! the attachment side. Extension matching decides eligibility of the
//! message as a whole: when a message is eligible, all of its attachments
//! qualify, not only those with a matching extension.

use std::collections::BTreeSet;
use std::path::Path;

use crate::model::attachment::SavedAttachment;
use crate::model::message::ParsedMail;

/// Extension filtering mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionFilter {
    /// No extension restriction configured; every attachment passes.
    Any,
    /// Only the listed lowercase extensions (without the dot) pass.
    AllowList(BTreeSet<String>),
}

impl ExtensionFilter {
    /// Build a filter from configured entries.
    ///
    /// Entries are trimmed, lowercased, and stripped of a leading dot. An
    /// empty list resolves to [`ExtensionFilter::Any`]: "no restriction
    /// configured", not "nothing qualifies".
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = entries
            .into_iter()
            .map(|e| {
                e.as_ref()
                    .trim()
                    .trim_start_matches('.')
                    .to_ascii_lowercase()
            })
            .filter(|e| !e.is_empty())
            .collect();
        if set.is_empty() {
            Self::Any
        } else {
            Self::AllowList(set)
        }
    }

    /// Whether the extension of `path` passes the filter.
    ///
    /// The extension is the lowercased text after the final `.` of the
    /// storage name; a name without a `.` never passes an allow-list.
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Any => true,
            Self::AllowList(set) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| set.contains(&e.to_ascii_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Outcome of evaluating one message against the configured allow-lists.
#[derive(Debug, Clone)]
pub struct AdmissionDecision {
    /// The attachment sequence is non-empty.
    pub has_attachments: bool,
    /// The sender address is an exact-match member of the allow-list.
    pub sender_ok: bool,
    /// At least one attachment extension passes the filter.
    pub extension_ok: bool,
    /// All attachments of the message when it is eligible, empty otherwise.
    pub qualifying: Vec<SavedAttachment>,
}

impl AdmissionDecision {
    /// Final verdict: all three checks passed.
    pub fn eligible(&self) -> bool {
        self.has_attachments && self.sender_ok && self.extension_ok
    }
}

/// Evaluate one message against the sender allow-list and extension filter.
pub fn evaluate(
    mail: &ParsedMail,
    allowed_senders: &BTreeSet<String>,
    extensions: &ExtensionFilter,
) -> AdmissionDecision {
    let has_attachments = mail.has_attachments();
    let sender_ok = allowed_senders.contains(&mail.from_address);
    let extension_ok = mail
        .attachments
        .iter()
        .any(|a| extensions.matches(&a.path));

    let mut decision = AdmissionDecision {
        has_attachments,
        sender_ok,
        extension_ok,
        qualifying: Vec::new(),
    };
    if decision.eligible() {
        decision.qualifying = mail.attachments.clone();
    }
    decision
}
