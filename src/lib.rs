//! `mailprint` — an unattended batch job that prints email attachments.
//!
//! Each invocation connects to an IMAP mailbox over TLS, fetches every
//! pending message, extracts attachments from messages that pass the sender
//! and extension allow-lists, submits them to a CUPS printer, and deletes the
//! processed messages. One best-effort pass per run, no retained state; an
//! external scheduler provides the cadence.

pub mod config;
pub mod error;
pub mod extract;
pub mod mailbox;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod print;
pub mod scratch;
