//! Mailbox transport: the narrow session contract the pipeline needs, and
//! its TLS-backed IMAP implementation.
//!
//! Session setup (connect, authenticate, select) happens before the pipeline
//! runs and any failure there is fatal to the run; teardown (logout) is
//! guaranteed on every exit path by the drop guard.

use std::net::TcpStream;
use std::sync::mpsc::SyncSender;

use rustls_connector::RustlsConnector;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{MailprintError, Result};

/// Inclusive message sequence-number range, anchored at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqRange {
    pub first: u32,
    pub last: u32,
}

impl SeqRange {
    /// Range covering every message in a mailbox of `count` messages.
    pub fn full(count: u32) -> Self {
        Self { first: 1, last: count }
    }

    /// IMAP sequence-set syntax (`first:last`).
    pub fn to_imap(&self) -> String {
        format!("{}:{}", self.first, self.last)
    }
}

impl std::fmt::Display for SeqRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_imap())
    }
}

/// Operations the pipeline needs from an open, selected mailbox session.
pub trait MailSource {
    /// Number of messages reported when the mailbox was selected. New
    /// arrivals after selection are not re-checked mid-run.
    fn count(&self) -> u32;

    /// Fetch the full raw body of every message in `range`, delivering each
    /// into `tx` in transport delivery order.
    ///
    /// A transport-level failure is returned after delivery stops; it aborts
    /// the whole run.
    fn fetch(&mut self, range: SeqRange, tx: SyncSender<Vec<u8>>) -> Result<()>;

    /// Add the `\Deleted` flag to every message in `range`.
    fn mark_deleted(&mut self, range: SeqRange) -> Result<()>;

    /// Commit pending deletions.
    fn expunge(&mut self) -> Result<()>;
}

type TlsSession = imap::Session<rustls_connector::TlsStream<TcpStream>>;

/// A logged-in IMAP session with one mailbox selected.
pub struct ImapMailbox {
    session: TlsSession,
    count: u32,
}

impl ImapMailbox {
    /// Connect over TLS, authenticate, and select the configured mailbox.
    ///
    /// Every failure here is a setup error; the caller aborts the run.
    pub fn connect(config: &RunConfig) -> Result<Self> {
        let host = config
            .addr
            .rsplit_once(':')
            .map(|(h, _)| h)
            .unwrap_or(&config.addr);

        let stream = TcpStream::connect(&config.addr).map_err(|e| MailprintError::Connect {
            addr: config.addr.clone(),
            source: e,
        })?;

        let connector = RustlsConnector::default();
        let tls_stream = connector
            .connect(host, stream)
            .map_err(|e| MailprintError::Tls {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let client = imap::Client::new(tls_stream);
        let mut session = client
            .login(&config.user, &config.pass)
            .map_err(|e| MailprintError::Login {
                user: config.user.clone(),
                source: e.0,
            })?;

        let status = session
            .select(&config.mailbox)
            .map_err(|e| MailprintError::Select {
                mailbox: config.mailbox.clone(),
                source: e,
            })?;

        info!(
            mailbox = %config.mailbox,
            messages = status.exists,
            "mailbox selected"
        );

        Ok(Self {
            session,
            count: status.exists,
        })
    }
}

impl MailSource for ImapMailbox {
    fn count(&self) -> u32 {
        self.count
    }

    fn fetch(&mut self, range: SeqRange, tx: SyncSender<Vec<u8>>) -> Result<()> {
        let messages = self
            .session
            .fetch(range.to_imap(), "RFC822")
            .map_err(|e| MailprintError::Fetch(e.to_string()))?;

        for message in messages.iter() {
            let Some(body) = message.body() else {
                // No body in the FETCH response; skip this message rather
                // than abort the batch.
                warn!("server returned a message without a body, skipping");
                continue;
            };
            if tx.send(body.to_vec()).is_err() {
                // Receiver went away; stop delivering.
                break;
            }
        }
        Ok(())
    }

    fn mark_deleted(&mut self, range: SeqRange) -> Result<()> {
        self.session.store(range.to_imap(), "+FLAGS (\\Deleted)")?;
        Ok(())
    }

    fn expunge(&mut self) -> Result<()> {
        self.session.expunge()?;
        Ok(())
    }
}

impl Drop for ImapMailbox {
    fn drop(&mut self) {
        // Best-effort teardown on every exit path.
        if let Err(e) = self.session.logout() {
            debug!(error = %e, "IMAP logout failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_range_full() {
        let range = SeqRange::full(12);
        assert_eq!(range.first, 1);
        assert_eq!(range.last, 12);
        assert_eq!(range.to_imap(), "1:12");
    }
}
