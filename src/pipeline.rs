//! Batch orchestration: fetch, extract, admit, clean up, print.
//!
//! Side-effect ordering is fixed: every message is extracted and evaluated
//! before cleanup touches the mailbox, and cleanup runs before printing.
//! There is no rollback — a failure after the expunge has committed cannot
//! restore the source messages.

use std::sync::mpsc;
use std::thread;

use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{MailprintError, Result};
use crate::extract;
use crate::mailbox::{MailSource, SeqRange};
use crate::model::attachment::SavedAttachment;
use crate::policy;
use crate::print::{self, PrintQueue};
use crate::scratch::ScratchDir;

/// Run one full batch pass over the selected mailbox.
///
/// Per-message and per-attachment failures are logged and isolated; only a
/// transport-level fetch failure escalates to the caller.
pub fn run_batch<M, P>(
    mailbox: &mut M,
    queue: &P,
    config: &RunConfig,
    scratch: &ScratchDir,
) -> Result<()>
where
    M: MailSource + Send,
    P: PrintQueue,
{
    let count = mailbox.count();
    if count == 0 {
        info!("no messages, nothing to do");
        return Ok(());
    }

    // The range is fixed at selection time; arrivals mid-run wait for the
    // next scheduler invocation.
    let range = SeqRange::full(count);
    let raw_messages = fetch_buffered(mailbox, range)?;
    info!(fetched = raw_messages.len(), "fetched message batch");

    let mut mails = Vec::with_capacity(raw_messages.len());
    for (i, raw) in raw_messages.iter().enumerate() {
        match extract::extract(raw, scratch) {
            Ok(mail) => mails.push(mail),
            Err(e) => warn!(seq = i + 1, error = %e, "skipping message that failed to extract"),
        }
    }

    let mut print_queue: Vec<SavedAttachment> = Vec::new();
    for mail in &mails {
        let decision = policy::evaluate(mail, &config.allowed_senders, &config.extensions);
        info!(
            date = %mail.received_at,
            from = %mail.from_address,
            subject = %mail.subject,
            attachments = mail.attachments.len(),
            sender_ok = decision.sender_ok,
            has_attachments = decision.has_attachments,
            extension_ok = decision.extension_ok,
            eligible = decision.eligible(),
            "admission decision"
        );
        print_queue.extend(decision.qualifying);
    }

    // Cleanup covers the entire fetched range — ineligible and
    // failed-extraction messages are deleted exactly like eligible ones.
    cleanup(mailbox, range, config.dry_run);
    print::dispatch(&print_queue, &config.printer, queue, config.dry_run);

    info!("batch complete");
    Ok(())
}

/// Bridge the blocking fetch with a bounded buffer.
///
/// A background thread streams raw bodies into a channel sized to the
/// message count while this thread drains it to exhaustion. Delivery order
/// is the transport's delivery order; there is a single producer.
fn fetch_buffered<M: MailSource + Send>(mailbox: &mut M, range: SeqRange) -> Result<Vec<Vec<u8>>> {
    let (tx, rx) = mpsc::sync_channel(range.last as usize);

    thread::scope(|scope| {
        let producer = scope.spawn(move || mailbox.fetch(range, tx));
        let drained: Vec<Vec<u8>> = rx.iter().collect();
        producer
            .join()
            .map_err(|_| MailprintError::Fetch("fetch worker panicked".into()))??;
        Ok(drained)
    })
}

/// Flag the fetched range as deleted and commit, unless dry-run.
///
/// All-or-nothing on the range as presented to the transport. Failures here
/// are reported but never abort the run; printing still proceeds.
pub fn cleanup<M: MailSource>(mailbox: &mut M, range: SeqRange, dry_run: bool) {
    if dry_run {
        info!(range = %range, "dry-run: mailbox cleanup skipped");
        return;
    }

    debug!(range = %range, "deleting processed messages");
    match mailbox.mark_deleted(range) {
        Ok(()) => {
            if let Err(e) = mailbox.expunge() {
                warn!(error = %e, "expunge failed");
            }
        }
        Err(e) => warn!(error = %e, "could not flag messages as deleted; expunge skipped"),
    }
}
