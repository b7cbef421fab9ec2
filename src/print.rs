//! Print dispatch: submit extracted attachments to the printing subsystem.
//!
//! Submission acknowledgement (a job id) is the full extent of success
//! tracking; nothing verifies that a job actually finishes printing.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::error::{MailprintError, Result};
use crate::model::attachment::SavedAttachment;

/// Placeholder job-id suffix logged for dry-run submissions.
const DRY_RUN_JOB: &str = "123456";

/// Narrow submission contract of the printing subsystem.
pub trait PrintQueue {
    /// Submit one file for printing on `printer`, returning the job id.
    fn submit(&self, file: &Path, printer: &str) -> Result<String>;
}

/// Submits jobs through the CUPS `lp` command-line client.
pub struct LpQueue;

impl PrintQueue for LpQueue {
    fn submit(&self, file: &Path, printer: &str) -> Result<String> {
        let output = Command::new("lp")
            .arg("-d")
            .arg(printer)
            .arg(file)
            .output()
            .map_err(|e| MailprintError::Print(format!("cannot run lp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MailprintError::Print(format!(
                "lp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_request_id(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Pull the job id out of lp's `request id is PRINTER-42 (1 file(s))` line.
fn parse_request_id(stdout: &str) -> String {
    stdout
        .split_whitespace()
        .skip_while(|w| *w != "is")
        .nth(1)
        .unwrap_or_else(|| stdout.trim())
        .to_string()
}

/// Submit every attachment in accumulated order.
///
/// A per-item failure is logged and does not stop the remaining submissions.
/// With `dry_run` the subsystem is never contacted; a placeholder job id is
/// logged instead.
pub fn dispatch<P: PrintQueue>(
    attachments: &[SavedAttachment],
    printer: &str,
    queue: &P,
    dry_run: bool,
) {
    if attachments.is_empty() {
        info!("printing: nothing to do");
        return;
    }

    for attachment in attachments {
        if dry_run {
            info!(
                file = %attachment.path.display(),
                job = %format!("{printer}-{DRY_RUN_JOB}"),
                "dry-run: print submission skipped"
            );
            continue;
        }

        match queue.submit(&attachment.path, printer) {
            Ok(job) => info!(
                file = %attachment.path.display(),
                job = %job,
                "print job submitted"
            ),
            Err(e) => warn!(
                file = %attachment.path.display(),
                error = %e,
                "print submission failed"
            ),
        }
    }
}
