//! Attachment extraction: turn one raw MIME message into a normalized
//! [`ParsedMail`] with decoded attachment files in the scratch directory.

use chrono::{DateTime, Utc};
use humansize::{format_size, BINARY};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

use crate::error::{MailprintError, Result};
use crate::model::attachment::SavedAttachment;
use crate::model::message::ParsedMail;
use crate::scratch::ScratchDir;

/// Closed classification of the MIME leaf parts this pipeline handles.
enum PartKind<'a> {
    /// Message text (plain or HTML); the last one parsed wins.
    Inline,
    /// A file attachment with its declared name (possibly empty).
    Attachment {
        declared_name: String,
        contents: &'a [u8],
    },
    /// Any other leaf shape; logged and skipped.
    Unknown,
}

/// Parse one raw message and extract its attachments into `scratch`.
///
/// Fails only when the bytes cannot be parsed as a MIME message at all.
/// Every per-part problem (undecodable text, failed attachment write) is
/// logged and skipped, and extraction continues with the remaining parts.
pub fn extract(raw: &[u8], scratch: &ScratchDir) -> Result<ParsedMail> {
    if raw.is_empty() {
        return Err(MailprintError::Malformed("empty message body".into()));
    }

    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailprintError::Malformed("not a parseable MIME message".into()))?;

    let mut mail = ParsedMail {
        received_at: message_date(&parsed),
        from_address: first_from_address(&parsed),
        subject: parsed.subject().unwrap_or_default().to_string(),
        body_text: String::new(),
        attachments: Vec::new(),
    };

    for part in &parsed.parts {
        // Multipart and nested-message containers are structure, not content.
        if matches!(part.body, PartType::Multipart(_) | PartType::Message(_)) {
            continue;
        }

        match classify(part) {
            PartKind::Inline => {
                if let Some(text) = part.text_contents() {
                    mail.body_text = text.trim().to_string();
                }
            }
            PartKind::Attachment {
                declared_name,
                contents,
            } => match scratch.store(&declared_name, contents) {
                Ok(path) => {
                    debug!(
                        name = %declared_name,
                        path = %path.display(),
                        size = %format_size(contents.len() as u64, BINARY),
                        "saved attachment"
                    );
                    mail.attachments.push(SavedAttachment {
                        path,
                        declared_name,
                    });
                }
                Err(e) => {
                    warn!(name = %declared_name, error = %e, "dropping attachment that failed to write");
                }
            },
            PartKind::Unknown => debug!("unhandled message part, skipping"),
        }
    }

    Ok(mail)
}

/// Classify a leaf part.
///
/// Text without a declared filename is inline content; anything carrying a
/// filename, and any binary body, is an attachment (a nameless binary still
/// gets saved, it just can never match an extension allow-list).
fn classify<'a>(part: &'a MessagePart<'a>) -> PartKind<'a> {
    let declared = part.attachment_name();
    match &part.body {
        PartType::Text(_) | PartType::Html(_) if declared.is_none() => PartKind::Inline,
        PartType::Text(_) | PartType::Html(_) | PartType::Binary(_) | PartType::InlineBinary(_) => {
            PartKind::Attachment {
                declared_name: declared.unwrap_or_default().to_string(),
                contents: part.contents(),
            }
        }
        _ => PartKind::Unknown,
    }
}

/// `Date:` header, falling back to the current wall-clock time.
fn message_date(msg: &Message<'_>) -> DateTime<Utc> {
    msg.date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or_else(Utc::now)
}

/// First address of the `From:` header; empty string when absent.
fn first_from_address(msg: &Message<'_>) -> String {
    msg.from()
        .and_then(|a| a.first())
        .and_then(|a| a.address())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> ScratchDir {
        ScratchDir::create().unwrap()
    }

    fn plain_message(from: &str, subject: &str, body: &str) -> Vec<u8> {
        format!(
            "From: {from}\r\n\
             To: printer@example.com\r\n\
             Subject: {subject}\r\n\
             Date: Mon, 05 Jan 2026 10:30:00 +0000\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             {body}\r\n"
        )
        .into_bytes()
    }

    fn message_with_attachments(from: &str, files: &[(&str, &str)]) -> Vec<u8> {
        let mut m = format!(
            "From: {from}\r\n\
             To: printer@example.com\r\n\
             Subject: attachments\r\n\
             Date: Mon, 05 Jan 2026 10:30:00 +0000\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/mixed; boundary=\"sep\"\r\n\
             \r\n\
             --sep\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             Please print the attached.\r\n"
        );
        for (name, contents) in files {
            m.push_str(&format!(
                "--sep\r\n\
                 Content-Type: application/octet-stream\r\n\
                 Content-Disposition: attachment; filename=\"{name}\"\r\n\
                 \r\n\
                 {contents}\r\n"
            ));
        }
        m.push_str("--sep--\r\n");
        m.into_bytes()
    }

    #[test]
    fn test_header_fields_extracted() {
        let dir = scratch();
        let raw = plain_message("Alice <alice@example.com>", "Hello", "Body text");
        let mail = extract(&raw, &dir).unwrap();

        assert_eq!(mail.from_address, "alice@example.com");
        assert_eq!(mail.subject, "Hello");
        assert_eq!(mail.body_text, "Body text");
        assert!(mail.attachments.is_empty());
        assert_eq!(mail.received_at.to_rfc3339(), "2026-01-05T10:30:00+00:00");
    }

    #[test]
    fn test_missing_date_falls_back_to_now() {
        let dir = scratch();
        let raw = b"From: a@b.com\r\nSubject: x\r\nContent-Type: text/plain\r\n\r\nhi\r\n";
        let before = Utc::now();
        let mail = extract(raw, &dir).unwrap();
        assert!(mail.received_at >= before);
    }

    #[test]
    fn test_missing_from_yields_empty_sender() {
        let dir = scratch();
        let raw = b"Subject: anonymous\r\nContent-Type: text/plain\r\n\r\nhi\r\n";
        let mail = extract(raw, &dir).unwrap();
        assert_eq!(mail.from_address, "");
        assert_eq!(mail.subject, "anonymous");
    }

    #[test]
    fn test_attachments_saved_in_document_order() {
        let dir = scratch();
        let raw = message_with_attachments(
            "alice@example.com",
            &[("invoice.pdf", "fake pdf bytes"), ("notes.txt", "some notes")],
        );
        let mail = extract(&raw, &dir).unwrap();

        assert_eq!(mail.body_text, "Please print the attached.");
        assert_eq!(mail.attachments.len(), 2);
        assert_eq!(mail.attachments[0].declared_name, "invoice.pdf");
        assert_eq!(mail.attachments[1].declared_name, "notes.txt");
        assert_eq!(
            std::fs::read(&mail.attachments[0].path).unwrap(),
            b"fake pdf bytes"
        );
        assert_eq!(mail.attachments[0].extension(), Some("pdf".to_string()));
    }

    #[test]
    fn test_last_inline_part_wins() {
        let dir = scratch();
        let raw = b"From: a@b.com\r\n\
            Subject: alt\r\n\
            MIME-Version: 1.0\r\n\
            Content-Type: multipart/alternative; boundary=\"sep\"\r\n\
            \r\n\
            --sep\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            first version\r\n\
            --sep\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            <p>second version</p>\r\n\
            --sep--\r\n";
        let mail = extract(raw, &dir).unwrap();
        assert!(
            mail.body_text.contains("second version"),
            "got '{}'",
            mail.body_text
        );
    }

    #[test]
    fn test_failed_writes_drop_attachments_but_not_message() {
        let dir = scratch();
        // Sabotage the scratch directory so every store fails.
        std::fs::remove_dir_all(dir.path()).unwrap();

        let raw = message_with_attachments(
            "alice@example.com",
            &[("invoice.pdf", "x"), ("notes.txt", "y")],
        );
        let mail = extract(&raw, &dir).unwrap();
        assert!(mail.attachments.is_empty());
        assert_eq!(mail.from_address, "alice@example.com");
    }

    #[test]
    fn test_empty_body_is_an_error() {
        let dir = scratch();
        assert!(matches!(
            extract(b"", &dir),
            Err(MailprintError::Malformed(_))
        ));
    }

    #[test]
    fn test_adversarial_filename_is_contained() {
        let dir = scratch();
        let raw = message_with_attachments("a@b.com", &[("../../evil.sh", "rm -rf")]);
        let mail = extract(&raw, &dir).unwrap();
        assert_eq!(mail.attachments.len(), 1);
        assert!(mail.attachments[0].path.starts_with(dir.path()));
        assert_eq!(mail.attachments[0].declared_name, "../../evil.sh");
    }
}
