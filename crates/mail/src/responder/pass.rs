//! One processing pass over the unread messages
//!
//! Failure semantics: a failure listing the unread messages aborts the
//! whole pass; any failure on a single message is recorded against that
//! message only and the batch continues.

use anyhow::{Context, Result};
use log::{error, info, warn};

use super::mailbox::{Mailbox, labels};
use crate::gmail::{ReplyPayload, encode_raw, reply_fields};

/// Statistics from one processing pass
#[derive(Debug, Default)]
pub struct PassStats {
    /// Number of unread messages listed
    pub listed: usize,
    /// Number of messages replied to and marked read
    pub replied: usize,
    /// Number of messages skipped for missing headers
    pub skipped: usize,
    /// Number of messages that failed at fetch, send, or mark-read
    pub failed: usize,
    /// Duration of the pass
    pub duration_ms: u64,
    /// Per-message outcome, in listing order
    pub outcomes: Vec<ItemOutcome>,
}

/// Terminal state of one message within a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Reply sent and the original marked read
    Replied,
    /// First message of the thread lacked a From or Subject header;
    /// nothing was sent and the message stays unread
    MissingHeaders,
    /// Fetch, send, or mark-read failed; the message stays unread
    /// (or, for a mark-read failure, stays unread with the reply sent)
    Failed(String),
}

/// Outcome of processing one unread message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub message_id: String,
    pub status: ItemStatus,
}

/// Run one pass: list unread messages and process each independently.
///
/// Returns `Err` only when the listing itself fails; per-message
/// failures are aggregated into the returned stats.
pub fn run_pass(mailbox: &dyn Mailbox, reply_body: &str) -> Result<PassStats> {
    let start = std::time::Instant::now();
    let mut stats = PassStats::default();

    let refs = mailbox
        .list_unread()
        .context("Failed to list unread messages")?;
    stats.listed = refs.len();

    if refs.is_empty() {
        info!("No unread emails found.");
        stats.duration_ms = start.elapsed().as_millis() as u64;
        return Ok(stats);
    }

    for msg_ref in &refs {
        let status = process_message(mailbox, &msg_ref.id, &msg_ref.thread_id, reply_body);

        match &status {
            ItemStatus::Replied => {
                stats.replied += 1;
                info!("Replied to email and marked as read: {}", msg_ref.id);
            }
            ItemStatus::MissingHeaders => {
                stats.skipped += 1;
                warn!("Missing headers in the email, skipping: {}", msg_ref.id);
            }
            ItemStatus::Failed(reason) => {
                stats.failed += 1;
                error!("Error processing message ID {}: {}", msg_ref.id, reason);
            }
        }

        stats.outcomes.push(ItemOutcome {
            message_id: msg_ref.id.clone(),
            status,
        });
    }

    stats.duration_ms = start.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Process a single unread message end to end.
///
/// The original is marked read only after its reply was sent.
fn process_message(
    mailbox: &dyn Mailbox,
    message_id: &str,
    thread_id: &str,
    reply_body: &str,
) -> ItemStatus {
    let thread = match mailbox.get_thread(thread_id) {
        Ok(thread) => thread,
        Err(e) => return ItemStatus::Failed(format!("fetching thread: {e}")),
    };

    let Some(fields) = reply_fields(&thread) else {
        return ItemStatus::MissingHeaders;
    };

    let payload = ReplyPayload {
        to: fields.from,
        subject: format!("Re: {}", fields.subject),
        body: reply_body.to_string(),
    };

    if let Err(e) = mailbox.send_raw(&encode_raw(&payload)) {
        return ItemStatus::Failed(format!("sending reply: {e}"));
    }

    if let Err(e) = mailbox.modify_message(message_id, &[], &[labels::UNREAD]) {
        return ItemStatus::Failed(format!("reply sent but mark-read failed: {e}"));
    }

    ItemStatus::Replied
}
