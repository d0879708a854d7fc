//! Mailbox trait definition
//!
//! Abstracts the four remote calls one processing pass needs, so the
//! batch processor can be exercised against an in-memory fake instead
//! of the live Gmail API.

use anyhow::Result;

use crate::gmail::api::{GmailThread, MessageRef};

/// Label IDs used by Gmail for common states
pub mod labels {
    pub const UNREAD: &str = "UNREAD";
}

/// Trait for the remote mailbox operations the responder performs
pub trait Mailbox: Send + Sync {
    /// List references to currently-unread messages, in provider order
    fn list_unread(&self) -> Result<Vec<MessageRef>>;

    /// Fetch a full thread by ID
    fn get_thread(&self, thread_id: &str) -> Result<GmailThread>;

    /// Send a base64url-encoded raw message
    fn send_raw(&self, raw: &str) -> Result<()>;

    /// Add and remove labels on a single message
    fn modify_message(&self, message_id: &str, add: &[&str], remove: &[&str]) -> Result<()>;
}
