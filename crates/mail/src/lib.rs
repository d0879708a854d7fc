//! Mail crate - Business logic for the Nova auto-responder
//!
//! This crate provides platform-independent mail functionality including:
//! - Gmail API client and OAuth authentication
//! - Reply composition and raw-message encoding
//! - The unread-message batch processor and its poll scheduler
//! - Mailbox trait abstraction for testing without the network
//!
//! This crate has zero UI dependencies and performs no disk persistence:
//! credentials live for the lifetime of the process only.

pub mod config;
pub mod gmail;
pub mod responder;

pub use config::{GmailCredentials, ResponderSettings};
pub use gmail::{AuthError, GmailAuth, GmailClient, ReplyPayload, ThreadHeaderView};
pub use responder::{
    ItemOutcome, ItemStatus, Mailbox, PassStats, jitter_secs, run_loop, run_pass,
};
