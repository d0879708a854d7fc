//! Unread-message batch processing and poll scheduling
//!
//! One pass lists unread messages and processes each independently:
//! fetch thread, extract routing headers, send the automated reply,
//! mark the original read. A failure on one message never stops the
//! others. The scheduler repeats passes forever with randomized
//! spacing between them.

mod mailbox;
mod pass;
mod scheduler;
mod timing;

pub use mailbox::{Mailbox, labels};
pub use pass::{ItemOutcome, ItemStatus, PassStats, run_pass};
pub use scheduler::{MAX_POLL_SECS, MIN_POLL_SECS, run_loop};
pub use timing::jitter_secs;
