//! The poll scheduler
//!
//! An unbounded sequential loop: run one pass, sleep a randomized
//! interval, repeat. Passes never overlap; the sleep is fully awaited
//! before the next pass starts. Pass errors are caught at this boundary
//! and logged, so the loop itself only stops on an explicit shutdown
//! signal (or when the sender side of the channel is dropped).

use log::{error, info};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use super::mailbox::Mailbox;
use super::pass::run_pass;
use super::timing::jitter_secs;

/// Inclusive bounds for the randomized sleep between passes
pub const MIN_POLL_SECS: u64 = 45;
pub const MAX_POLL_SECS: u64 = 120;

/// Run processing passes until a shutdown signal arrives.
///
/// The shutdown receiver interrupts the inter-pass sleep, so the loop
/// exits promptly instead of waiting out the jitter window.
pub fn run_loop(mailbox: &dyn Mailbox, reply_body: &str, shutdown: &Receiver<()>) {
    loop {
        match run_pass(mailbox, reply_body) {
            Ok(stats) if stats.listed > 0 => {
                info!(
                    "Pass complete: {} replied, {} skipped, {} failed of {} unread ({} ms)",
                    stats.replied, stats.skipped, stats.failed, stats.listed, stats.duration_ms
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error processing emails: {e}");
            }
        }

        let interval = jitter_secs(MIN_POLL_SECS, MAX_POLL_SECS);
        info!("Next task will run in {interval} seconds");

        match shutdown.recv_timeout(Duration::from_secs(interval)) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("Shutdown requested, stopping poll loop");
                return;
            }
        }
    }
}
