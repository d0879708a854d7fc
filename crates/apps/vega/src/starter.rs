//! Scheduler start guard
//!
//! The callback server invokes its ready hook on every request once
//! the credential is installed, so the transition to a running
//! scheduler must be idempotent. The guard pairs an atomic flag with
//! the single shutdown receiver the poll loop consumes: the first call
//! wins the flag and takes the receiver, every later call is a no-op.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;

pub struct SchedulerStarter {
    started: AtomicBool,
    shutdown: Mutex<Option<Receiver<()>>>,
}

impl SchedulerStarter {
    pub fn new(shutdown: Receiver<()>) -> Self {
        Self {
            started: AtomicBool::new(false),
            shutdown: Mutex::new(Some(shutdown)),
        }
    }

    /// Start the scheduler if it has not been started yet.
    ///
    /// Hands the shutdown receiver to `spawn` exactly once; returns
    /// whether this call was the one that started it.
    pub fn start_once(&self, spawn: impl FnOnce(Receiver<()>)) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }

        let rx = self
            .shutdown
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match rx {
            Some(rx) => {
                spawn(rx);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_first_call_starts() {
        let (_tx, rx) = mpsc::channel();
        let starter = SchedulerStarter::new(rx);

        let mut spawned = 0;
        assert!(starter.start_once(|_| spawned += 1));
        assert_eq!(spawned, 1);
    }

    #[test]
    fn test_duplicate_calls_spawn_exactly_once() {
        let (_tx, rx) = mpsc::channel();
        let starter = SchedulerStarter::new(rx);

        let mut spawned = 0;
        assert!(starter.start_once(|_| spawned += 1));
        assert!(!starter.start_once(|_| spawned += 1));
        assert!(!starter.start_once(|_| spawned += 1));
        assert_eq!(spawned, 1);
    }

    #[test]
    fn test_spawn_receives_the_live_shutdown_receiver() {
        let (tx, rx) = mpsc::channel();
        let starter = SchedulerStarter::new(rx);

        let mut handed = None;
        starter.start_once(|rx| handed = Some(rx));

        tx.send(()).unwrap();
        assert_eq!(handed.unwrap().recv(), Ok(()));
    }
}
