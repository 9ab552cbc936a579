//! Named background threads with a bounded join
//!
//! `std::thread::JoinHandle::join` waits forever. Stopping a source or the
//! pipeline must not hang on a thread stuck in blocking I/O, so a `Worker`
//! signals completion over a channel and `join_timeout` waits at most the
//! given duration before detaching the thread.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A spawned thread that reports when its body returns
#[derive(Debug)]
pub struct Worker {
    name: String,
    handle: JoinHandle<()>,
    done: Receiver<()>,
}

/// How a bounded join ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Thread finished and was joined
    Joined,
    /// Thread panicked
    Panicked,
    /// Thread was still running at the deadline and has been detached
    TimedOut,
}

impl Worker {
    /// Spawn a named thread running `body`
    pub fn spawn<F>(name: impl Into<String>, body: F) -> io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = name.into();
        let (tx, done) = mpsc::channel();
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            body();
            // Receiver may be gone if the owner already gave up waiting.
            let _ = tx.send(());
        })?;

        Ok(Self { name, handle, done })
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the thread body has returned
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait up to `timeout` for the thread to finish
    pub fn join_timeout(self, timeout: Duration) -> JoinOutcome {
        match self.done.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match self.handle.join() {
                Ok(()) => JoinOutcome::Joined,
                Err(_) => {
                    log::error!("worker {} panicked", self.name);
                    JoinOutcome::Panicked
                }
            },
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "worker {} did not stop within {} ms, detaching",
                    self.name,
                    timeout.as_millis()
                );
                JoinOutcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;

    #[test]
    fn joins_finished_worker() {
        let worker = Worker::spawn("quick", || {}).unwrap();
        assert_eq!(worker.name(), "quick");
        assert_eq!(worker.join_timeout(Duration::from_secs(1)), JoinOutcome::Joined);
    }

    #[test]
    fn cooperative_stop() {
        let token = CancellationToken::new();
        let remote = token.clone();
        let worker = Worker::spawn("loop", move || {
            while remote.sleep(Duration::from_millis(5)) {}
        })
        .unwrap();

        token.cancel();
        assert_eq!(worker.join_timeout(Duration::from_secs(2)), JoinOutcome::Joined);
    }

    #[test]
    fn times_out_on_stuck_worker() {
        let worker = Worker::spawn("stuck", || thread::sleep(Duration::from_millis(300))).unwrap();
        assert_eq!(worker.join_timeout(Duration::from_millis(10)), JoinOutcome::TimedOut);
    }

    #[test]
    fn reports_panic() {
        let worker = Worker::spawn("boom", || panic!("boom")).unwrap();
        assert_eq!(worker.join_timeout(Duration::from_secs(1)), JoinOutcome::Panicked);
    }
}
