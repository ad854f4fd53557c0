//! Pending user confirmations with a deadline
//!
//! A confirmation is requested with a timeout and resolved later by a separate call. If no
//! decision arrives before the deadline, or the responder is dropped, it resolves to
//! [`Decision::Declined`]. A timeout is a recovered outcome, not an error.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Declined,
}

/// Waiting side of a confirmation request.
#[derive(Debug)]
pub struct PendingConfirmation {
    receiver: Receiver<Decision>,
    deadline: Instant,
}

/// Answering side of a confirmation request; may be moved to another thread.
#[derive(Debug, Clone)]
pub struct ConfirmationResponder {
    sender: Sender<Decision>,
}

/// Issue a confirmation request that expires after `timeout`.
pub fn request(timeout: Duration) -> (PendingConfirmation, ConfirmationResponder) {
    let (sender, receiver) = mpsc::channel();
    (
        PendingConfirmation {
            receiver,
            deadline: Instant::now() + timeout,
        },
        ConfirmationResponder { sender },
    )
}

impl ConfirmationResponder {
    /// Deliver the decision. Answers after the waiter gave up are ignored.
    pub fn resolve(self, decision: Decision) {
        if self.sender.send(decision).is_err() {
            debug!("confirmation already settled, ignoring {:?}", decision);
        }
    }

    pub fn accept(self) {
        self.resolve(Decision::Accepted);
    }

    pub fn decline(self) {
        self.resolve(Decision::Declined);
    }
}

impl PendingConfirmation {
    /// Block until a decision arrives or the deadline passes.
    pub fn wait(self) -> Decision {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.receiver.recv_timeout(remaining) {
            Ok(decision) => decision,
            Err(RecvTimeoutError::Timeout) => {
                debug!("confirmation timed out, declining");
                Decision::Declined
            }
            Err(RecvTimeoutError::Disconnected) => Decision::Declined,
        }
    }

    /// Non-blocking check; `None` while still pending.
    pub fn try_decision(&self) -> Option<Decision> {
        match self.receiver.try_recv() {
            Ok(decision) => Some(decision),
            Err(mpsc::TryRecvError::Disconnected) => Some(Decision::Declined),
            Err(mpsc::TryRecvError::Empty) if Instant::now() >= self.deadline => {
                Some(Decision::Declined)
            }
            Err(mpsc::TryRecvError::Empty) => None,
        }
    }
}
