//! One-shot delivery of a session's terminal result

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::debug;

use crate::analysis::ScanResult;

/// Sending half: delivers at most one result
#[derive(Debug)]
pub struct ResultEmitter {
    sender: Option<Sender<ScanResult>>,
}

impl ResultEmitter {
    /// Create an emitter and the handle its result will arrive on
    pub fn channel() -> (Self, PendingScan) {
        let (sender, receiver) = bounded(1);
        (Self { sender: Some(sender) }, PendingScan { receiver })
    }

    /// Deliver the result. Returns false if a result was already emitted.
    pub fn emit(&mut self, result: ScanResult) -> bool {
        let Some(sender) = self.sender.take() else {
            return false;
        };
        if sender.send(result).is_err() {
            debug!("Scan result dropped: caller no longer waiting");
        }
        true
    }

    /// Whether the result has already been emitted
    pub fn is_spent(&self) -> bool {
        self.sender.is_none()
    }
}

/// Receiving half held by the caller of `start()`
#[derive(Debug)]
pub struct PendingScan {
    receiver: Receiver<ScanResult>,
}

impl PendingScan {
    /// Block until the session ends.
    ///
    /// Resolves to `Cancelled` if the session is torn down without emitting.
    pub fn wait(self) -> ScanResult {
        self.receiver.recv().unwrap_or(ScanResult::Cancelled)
    }

    /// Block for at most `timeout`; `None` if the session is still running
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ScanResult> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(ScanResult::Cancelled),
        }
    }

    /// Non-blocking check for the result
    pub fn try_result(&self) -> Option<ScanResult> {
        self.receiver.try_recv().ok()
    }

    /// Underlying receiver, for use with `crossbeam_channel::select!`
    pub fn receiver(&self) -> &Receiver<ScanResult> {
        &self.receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_exactly_once() {
        let (mut emitter, pending) = ResultEmitter::channel();
        assert!(!emitter.is_spent());

        assert!(emitter.emit(ScanResult::Cancelled));
        assert!(emitter.is_spent());
        assert!(!emitter.emit(ScanResult::Cancelled));

        assert_eq!(pending.try_result(), Some(ScanResult::Cancelled));
        assert_eq!(pending.try_result(), None);
    }

    #[test]
    fn test_wait_timeout_while_running() {
        let (_emitter, pending) = ResultEmitter::channel();
        assert_eq!(pending.wait_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_dropped_emitter_resolves_cancelled() {
        let (emitter, pending) = ResultEmitter::channel();
        drop(emitter);
        assert_eq!(pending.wait(), ScanResult::Cancelled);
    }

    #[test]
    fn test_emit_after_caller_gone() {
        let (mut emitter, pending) = ResultEmitter::channel();
        drop(pending);
        assert!(emitter.emit(ScanResult::Cancelled));
    }
}
