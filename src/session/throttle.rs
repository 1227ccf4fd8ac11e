//! Frame admission control
//!
//! Frames arrive at whatever rate the camera delivers them. The throttler
//! admits at most one per interval, measured from the last admitted frame's
//! timestamp, and admits nothing once closed.

use std::time::{Duration, Instant};

/// Default minimum spacing between processed frames
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct FrameThrottler {
    interval: Duration,
    last_admitted: Option<Instant>,
    closed: bool,
}

impl FrameThrottler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
            closed: false,
        }
    }

    /// Decide whether a frame delivered at `timestamp` should be processed
    pub fn admit(&mut self, timestamp: Instant) -> bool {
        if self.closed {
            return false;
        }

        let due = match self.last_admitted {
            None => true,
            Some(last) => timestamp.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_admitted = Some(timestamp);
        }
        due
    }

    /// Stop admitting frames until the next reset
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Forget the last admitted frame and reopen
    pub fn reset(&mut self) {
        self.last_admitted = None;
        self.closed = false;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FrameThrottler {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_INTERVAL)
    }
}
