//! Scan Session Controller
//!
//! Owns the lifecycle of one scan attempt: starting the camera, admitting
//! frames through the throttler, running recognition and analysis on the
//! admitted ones, and delivering exactly one terminal result.
//!
//! `handle_frame` is meant to be called from the frame source's processing
//! thread; `start`, `cancel` and the side-channel controls from a single
//! control thread.

pub mod emitter;
pub mod throttle;

use chrono::{Local, NaiveDate};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::luhn::{format_card_number, mask_card_number};
use crate::analysis::stability::DEFAULT_STABILITY_THRESHOLD;
use crate::analysis::{
    analyze_frame, CardBrand, DetectionState, ExpiryPolicy, ScanFeedback, ScanResult,
};
use crate::capture::frame::Frame;
use crate::capture::{
    CameraDevice, CameraPermission, DeviceError, Haptics, NullHaptics, VirtualCamera,
};
use crate::vision::TextRecognizer;

pub use emitter::{PendingScan, ResultEmitter};
pub use throttle::{FrameThrottler, DEFAULT_THROTTLE_INTERVAL};

/// Feedback messages buffered for a slow presentation layer
const FEEDBACK_CAPACITY: usize = 64;

/// Source of today's date for expiry checks
pub type Calendar = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Scanner tuning
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Minimum spacing between processed frames
    pub throttle_interval: Duration,
    /// Consecutive matching frames required to accept a number
    pub stability_threshold: u32,
    /// Cancel the session when no card is accepted within this time
    pub session_timeout: Option<Duration>,
    /// How expiry dates are checked against today
    pub expiry_policy: ExpiryPolicy,
    /// Include a masked card number in progress feedback
    pub masked_preview: bool,
    /// Fire haptic feedback on acceptance
    pub haptics: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            throttle_interval: DEFAULT_THROTTLE_INTERVAL,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            session_timeout: None,
            expiry_policy: ExpiryPolicy::YearOnly,
            masked_preview: true,
            haptics: true,
        }
    }
}

/// Lifecycle of the scanner's current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Finalizing,
    Completed,
    Cancelled,
}

/// Failures visible to the caller
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("camera access denied; enable it in the system settings")]
    PermissionDenied,
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(#[source] DeviceError),
    #[error("torch control failed: {0}")]
    TorchUnavailable(#[source] DeviceError),
}

/// What happened to a delivered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// No session is scanning
    Ignored,
    /// Arrived too soon after the last processed frame
    Throttled,
    /// A previous frame is still being recognized
    Busy,
    /// Recognized and analyzed; no result yet
    Processed,
    /// This frame completed the session
    Accepted,
    /// The session ended while this frame was being recognized
    Discarded,
    /// The session deadline passed; the session was cancelled
    TimedOut,
}

/// Frame counters for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub frames_received: u64,
    pub frames_admitted: u64,
    pub frames_throttled: u64,
    pub frames_busy: u64,
    pub recognition_failures: u64,
    pub rejected_candidates: u64,
}

/// Mutable state belonging to one started session
struct ActiveSession {
    id: Uuid,
    started_at: Instant,
    detection: DetectionState,
    emitter: ResultEmitter,
}

struct SessionInner {
    state: SessionState,
    throttle: FrameThrottler,
    /// Set while a recognition call runs outside the lock
    in_flight: bool,
    session: Option<ActiveSession>,
    stats: ScanStats,
}

/// Card scanner: session controller over injected capabilities
pub struct CardScanner {
    config: ScannerConfig,
    recognizer: Box<dyn TextRecognizer>,
    camera: Mutex<Box<dyn CameraDevice>>,
    haptics: Box<dyn Haptics>,
    calendar: Calendar,
    inner: Mutex<SessionInner>,
    feedback_tx: Sender<ScanFeedback>,
    feedback_rx: Receiver<ScanFeedback>,
}

impl CardScanner {
    /// Create a scanner with a virtual camera and no haptics
    pub fn new(config: ScannerConfig, recognizer: impl TextRecognizer + 'static) -> Self {
        let (feedback_tx, feedback_rx) = bounded(FEEDBACK_CAPACITY);
        let throttle = FrameThrottler::new(config.throttle_interval);

        Self {
            config,
            recognizer: Box::new(recognizer),
            camera: Mutex::new(Box::new(VirtualCamera::new())),
            haptics: Box::new(NullHaptics),
            calendar: Box::new(|| Local::now().date_naive()),
            inner: Mutex::new(SessionInner {
                state: SessionState::Idle,
                throttle,
                in_flight: false,
                session: None,
                stats: ScanStats::default(),
            }),
            feedback_tx,
            feedback_rx,
        }
    }

    /// Use a specific camera device
    pub fn with_camera(mut self, camera: impl CameraDevice + 'static) -> Self {
        self.camera = Mutex::new(Box::new(camera));
        self
    }

    /// Use a specific haptics implementation
    pub fn with_haptics(mut self, haptics: impl Haptics + 'static) -> Self {
        self.haptics = Box::new(haptics);
        self
    }

    /// Use a specific source of today's date
    pub fn with_calendar(
        mut self,
        calendar: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        self.calendar = Box::new(calendar);
        self
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Counters for the current or most recent session
    pub fn stats(&self) -> ScanStats {
        self.inner.lock().stats.clone()
    }

    /// Receiver for progress feedback
    pub fn feedback(&self) -> Receiver<ScanFeedback> {
        self.feedback_rx.clone()
    }

    /// Start a new session.
    ///
    /// Returns the handle the terminal result will arrive on, or `None` if a
    /// session is already scanning (the call is then ignored).
    pub fn start(&self) -> Result<Option<PendingScan>, ScanError> {
        let mut inner = self.inner.lock();
        if matches!(inner.state, SessionState::Scanning | SessionState::Finalizing) {
            warn!("start() called while a scan is running; ignoring");
            return Ok(None);
        }

        {
            let mut camera = self.camera.lock();
            let permission = match camera.permission() {
                CameraPermission::NotDetermined => camera.request_permission(),
                other => other,
            };
            if permission != CameraPermission::Granted {
                warn!("Camera permission denied");
                return Err(ScanError::PermissionDenied);
            }
            camera.open().map_err(ScanError::DeviceUnavailable)?;
        }

        let (emitter, pending) = ResultEmitter::channel();
        let id = Uuid::new_v4();

        inner.state = SessionState::Scanning;
        inner.throttle.reset();
        inner.stats = ScanStats::default();
        inner.session = Some(ActiveSession {
            id,
            started_at: Instant::now(),
            detection: DetectionState::default(),
            emitter,
        });
        drop(inner);

        // Messages nobody read belong to the previous session
        let stale = self.feedback_rx.try_iter().count();
        if stale > 0 {
            debug!("Dropped {} unread feedback messages from the previous session", stale);
        }

        info!(
            session = %id,
            recognizer = self.recognizer.name(),
            "Scan session started (interval {:?}, threshold {})",
            self.config.throttle_interval,
            self.config.stability_threshold
        );
        self.send_feedback(ScanFeedback::Started { session_id: id });

        Ok(Some(pending))
    }

    /// Cancel the current session.
    ///
    /// Safe to call in any state. Emits `Cancelled` unless the session has
    /// already produced its result.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        let ended = Self::cancel_locked(&mut inner);
        drop(inner);

        if ended {
            self.camera.lock().close();
            self.send_feedback(ScanFeedback::Finished);
        }
    }

    /// Alias for [`CardScanner::cancel`]
    pub fn stop(&self) {
        self.cancel();
    }

    /// Feed one frame from the frame source.
    pub fn handle_frame(&self, frame: Frame) -> FrameDisposition {
        let session_id = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            if inner.state != SessionState::Scanning {
                return FrameDisposition::Ignored;
            }
            inner.stats.frames_received += 1;

            let expired = match (self.config.session_timeout, &inner.session) {
                (Some(timeout), Some(session)) => {
                    frame.timestamp.saturating_duration_since(session.started_at) >= timeout
                }
                _ => false,
            };
            if expired {
                info!("Scan timed out after {:?}", self.config.session_timeout.unwrap_or_default());
                Self::cancel_locked(inner);
                drop(guard);
                self.camera.lock().close();
                self.send_feedback(ScanFeedback::Finished);
                return FrameDisposition::TimedOut;
            }

            if inner.in_flight {
                inner.stats.frames_busy += 1;
                return FrameDisposition::Busy;
            }
            if !inner.throttle.admit(frame.timestamp) {
                inner.stats.frames_throttled += 1;
                return FrameDisposition::Throttled;
            }

            let Some(session) = &inner.session else {
                return FrameDisposition::Ignored;
            };
            inner.in_flight = true;
            inner.stats.frames_admitted += 1;
            session.id
        };

        let recognized = self.recognizer.recognize(&frame);
        let sequence = frame.sequence;
        drop(frame);

        let (lines, failed) = match recognized {
            Ok(lines) => (lines, false),
            Err(e) => {
                warn!(session = %session_id, "Recognition failed on frame {}: {}", sequence, e);
                (Vec::new(), true)
            }
        };
        let analysis = analyze_frame(&lines, (self.calendar)(), self.config.expiry_policy);

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.in_flight = false;

        let Some(session) = inner.session.as_mut().filter(|s| s.id == session_id) else {
            debug!("Session ended while frame {} was being recognized", sequence);
            return FrameDisposition::Discarded;
        };
        if inner.state != SessionState::Scanning {
            return FrameDisposition::Discarded;
        }

        if failed {
            inner.stats.recognition_failures += 1;
        }
        if analysis.rejected_number {
            debug!(
                session = %session_id,
                "Discarded number candidate failing Luhn on frame {}",
                sequence
            );
            inner.stats.rejected_candidates += 1;
        }

        let frame_had_number = analysis.fields.number.is_some();
        session.detection = session.detection.step(analysis.fields);
        let detection = &session.detection;

        if detection.is_stable(self.config.stability_threshold) {
            inner.state = SessionState::Finalizing;
            inner.throttle.close();

            let result = Self::accepted_result(detection);
            info!(
                session = %session_id,
                "Card accepted after {} matching frames",
                detection.consecutive_count
            );
            session.emitter.emit(result);

            inner.state = SessionState::Completed;
            inner.session = None;
            drop(guard);

            self.camera.lock().close();
            if self.config.haptics {
                self.haptics.success();
            }
            self.send_feedback(ScanFeedback::Finished);
            return FrameDisposition::Accepted;
        }

        let feedback = match &detection.last_candidate {
            Some(candidate) if frame_had_number => ScanFeedback::Candidate {
                masked: self.config.masked_preview.then(|| mask_card_number(candidate.digits())),
                brand: CardBrand::detect(candidate.digits()),
                seen: detection.consecutive_count,
                required: self.config.stability_threshold,
            },
            _ => ScanFeedback::Searching,
        };
        drop(guard);

        self.send_feedback(feedback);
        FrameDisposition::Processed
    }

    /// Switch the torch. Does not affect detection.
    pub fn set_torch(&self, on: bool) -> Result<(), ScanError> {
        self.camera.lock().set_torch(on).map_err(ScanError::TorchUnavailable)
    }

    /// Whether the camera has a torch
    pub fn has_torch(&self) -> bool {
        self.camera.lock().has_torch()
    }

    /// Send the user to the system settings to grant camera access
    pub fn open_camera_settings(&self) {
        self.camera.lock().open_settings();
    }

    /// End the active session as cancelled. Returns true if a session ended.
    fn cancel_locked(inner: &mut SessionInner) -> bool {
        match inner.state {
            SessionState::Completed | SessionState::Cancelled => false,
            SessionState::Idle => {
                inner.state = SessionState::Cancelled;
                false
            }
            SessionState::Scanning | SessionState::Finalizing => {
                inner.state = SessionState::Cancelled;
                inner.throttle.close();
                if let Some(mut session) = inner.session.take() {
                    info!(session = %session.id, "Scan session cancelled");
                    session.emitter.emit(ScanResult::Cancelled);
                }
                true
            }
        }
    }

    fn accepted_result(detection: &DetectionState) -> ScanResult {
        let digits = detection
            .last_candidate
            .as_ref()
            .map(|c| c.digits())
            .unwrap_or_default();

        ScanResult::Accepted {
            number: format_card_number(digits),
            brand: CardBrand::detect(digits),
            expiry: detection.carried_expiry,
            name: detection.carried_name.clone(),
        }
    }

    fn send_feedback(&self, feedback: ScanFeedback) {
        match self.feedback_tx.try_send(feedback) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                debug!("Feedback queue full, dropping {:?}", dropped);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

impl Drop for CardScanner {
    fn drop(&mut self) {
        self.cancel();
    }
}
