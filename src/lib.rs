//! CardScan - real-time payment card recognition
//!
//! Reads a card number, expiry date and cardholder name from a stream of
//! camera frames using an external text recognition engine. Frames are
//! throttled, each admitted frame's text is parsed and Luhn-checked, and a
//! number is only accepted once it has been read on consecutive frames.
//! Card images are never stored.

pub mod analysis;
pub mod capture;
pub mod config;
pub mod session;
pub mod storage;
pub mod vision;

pub use analysis::{CardBrand, ScanFeedback, ScanResult};
pub use capture::frame::Frame;
pub use session::{
    CardScanner, FrameDisposition, PendingScan, ScanError, ScannerConfig, SessionState,
};
pub use vision::{RecognizedLine, TextRecognizer};
