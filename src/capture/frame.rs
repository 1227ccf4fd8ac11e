//! Frame data structures for camera preview content

use std::time::Instant;

/// A single camera frame delivered by the frame source.
///
/// Frames are consumed by value by the session and dropped as soon as the
/// recognition engine has returned, so pixel data never outlives one
/// processing step.
#[derive(Debug)]
pub struct Frame {
    /// Raw pixel data in whatever layout the recognition engine expects
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Monotonic position in the frame source's stream
    pub sequence: u64,
    /// Timestamp when the frame was delivered
    pub timestamp: Instant,
}

impl Frame {
    /// Create a new frame stamped with the current time
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self::at(data, width, height, sequence, Instant::now())
    }

    /// Create a new frame with an explicit delivery time
    pub fn at(data: Vec<u8>, width: u32, height: u32, sequence: u64, timestamp: Instant) -> Self {
        Self {
            data,
            width,
            height,
            sequence,
            timestamp,
        }
    }

    /// A frame without pixels, for recognizers that do not look at image data
    pub fn empty(sequence: u64, timestamp: Instant) -> Self {
        Self::at(Vec::new(), 0, 0, sequence, timestamp)
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frame_dimensions() {
        let frame = Frame::new(vec![0; 4 * 8 * 2], 8, 2, 7);
        assert_eq!(frame.dimensions(), (8, 2));
        assert_eq!(frame.sequence, 7);
    }

    #[test]
    fn test_empty_frame_keeps_timestamp() {
        let at = Instant::now() + Duration::from_millis(250);
        let frame = Frame::empty(3, at);
        assert!(frame.data.is_empty());
        assert_eq!(frame.timestamp, at);
    }
}
