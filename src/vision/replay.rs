//! Transcript-driven recognizer
//!
//! Plays back recorded recognition output frame by frame. A transcript is
//! plain text: one recognized line per text line, frames separated by a
//! line containing only `---`, `!fail` marking a frame on which the engine
//! failed, and `#` starting a comment.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use super::{RecognitionError, RecognizedLine, TextRecognizer};
use crate::capture::frame::Frame;

const FRAME_SEPARATOR: &str = "---";
const FAILURE_MARKER: &str = "!fail";

/// Recorded engine output for one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedFrame {
    /// The engine returned these lines
    Lines(Vec<String>),
    /// The engine failed on this frame
    Failure,
}

/// Recorded engine output for a sequence of frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub frames: Vec<ScriptedFrame>,
}

impl Transcript {
    /// Parse a transcript from its text form
    pub fn parse(content: &str) -> Self {
        let mut frames = Vec::new();
        let mut lines: Vec<String> = Vec::new();
        let mut failed = false;
        let mut dirty = false;

        let mut flush = |lines: &mut Vec<String>, failed: &mut bool, dirty: &mut bool| {
            if *dirty {
                frames.push(if *failed {
                    ScriptedFrame::Failure
                } else {
                    ScriptedFrame::Lines(std::mem::take(lines))
                });
            }
            lines.clear();
            *failed = false;
            *dirty = false;
        };

        for raw in content.lines() {
            let line = raw.trim_end();
            if line.trim() == FRAME_SEPARATOR {
                // An empty section still counts as a frame with no text
                dirty = true;
                flush(&mut lines, &mut failed, &mut dirty);
                continue;
            }
            if line.trim_start().starts_with('#') {
                continue;
            }
            if line.trim() == FAILURE_MARKER {
                failed = true;
                dirty = true;
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }
            lines.push(line.trim().to_string());
            dirty = true;
        }
        flush(&mut lines, &mut failed, &mut dirty);

        Self { frames }
    }

    /// Load a transcript from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read transcript: {:?}", path))?;
        Ok(Self::parse(&content))
    }

    /// Number of recorded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the transcript has no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Recognizer that answers each frame from a transcript.
///
/// The frame's sequence number selects the recorded output; frames past the
/// end of the transcript recognize no text.
#[derive(Debug, Clone)]
pub struct ReplayRecognizer {
    transcript: Transcript,
}

impl ReplayRecognizer {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

impl TextRecognizer for ReplayRecognizer {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn recognize(&self, frame: &Frame) -> Result<Vec<RecognizedLine>, RecognitionError> {
        let Some(scripted) = usize::try_from(frame.sequence)
            .ok()
            .and_then(|index| self.transcript.frames.get(index))
        else {
            debug!("Frame {} is past the end of the transcript", frame.sequence);
            return Ok(Vec::new());
        };

        match scripted {
            ScriptedFrame::Lines(lines) => {
                Ok(lines.iter().map(|l| RecognizedLine::new(l.as_str())).collect())
            }
            ScriptedFrame::Failure => Err(RecognitionError::Engine(format!(
                "scripted failure on frame {}",
                frame.sequence
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# first frame is blurry
BANK OF NOWHERE
---
!fail
---
4532 0151 1283 0366
12/29
JOHN DOE
---
---
";

    #[test]
    fn test_parse_transcript() {
        let transcript = Transcript::parse(SAMPLE);
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript.frames[0], ScriptedFrame::Lines(vec!["BANK OF NOWHERE".to_string()]));
        assert_eq!(transcript.frames[1], ScriptedFrame::Failure);
        assert_eq!(
            transcript.frames[2],
            ScriptedFrame::Lines(vec![
                "4532 0151 1283 0366".to_string(),
                "12/29".to_string(),
                "JOHN DOE".to_string(),
            ])
        );
        assert_eq!(transcript.frames[3], ScriptedFrame::Lines(vec![]));
    }

    #[test]
    fn test_parse_empty_transcript() {
        assert!(Transcript::parse("").is_empty());
        assert!(Transcript::parse("# only a comment\n").is_empty());
    }

    #[test]
    fn test_replay_recognizer() {
        let recognizer = ReplayRecognizer::new(Transcript::parse(SAMPLE));
        let now = Instant::now();

        let lines = recognizer.recognize(&Frame::empty(0, now)).unwrap();
        assert_eq!(lines, vec![RecognizedLine::new("BANK OF NOWHERE")]);

        assert!(recognizer.recognize(&Frame::empty(1, now)).is_err());

        let lines = recognizer.recognize(&Frame::empty(2, now)).unwrap();
        assert_eq!(lines.len(), 3);

        // Past the end
        assert!(recognizer.recognize(&Frame::empty(99, now)).unwrap().is_empty());
    }

    #[test]
    fn test_load_transcript() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", SAMPLE).unwrap();

        let transcript = Transcript::load(temp_file.path()).unwrap();
        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn test_load_transcript_not_found() {
        assert!(Transcript::load(Path::new("/nonexistent/transcript.txt")).is_err());
    }
}
