//! Scan outcomes and incremental feedback
//!
//! `ScanResult` is the single terminal value of a session. `ScanFeedback`
//! is the stream of progress updates for the presentation layer.

use serde::Serialize;
use uuid::Uuid;

use super::brand::CardBrand;
use super::extract::{CardholderName, Expiry};

/// Terminal outcome of a scan session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanResult {
    /// A card number was read consistently
    Accepted {
        /// Card number formatted in groups of four
        number: String,
        /// Network label derived from the number prefix
        brand: CardBrand,
        expiry: Option<Expiry>,
        name: Option<CardholderName>,
    },
    /// The session ended without a result
    Cancelled,
}

impl ScanResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanResult::Accepted { .. })
    }
}

/// Progress updates sent while a session runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanFeedback {
    /// A session started
    Started { session_id: Uuid },
    /// A processed frame held no usable card number
    Searching,
    /// A valid number is being confirmed
    Candidate {
        /// Number with all but the last four digits hidden, when previews
        /// are enabled
        masked: Option<String>,
        brand: CardBrand,
        /// Consecutive frames that produced this number
        seen: u32,
        /// Frames needed before it is accepted
        required: u32,
    },
    /// The session reached its terminal result
    Finished,
}

impl ScanFeedback {
    /// Instruction text for the user
    pub fn instruction(&self) -> String {
        match self {
            ScanFeedback::Started { .. } => "Position your card within the frame".to_string(),
            ScanFeedback::Searching => "Hold the card steady so the number is visible".to_string(),
            ScanFeedback::Candidate { masked: Some(masked), brand, .. } => {
                format!("{} {} detected, hold still...", brand, masked)
            }
            ScanFeedback::Candidate { masked: None, brand, .. } => {
                format!("{} card detected, hold still...", brand)
            }
            ScanFeedback::Finished => "Done".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_instruction_is_masked() {
        let feedback = ScanFeedback::Candidate {
            masked: Some("**** **** **** 0366".to_string()),
            brand: CardBrand::Visa,
            seen: 1,
            required: 2,
        };
        let text = feedback.instruction();
        assert!(text.contains("**** **** **** 0366"));
        assert!(text.starts_with("Visa"));
    }

    #[test]
    fn test_candidate_instruction_without_preview() {
        let feedback = ScanFeedback::Candidate {
            masked: None,
            brand: CardBrand::Visa,
            seen: 1,
            required: 2,
        };
        assert_eq!(feedback.instruction(), "Visa card detected, hold still...");
    }

    #[test]
    fn test_result_serialization() {
        let result = ScanResult::Accepted {
            number: "4532 0151 1283 0366".to_string(),
            brand: CardBrand::Visa,
            expiry: Some(Expiry { month: 12, year: 29 }),
            name: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "accepted");
        assert_eq!(json["number"], "4532 0151 1283 0366");
        assert_eq!(json["brand"], "visa");
        assert_eq!(json["expiry"]["month"], 12);
        assert!(json["name"].is_null());

        let json = serde_json::to_value(ScanResult::Cancelled).unwrap();
        assert_eq!(json["outcome"], "cancelled");
    }
}
