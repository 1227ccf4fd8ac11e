//! Card Analysis Layer
//!
//! Turns the recognized lines of one frame into validated card fields, and
//! tracks those fields across frames until they are stable.

pub mod brand;
pub mod events;
pub mod extract;
pub mod luhn;
pub mod stability;

use chrono::NaiveDate;

use crate::vision::RecognizedLine;

pub use brand::CardBrand;
pub use events::{ScanFeedback, ScanResult};
pub use extract::{CardNumber, CardholderName, Expiry, ExpiryPolicy, FrameFields};
pub use stability::DetectionState;

/// Fields of one frame after Luhn validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameAnalysis {
    /// Extracted fields; `number` is only present when it passed Luhn
    pub fields: FrameFields,
    /// Whether a number candidate was found but failed Luhn
    pub rejected_number: bool,
}

/// Extract and validate the card fields of one frame
pub fn analyze_frame(
    lines: &[RecognizedLine],
    today: NaiveDate,
    policy: ExpiryPolicy,
) -> FrameAnalysis {
    let mut fields = extract::extract_fields(lines, today, policy);

    let rejected_number = match &fields.number {
        Some(number) if !luhn::is_valid_luhn(number.digits()) => {
            fields.number = None;
            true
        }
        _ => false,
    };

    FrameAnalysis {
        fields,
        rejected_number,
    }
}
