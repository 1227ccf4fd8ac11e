//! Temporal stability gate
//!
//! A card number is only trusted once the same Luhn-valid candidate has been
//! read on consecutive processed frames. The state is a plain value and each
//! frame produces a new one through [`DetectionState::step`].

use super::extract::{CardNumber, CardholderName, Expiry, FrameFields};

/// Consecutive matching frames required before a number is accepted
pub const DEFAULT_STABILITY_THRESHOLD: u32 = 2;

/// Detection state carried between processed frames of one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionState {
    /// Most recent Luhn-valid number
    pub last_candidate: Option<CardNumber>,
    /// How many frames in a row produced `last_candidate`
    pub consecutive_count: u32,
    /// Most recent expiry seen alongside a valid number
    pub carried_expiry: Option<Expiry>,
    /// Most recent name seen alongside a valid number
    pub carried_name: Option<CardholderName>,
}

impl DetectionState {
    /// Fold one frame's validated fields into the state.
    ///
    /// `fields.number` must already have passed the Luhn check. A frame
    /// without a number leaves the state untouched, so an isolated noisy
    /// frame does not break a streak.
    pub fn step(&self, fields: FrameFields) -> DetectionState {
        let Some(number) = fields.number else {
            return self.clone();
        };

        let consecutive_count = match &self.last_candidate {
            Some(last) if *last == number => self.consecutive_count.saturating_add(1),
            _ => 1,
        };

        DetectionState {
            last_candidate: Some(number),
            consecutive_count,
            carried_expiry: fields.expiry.or(self.carried_expiry),
            carried_name: fields.name.or_else(|| self.carried_name.clone()),
        }
    }

    /// Whether the current candidate has been seen often enough
    pub fn is_stable(&self, threshold: u32) -> bool {
        self.last_candidate.is_some() && self.consecutive_count >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::extract::{extract_name, ExpiryPolicy};
    use chrono::NaiveDate;

    fn number(digits: &str) -> FrameFields {
        FrameFields {
            number: CardNumber::new(digits),
            ..Default::default()
        }
    }

    fn expiry(month: u8, year: u8) -> Option<Expiry> {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        Expiry::new(month, year, today, ExpiryPolicy::YearOnly)
    }

    #[test]
    fn test_same_candidate_becomes_stable() {
        let state = DetectionState::default();
        let state = state.step(number("4532015112830366"));
        assert_eq!(state.consecutive_count, 1);
        assert!(!state.is_stable(DEFAULT_STABILITY_THRESHOLD));

        let state = state.step(number("4532015112830366"));
        assert_eq!(state.consecutive_count, 2);
        assert!(state.is_stable(DEFAULT_STABILITY_THRESHOLD));
    }

    #[test]
    fn test_different_candidate_resets_count() {
        let state = DetectionState::default()
            .step(number("4532015112830366"))
            .step(number("5555555555554444"));

        assert_eq!(state.consecutive_count, 1);
        assert_eq!(state.last_candidate.as_ref().unwrap().digits(), "5555555555554444");
        assert!(!state.is_stable(DEFAULT_STABILITY_THRESHOLD));
    }

    #[test]
    fn test_empty_frame_keeps_streak() {
        let state = DetectionState::default().step(number("4532015112830366"));
        let after_noise = state.step(FrameFields::default());
        assert_eq!(after_noise, state);

        let state = after_noise.step(number("4532015112830366"));
        assert!(state.is_stable(DEFAULT_STABILITY_THRESHOLD));
    }

    #[test]
    fn test_optional_fields_are_carried() {
        let mut fields = number("4532015112830366");
        fields.expiry = expiry(12, 29);
        fields.name = extract_name("JOHN DOE");
        let state = DetectionState::default().step(fields);

        // A frame without expiry or name does not clear them
        let state = state.step(number("4532015112830366"));
        assert_eq!(state.carried_expiry, expiry(12, 29));
        assert_eq!(state.carried_name.as_ref().unwrap().as_str(), "JOHN DOE");

        // A newer expiry overwrites the carried one
        let mut fields = number("4532015112830366");
        fields.expiry = expiry(1, 30);
        let state = state.step(fields);
        assert_eq!(state.carried_expiry, expiry(1, 30));
    }

    #[test]
    fn test_fields_without_number_are_ignored() {
        let fields = FrameFields {
            number: None,
            expiry: expiry(12, 29),
            name: extract_name("JOHN DOE"),
        };
        let state = DetectionState::default().step(fields);
        assert_eq!(state, DetectionState::default());
    }

    #[test]
    fn test_stability_does_not_need_optional_fields() {
        let state = DetectionState::default()
            .step(number("378282246310005"))
            .step(number("378282246310005"));
        assert!(state.is_stable(DEFAULT_STABILITY_THRESHOLD));
        assert!(state.carried_expiry.is_none());
        assert!(state.carried_name.is_none());
    }
}
