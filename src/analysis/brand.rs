//! Card network detection by number prefix
//!
//! The prefixes are a coarse approximation of real BIN ranges. The label is
//! for display only and never affects whether a number is accepted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card network inferred from the leading digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    /// Unrecognized prefix
    Generic,
}

impl CardBrand {
    /// Classify a validated digit string
    pub fn detect(digits: &str) -> Self {
        if digits.starts_with("34") || digits.starts_with("37") {
            CardBrand::Amex
        } else if digits.starts_with("6011") || digits.starts_with("65") {
            CardBrand::Discover
        } else if digits.starts_with('4') {
            CardBrand::Visa
        } else if digits.starts_with('5') || digits.starts_with('2') {
            CardBrand::Mastercard
        } else {
            CardBrand::Generic
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "Amex",
            CardBrand::Discover => "Discover",
            CardBrand::Generic => "Card",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_brands() {
        assert_eq!(CardBrand::detect("4532015112830366"), CardBrand::Visa);
        assert_eq!(CardBrand::detect("5555555555554444"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("2221000000000009"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("378282246310005"), CardBrand::Amex);
        assert_eq!(CardBrand::detect("341111111111111"), CardBrand::Amex);
        assert_eq!(CardBrand::detect("6011111111111117"), CardBrand::Discover);
        assert_eq!(CardBrand::detect("6500000000000002"), CardBrand::Discover);
    }

    #[test]
    fn test_unknown_prefix_is_generic() {
        assert_eq!(CardBrand::detect("3530111333300000"), CardBrand::Generic);
        assert_eq!(CardBrand::detect("6200000000000005"), CardBrand::Generic);
        assert_eq!(CardBrand::detect(""), CardBrand::Generic);
        assert_eq!(CardBrand::Generic.label(), "Card");
    }
}
