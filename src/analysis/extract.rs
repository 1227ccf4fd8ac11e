//! Field extraction from recognized text lines
//!
//! Pure heuristics that pull a card number, expiry date and cardholder name
//! out of single lines of OCR output. Nothing here keeps state between
//! calls; the per-frame composition is [`extract_fields`].

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::vision::RecognizedLine;

/// Shortest accepted card number
pub const MIN_CARD_DIGITS: usize = 13;
/// Longest accepted card number
pub const MAX_CARD_DIGITS: usize = 19;

const MIN_NAME_LEN: usize = 5;
const MAX_NAME_LEN: usize = 26;

/// Substrings that mark a line as card furniture rather than a name
const NAME_DENYLIST: &[&str] = &[
    "VISA",
    "MASTERCARD",
    "AMEX",
    "AMERICAN EXPRESS",
    "DISCOVER",
    "MAESTRO",
    "UNIONPAY",
    "DINERS",
    "JCB",
    "CREDIT",
    "DEBIT",
    "CARD",
    "VALID",
    "THRU",
    "EXPIRES",
    "END",
];

fn grouped_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b\d{4}[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b").expect("valid card number pattern")
    })
}

/// Expiry patterns in the order they are tried: `MM/YY`, `MM/YYYY`, `MMYY`
fn expiry_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"\b(\d{2})/(\d{2})\b").expect("valid MM/YY pattern"),
            Regex::new(r"\b(\d{2})/\d{2}(\d{2})\b").expect("valid MM/YYYY pattern"),
            Regex::new(r"\b(\d{2})(\d{2})\b").expect("valid MMYY pattern"),
        ]
    })
}

/// A digit-only card number candidate of 13 to 19 digits
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardNumber(String);

impl CardNumber {
    /// Wrap a digit string, rejecting anything that is not 13-19 ASCII digits
    pub fn new(digits: impl Into<String>) -> Option<Self> {
        let digits = digits.into();
        let valid_len = (MIN_CARD_DIGITS..=MAX_CARD_DIGITS).contains(&digits.len());
        if valid_len && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits))
        } else {
            None
        }
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

/// How strictly an expiry date is checked against today's date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryPolicy {
    /// Only the two-digit year is compared; a card that expired earlier in
    /// the current year is still accepted
    #[default]
    YearOnly,
    /// Year and month are compared
    YearAndMonth,
}

/// An expiry date normalized to `MM/YY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiry {
    /// Month, 1-12
    pub month: u8,
    /// Two-digit year
    pub year: u8,
}

impl Expiry {
    /// Build an expiry if it is well formed and not in the past
    pub fn new(month: u8, year: u8, today: NaiveDate, policy: ExpiryPolicy) -> Option<Self> {
        if !(1..=12).contains(&month) || year > 99 {
            return None;
        }

        let current_year = (today.year().rem_euclid(100)) as u8;
        let current_month = today.month() as u8;
        let expired = match policy {
            ExpiryPolicy::YearOnly => year < current_year,
            ExpiryPolicy::YearAndMonth => {
                year < current_year || (year == current_year && month < current_month)
            }
        };

        if expired {
            None
        } else {
            Some(Self { month, year })
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.year)
    }
}

/// A cardholder name: uppercase words, trimmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardholderName(String);

impl CardholderName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardholderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidates found in one frame, at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFields {
    pub number: Option<CardNumber>,
    pub expiry: Option<Expiry>,
    pub name: Option<CardholderName>,
}

impl FrameFields {
    pub fn is_empty(&self) -> bool {
        self.number.is_none() && self.expiry.is_none() && self.name.is_none()
    }
}

/// Extract a card number candidate from one line.
///
/// The whole line's digits are taken when there are 13-19 of them. Otherwise
/// the first 4x4 digit group (spaces or dashes allowed between groups) is
/// used.
pub fn extract_card_number(line: &str) -> Option<CardNumber> {
    let digits: String = line.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(number) = CardNumber::new(digits) {
        return Some(number);
    }

    let grouped = grouped_number_pattern().find(line)?;
    let digits: String = grouped.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
    CardNumber::new(digits)
}

/// Extract an expiry date from one line.
///
/// Each pattern is tried in turn against its first match in the line; the
/// first match with a valid, unexpired date wins.
pub fn extract_expiry(line: &str, today: NaiveDate, policy: ExpiryPolicy) -> Option<Expiry> {
    expiry_patterns().iter().find_map(|pattern| {
        let captures = pattern.captures(line)?;
        let month = captures.get(1)?.as_str().parse::<u8>().ok()?;
        let year = captures.get(2)?.as_str().parse::<u8>().ok()?;
        Expiry::new(month, year, today, policy)
    })
}

/// Extract a cardholder name from one line.
pub fn extract_name(line: &str) -> Option<CardholderName> {
    let trimmed = line.trim();

    let len = trimmed.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
        return None;
    }
    if !trimmed.chars().all(|c| c == ' ' || (c.is_alphabetic() && c.is_uppercase())) {
        return None;
    }
    if trimmed.split_whitespace().count() < 2 {
        return None;
    }
    if NAME_DENYLIST.iter().any(|word| trimmed.contains(word)) {
        return None;
    }

    Some(CardholderName(trimmed.to_string()))
}

/// Run every extractor over a frame's lines.
///
/// Lines are visited in engine order and the first candidate found for each
/// field is kept; candidates are not ranked against each other.
pub fn extract_fields(
    lines: &[RecognizedLine],
    today: NaiveDate,
    policy: ExpiryPolicy,
) -> FrameFields {
    let mut fields = FrameFields::default();

    for line in lines {
        let text = line.text.as_str();
        if fields.number.is_none() {
            fields.number = extract_card_number(text);
        }
        if fields.expiry.is_none() {
            fields.expiry = extract_expiry(text, today, policy);
        }
        if fields.name.is_none() {
            fields.name = extract_name(text);
        }
        if fields.number.is_some() && fields.expiry.is_some() && fields.name.is_some() {
            break;
        }
    }

    fields
}
