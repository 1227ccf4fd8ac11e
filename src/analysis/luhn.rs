//! Luhn checksum and card number display formatting

/// Digits per display group
const GROUP_SIZE: usize = 4;

/// Character replacing hidden digits in a masked preview
const MASK_CHAR: char = '*';

/// Validate a digit string with the Luhn checksum.
///
/// Every second digit counting from the right is doubled (subtracting 9 when
/// the result exceeds 9) and the string is valid when the digit sum is a
/// multiple of 10. Empty strings and strings with non-digits are invalid.
pub fn is_valid_luhn(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (index, ch) in digits.chars().rev().enumerate() {
        let Some(mut digit) = ch.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }

    sum % 10 == 0
}

/// Format a digit string for display in groups of four.
///
/// `"4532015112830366"` becomes `"4532 0151 1283 0366"`; a trailing partial
/// group is kept as is.
pub fn format_card_number(digits: &str) -> String {
    let mut formatted = String::with_capacity(digits.len() + digits.len() / GROUP_SIZE);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && index % GROUP_SIZE == 0 {
            formatted.push(' ');
        }
        formatted.push(ch);
    }
    formatted
}

/// Format a digit string with everything but the last four digits hidden.
pub fn mask_card_number(digits: &str) -> String {
    let visible_from = digits.chars().count().saturating_sub(GROUP_SIZE);
    let masked: String = digits
        .chars()
        .enumerate()
        .map(|(index, ch)| if index < visible_from { MASK_CHAR } else { ch })
        .collect();
    format_card_number(&masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straightforward reference: sum doubled-digit values via a lookup table
    fn reference_luhn(digits: &str) -> bool {
        const DOUBLED: [u32; 10] = [0, 2, 4, 6, 8, 1, 3, 5, 7, 9];
        let values: Vec<u32> = digits.bytes().map(|b| (b - b'0') as u32).collect();
        let mut sum = 0;
        for (i, v) in values.iter().rev().enumerate() {
            sum += if i % 2 == 1 { DOUBLED[*v as usize] } else { *v };
        }
        sum % 10 == 0
    }

    /// Deterministic digit strings from a linear congruential generator
    fn generated_numbers(count: usize) -> Vec<String> {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as u32
        };

        (0..count)
            .map(|_| {
                let len = 13 + (next() % 7) as usize;
                (0..len).map(|_| char::from(b'0' + (next() % 10) as u8)).collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_known_numbers() {
        assert!(is_valid_luhn("4532015112830366"));
        assert!(!is_valid_luhn("4532015112830367"));
        assert!(is_valid_luhn("378282246310005"));
        assert!(is_valid_luhn("6011111111111117"));
        assert!(is_valid_luhn("5555555555554444"));
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(!is_valid_luhn(""));
        assert!(!is_valid_luhn("4532 0151 1283 0366"));
        assert!(!is_valid_luhn("45320151128303a6"));
    }

    #[test]
    fn test_agrees_with_reference() {
        let numbers = generated_numbers(2000);
        let mut valid = 0;
        for number in &numbers {
            assert_eq!(is_valid_luhn(number), reference_luhn(number), "disagreement on {}", number);
            if reference_luhn(number) {
                valid += 1;
            }
        }
        // Roughly one in ten random strings passes
        assert!(valid > 0);
    }

    #[test]
    fn test_format_card_number() {
        assert_eq!(format_card_number("4532015112830366"), "4532 0151 1283 0366");
        assert_eq!(format_card_number("378282246310005"), "3782 8224 6310 005");
        assert_eq!(format_card_number("4532"), "4532");
        assert_eq!(format_card_number(""), "");
    }

    #[test]
    fn test_format_is_well_formed() {
        for number in generated_numbers(200) {
            let formatted = format_card_number(&number);
            assert_eq!(formatted.replace(' ', ""), number);
            assert!(!formatted.starts_with(' ') && !formatted.ends_with(' '));

            let groups: Vec<&str> = formatted.split(' ').collect();
            let (last, full) = groups.split_last().unwrap();
            assert!(full.iter().all(|g| g.len() == 4));
            assert!((1..=4).contains(&last.len()));
        }
    }

    #[test]
    fn test_mask_card_number() {
        assert_eq!(mask_card_number("4532015112830366"), "**** **** **** 0366");
        assert_eq!(mask_card_number("378282246310005"), "**** **** ***0 005");
        assert_eq!(mask_card_number("123"), "123");
    }
}
