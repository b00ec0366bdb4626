//! Luhn mod-10 checksum for account numbers

/// Even-position digits doubled, with the tens digit carried back in.
const DOUBLED: [u32; 10] = [0, 2, 4, 6, 8, 1, 3, 5, 7, 9];

/// Returns true when `digits` is a valid Luhn-checked number.
///
/// Surrounding whitespace is ignored. Any other non-digit character, an
/// empty input, or an all-zero input fails the check.
pub fn luhn_check(digits: &str) -> bool {
    let digits = digits.trim();
    let mut sum = 0u32;

    // Parity is counted from the rightmost digit, which is position 1 (odd)
    for (index, c) in digits.chars().rev().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if index % 2 == 0 { d } else { DOUBLED[d as usize] };
    }

    sum > 0 && sum % 10 == 0
}
