//! Friend code formatting and validation
//!
//! A friend code is a 16-digit player identifier displayed and entered as
//! four dash-separated groups of four digits.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

static FRIEND_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{4}$").unwrap());

/// Progressive input mask: strip non-digits, cap at 16 digits, insert a dash
/// after every complete group of four (never a trailing dash)
pub fn format_friend_code(input: &str) -> String {
    let digits: Vec<char> = input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(16)
        .collect();

    let mut formatted = String::with_capacity(19);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && i % 4 == 0 {
            formatted.push('-');
        }
        formatted.push(*digit);
    }
    formatted
}

/// Whether the code is a complete, dashed friend code
pub fn is_valid_friend_code(code: &str) -> bool {
    FRIEND_CODE_RE.is_match(code)
}

/// Generate a random friend code: four zero-padded groups of four digits
pub fn generate_friend_code() -> String {
    let mut rng = rand::thread_rng();
    let segments: Vec<String> = (0..4).map(|_| format!("{:04}", rng.gen_range(0..10000))).collect();
    segments.join("-")
}
