//! Postal code (CEP) format gate.

/// Required number of digits in a CEP.
pub const CEP_LENGTH: usize = 8;

/// Returns true iff `code` is exactly eight ASCII decimal digits.
///
/// No trimming is applied and non-ASCII digits are rejected.
pub fn validate(code: &str) -> bool {
    code.len() == CEP_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
