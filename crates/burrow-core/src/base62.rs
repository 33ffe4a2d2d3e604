//! Base62 encoding over the `0-9a-zA-Z` digit alphabet.
//!
//! Digit values follow the concatenation order of the alphabet, so `'0'` is
//! zero, `'a'` is ten and `'Z'` is sixty-one. This is *not* ASCII order and
//! codes produced elsewhere with that alphabet decode to the same numbers.

/// The 62 digit symbols, indexed by digit value.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

const BASE: u64 = ALPHABET.len() as u64;

/// Encodes a non-negative integer as base62 without leading-zero padding.
///
/// `0` encodes to `"0"`, never the empty string.
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    // u64::MAX needs 11 digits.
    let mut digits = Vec::with_capacity(11);
    while value > 0 {
        digits.push(ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();

    digits.into_iter().map(char::from).collect()
}

/// Returns `true` if `c` is one of the 62 alphabet symbols.
pub fn is_digit(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
