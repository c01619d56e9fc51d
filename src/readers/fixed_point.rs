//! Decoder for the `-?D{1,2}.D` measurement format.
//!
//! Values are produced in tenths so callers can accumulate them exactly.

#[inline(always)]
fn digit(byte: u8) -> i32 {
    byte.wrapping_sub(b'0') as i32
}

/// Decode a value assumed to match `-?D{1,2}.D`.
///
/// Input outside the grammar yields an unspecified value. It never panics.
#[inline]
pub fn decode_tenths(bytes: &[u8]) -> i32 {
    let (negative, digits) = match bytes {
        [b'-', rest @ ..] => (true, rest),
        _ => (false, bytes),
    };

    let magnitude = match *digits {
        [units, b'.', tenths] => digit(units) * 10 + digit(tenths),
        [tens, units, b'.', tenths] => digit(tens) * 100 + digit(units) * 10 + digit(tenths),
        _ => digits
            .iter()
            .filter(|&&b| b != b'.')
            .fold(0i32, |acc, &b| acc.wrapping_mul(10).wrapping_add(digit(b))),
    };

    if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}

/// Decode a value, rejecting anything that does not match `-?D{1,2}.D`.
pub fn try_decode_tenths(bytes: &[u8]) -> Option<i32> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    let valid = match digits {
        [u, b'.', t] => u.is_ascii_digit() && t.is_ascii_digit(),
        [d, u, b'.', t] => d.is_ascii_digit() && u.is_ascii_digit() && t.is_ascii_digit(),
        _ => false,
    };

    valid.then(|| decode_tenths(bytes))
}

/// Decode a value to its floating-point representation.
pub fn decode_value(bytes: &[u8]) -> f64 {
    decode_tenths(bytes) as f64 / 10.0
}
