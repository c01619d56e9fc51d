use crate::error::{ProcessingError, Result};
use crate::readers::fixed_point::{decode_tenths, try_decode_tenths};

pub const SEPARATOR: u8 = b';';

/// One decoded `station;value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub station: &'a [u8],
    pub tenths: i32,
}

impl Record<'_> {
    pub fn value(&self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Split a line at its separator, trusting the value format.
///
/// The value is short, so the separator is searched from the end.
/// Returns `None` when the line carries no separator.
#[inline]
pub fn parse_record(line: &[u8]) -> Option<Record<'_>> {
    let line = trim_cr(line);
    let pos = memchr::memrchr(SEPARATOR, line)?;
    Some(Record {
        station: &line[..pos],
        tenths: decode_tenths(&line[pos + 1..]),
    })
}

/// Parse a line, classifying anything outside the `key;value` grammar as malformed.
pub fn parse_record_checked(line: &[u8]) -> Result<Record<'_>> {
    let trimmed = trim_cr(line);
    let pos = memchr::memchr(SEPARATOR, trimmed).ok_or_else(|| ProcessingError::malformed(line))?;
    let (station, value) = (&trimmed[..pos], &trimmed[pos + 1..]);

    if station.is_empty() {
        return Err(ProcessingError::malformed(line));
    }

    let tenths = try_decode_tenths(value).ok_or_else(|| ProcessingError::malformed(line))?;
    Ok(Record { station, tenths })
}

/// Iterate the non-empty lines of a byte span without their terminators.
pub fn lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut start = 0;
    let mut ends = memchr::memchr_iter(b'\n', data);
    std::iter::from_fn(move || loop {
        match ends.next() {
            Some(end) => {
                let line = &data[start..end];
                start = end + 1;
                if !line.is_empty() {
                    return Some(line);
                }
            }
            None if start < data.len() => {
                let line = &data[start..];
                start = data.len();
                return Some(line);
            }
            None => return None,
        }
    })
}
