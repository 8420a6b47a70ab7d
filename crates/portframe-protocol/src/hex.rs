//! Conversions between hex text, raw bytes and plain text.
//!
//! Hex text is always produced as uppercase digit pairs with no separator.
//! When parsing, spaces and hyphens are ignored so that both `"AABB01"`
//! and `"AA-BB 01"` are accepted.

use portframe_core::constants::HEX_SEPARATORS;
use portframe_core::{Error, Result};
use tracing::warn;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode bytes as uppercase hex, two characters per byte.
///
/// # Examples
///
/// ```
/// use portframe_protocol::hex::bytes_to_hex;
///
/// assert_eq!(bytes_to_hex(&[0xAA, 0x0B, 0x01]), "AA0B01");
/// assert_eq!(bytes_to_hex(&[]), "");
/// ```
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0F) as usize] as char);
    }
    out
}

/// Parse hex text into bytes.
///
/// Separators are stripped first. An odd digit count is not an error: the
/// trailing digit is dropped and a warning is logged.
///
/// # Errors
/// Returns `Error::InvalidHexDigit` if any pair is not valid base-16. Its
/// `position` is the character offset of the pair's first digit in `text`,
/// separators included.
///
/// # Examples
///
/// ```
/// use portframe_protocol::hex::hex_to_bytes;
///
/// assert_eq!(hex_to_bytes("AA-bb 01").unwrap(), vec![0xAA, 0xBB, 0x01]);
/// assert_eq!(hex_to_bytes("ABC").unwrap(), vec![0xAB]);
/// assert!(hex_to_bytes("AZ").is_err());
/// ```
pub fn hex_to_bytes(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<(usize, char)> = text
        .chars()
        .enumerate()
        .filter(|(_, c)| !HEX_SEPARATORS.contains(c))
        .collect();

    let usable = digits.len() - digits.len() % 2;
    if usable != digits.len() {
        warn!(
            "Malformed hex text ({} digits), dropping trailing digit",
            digits.len()
        );
    }

    digits[..usable]
        .chunks_exact(2)
        .map(|pair| {
            let [(position, hi), (_, lo)] = [pair[0], pair[1]];
            match (hi.to_digit(16), lo.to_digit(16)) {
                (Some(hi), Some(lo)) => Ok(((hi << 4) | lo) as u8),
                _ => Err(Error::InvalidHexDigit {
                    pair: [hi, lo].iter().collect(),
                    position,
                }),
            }
        })
        .collect()
}

/// Decode bytes as text, replacing invalid UTF-8 sequences.
pub fn bytes_to_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Encode text as its UTF-8 bytes.
pub fn text_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}
