//! Outbound checksum trailers.
//!
//! Each algorithm returns `payload ++ trailer`; the payload itself is never
//! modified. Three trailer kinds are supported:
//!
//! | Kind | Trailer contents |
//! |------|------------------|
//! | CRC16 | low byte, high byte of the CRC register, then zero fill |
//! | XOR | the single XOR byte, repeated for every trailer byte |
//! | SUM | the byte sum, little-endian, truncated to the trailer length |
//!
//! The CRC is the reflected 0xA001 polynomial with a 0xFFFF initial
//! register (the Modbus RTU variant), so `"123456789"` checks to `0x4B37`.
//!
//! # Example
//!
//! ```
//! use portframe_protocol::checksum::append_checksum;
//! use portframe_core::{ChecksumKind, ChecksumRequest};
//!
//! let framed = append_checksum(&[0x01, 0x02, 0x03], ChecksumRequest::new(ChecksumKind::Crc16, 2));
//! assert_eq!(&framed[..], &[0x01, 0x02, 0x03, 0x61, 0x61]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use portframe_core::constants::{CRC16_INITIAL, CRC16_POLYNOMIAL, CRC16_WIDTH};
use portframe_core::{ChecksumKind, ChecksumRequest};

/// Compute the CRC16 register over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC16_INITIAL;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ CRC16_POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

/// XOR of all bytes in `data`.
pub fn xor(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// Sum of all bytes in `data`.
pub fn sum(data: &[u8]) -> u64 {
    data.iter().map(|&b| b as u64).sum()
}

/// Compute the trailer bytes for `payload` without appending them.
///
/// Returns an empty vector when the request is a no-op.
pub fn trailer(payload: &[u8], request: ChecksumRequest) -> Vec<u8> {
    if request.is_noop() {
        return Vec::new();
    }

    let len = request.trailer_len;
    match request.kind {
        ChecksumKind::None => Vec::new(),
        ChecksumKind::Crc16 => {
            let crc = crc16(payload).to_le_bytes();
            (0..len)
                .map(|i| if i < CRC16_WIDTH { crc[i] } else { 0 })
                .collect()
        }
        ChecksumKind::Xor => vec![xor(payload); len],
        ChecksumKind::Sum => {
            let total = sum(payload);
            (0..len)
                .map(|i| {
                    (i as u32)
                        .checked_mul(8)
                        .and_then(|shift| total.checked_shr(shift))
                        .map_or(0, |v| (v & 0xFF) as u8)
                })
                .collect()
        }
    }
}

/// Append a CRC16 trailer of `trailer_len` bytes.
pub fn append_crc16(payload: &[u8], trailer_len: usize) -> Bytes {
    append_checksum(payload, ChecksumRequest::new(ChecksumKind::Crc16, trailer_len))
}

/// Append an XOR trailer of `trailer_len` bytes.
pub fn append_xor(payload: &[u8], trailer_len: usize) -> Bytes {
    append_checksum(payload, ChecksumRequest::new(ChecksumKind::Xor, trailer_len))
}

/// Append a SUM trailer of `trailer_len` bytes.
pub fn append_sum(payload: &[u8], trailer_len: usize) -> Bytes {
    append_checksum(payload, ChecksumRequest::new(ChecksumKind::Sum, trailer_len))
}

/// Append the trailer described by `request` to `payload`.
///
/// A no-op request returns the payload unchanged.
pub fn append_checksum(payload: &[u8], request: ChecksumRequest) -> Bytes {
    let trailer = trailer(payload, request);
    let mut buf = BytesMut::with_capacity(payload.len() + trailer.len());
    buf.put_slice(payload);
    buf.put_slice(&trailer);
    buf.freeze()
}

/// Check that the last `request.trailer_len` bytes of `packet` are the
/// trailer of the bytes before them.
///
/// No-op requests always verify. Packets shorter than the trailer never do.
pub fn verify_trailer(packet: &[u8], request: ChecksumRequest) -> bool {
    if request.is_noop() {
        return true;
    }
    let Some(split) = packet.len().checked_sub(request.trailer_len) else {
        return false;
    };
    let (payload, received) = packet.split_at(split);
    trailer(payload, request) == received
}
