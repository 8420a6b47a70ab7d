//! Core constants for the portframe packet pipeline.
//!
//! This module centralizes the numeric parameters shared by the framer,
//! the checksum codec and the serial transport layer.
//!
//! # Usage
//!
//! ```
//! use portframe_core::constants::*;
//!
//! assert_eq!(CRC16_POLYNOMIAL, 0xA001);
//! assert_eq!(DEFAULT_BAUD_RATE, 9600);
//! ```

// ============================================================================
// Checksum Parameters
// ============================================================================

/// Reflected polynomial used by the CRC16 trailer.
pub const CRC16_POLYNOMIAL: u16 = 0xA001;

/// Initial CRC16 register value.
pub const CRC16_INITIAL: u16 = 0xFFFF;

/// Number of meaningful bytes in a CRC16 trailer.
///
/// Trailer bytes requested beyond this count are zero-filled.
pub const CRC16_WIDTH: usize = 2;

// ============================================================================
// Hex Text
// ============================================================================

/// Characters stripped from hex text before parsing.
///
/// # Examples
///
/// ```
/// use portframe_core::constants::HEX_SEPARATORS;
///
/// let cleaned: String = "AA-BB 01"
///     .chars()
///     .filter(|c| !HEX_SEPARATORS.contains(c))
///     .collect();
/// assert_eq!(cleaned, "AABB01");
/// ```
pub const HEX_SEPARATORS: [char; 2] = [' ', '-'];

// ============================================================================
// Buffer Limits
// ============================================================================

/// Maximum raw buffer size kept by the framer (64 KB).
///
/// If the buffer grows beyond this size without yielding packets, it is
/// discarded to bound memory use on a noisy line.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial raw buffer capacity (4 KB).
pub const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Initial capacity of the framed packet queue.
pub const INITIAL_PACKET_QUEUE_CAPACITY: usize = 4;

/// Default maximum size of a single framed packet accepted by the codec.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

// ============================================================================
// Serial Defaults
// ============================================================================

/// Default serial line speed.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default number of data bits per character.
pub const DEFAULT_DATA_BITS: u8 = 8;

/// Default read timeout in milliseconds.
///
/// Kept short so that a poll tick never blocks noticeably.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10;

/// Size of the scratch buffer used for a single transport read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Pause of the background reader after an empty read, in milliseconds.
pub const READER_IDLE_BACKOFF_MS: u64 = 1;
