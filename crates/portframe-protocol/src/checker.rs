//! Packet integrity checks run before a packet is dispatched.
//!
//! A [`PacketChecker`] sees every framed packet once. Returning `false`
//! drops the packet: nothing downstream is invoked. Both methods default to
//! accepting, so an implementation only overrides the encoding it cares
//! about.

use crate::checksum::verify_trailer;
use portframe_core::ChecksumRequest;

/// Validates framed packets before extraction and dispatch.
///
/// # Examples
///
/// ```
/// use portframe_protocol::PacketChecker;
///
/// struct MinLength(usize);
///
/// impl PacketChecker for MinLength {
///     fn check_binary_packet(&self, packet: &[u8]) -> bool {
///         packet.len() >= self.0
///     }
/// }
///
/// let checker = MinLength(4);
/// assert!(!checker.check_binary_packet(&[0xAA, 0xBB]));
/// assert!(checker.check_text_packet("any text"));
/// ```
pub trait PacketChecker: Send {
    fn check_binary_packet(&self, _packet: &[u8]) -> bool {
        true
    }

    fn check_text_packet(&self, _packet: &str) -> bool {
        true
    }
}

/// Checker that accepts every packet.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PacketChecker for AcceptAll {}

/// Checker that verifies a checksum trailer at the end of each packet.
///
/// The text variant checks the UTF-8 bytes of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailerChecker {
    request: ChecksumRequest,
}

impl TrailerChecker {
    pub fn new(request: ChecksumRequest) -> Self {
        Self { request }
    }

    pub fn request(&self) -> ChecksumRequest {
        self.request
    }
}

impl PacketChecker for TrailerChecker {
    fn check_binary_packet(&self, packet: &[u8]) -> bool {
        verify_trailer(packet, self.request)
    }

    fn check_text_packet(&self, packet: &str) -> bool {
        verify_trailer(packet.as_bytes(), self.request)
    }
}

impl<F> PacketChecker for F
where
    F: Fn(&[u8]) -> bool + Send,
{
    fn check_binary_packet(&self, packet: &[u8]) -> bool {
        self(packet)
    }
}
