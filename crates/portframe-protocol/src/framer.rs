//! Stream framer for marker-delimited binary packets.
//!
//! Serial links give no framing guarantees: a read may return part of a
//! packet, several packets back to back, or a packet split across reads.
//! The [`StreamFramer`] accumulates bytes in an internal buffer and cuts
//! complete packets out of it according to a [`PacketDescriptor`].
//!
//! # Framing Modes
//!
//! | Descriptor | Behaviour |
//! |------------|-----------|
//! | framing off, or empty marker | every read is one packet |
//! | marker + fixed length | packets of exactly `fixed_length` bytes starting at the marker, reassembled across reads |
//! | marker, no length | from the marker to the end of the buffered data |
//!
//! Packets always include the marker bytes.
//!
//! # Usage
//!
//! ```
//! use portframe_core::PacketDescriptor;
//! use portframe_protocol::StreamFramer;
//!
//! let mut framer = StreamFramer::new(PacketDescriptor::framed("AABB", Some(4))).unwrap();
//!
//! framer.feed(&[0x00, 0xAA]);
//! framer.feed(&[0xBB, 0x01]);
//! assert!(framer.next_packet().is_none());
//!
//! framer.feed(&[0x02]);
//! let packet = framer.next_packet().unwrap();
//! assert_eq!(&packet[..], &[0xAA, 0xBB, 0x01, 0x02]);
//! ```

use bytes::{Bytes, BytesMut};
use portframe_core::constants::{
    DEFAULT_MAX_BUFFER_SIZE, INITIAL_BUFFER_CAPACITY, INITIAL_PACKET_QUEUE_CAPACITY,
};
use portframe_core::{PacketDescriptor, Result};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

use crate::hex::{bytes_to_hex, hex_to_bytes};

/// Stateful framer turning a byte stream into complete packets.
///
/// # Buffer Invariant
///
/// After every [`feed()`](StreamFramer::feed) the internal buffer holds
/// either nothing or only the unconsumed tail of the stream: bytes after
/// the last emitted packet, or an incomplete packet starting at its marker.
/// Bytes that precede an incomplete packet's marker are discarded and never
/// reappear in a later packet.
///
/// ```text
///  buffer:  ?? ?? AA BB 01 02 ?? AA BB 03
///                 └─packet 1─┘    └─incomplete─┐
///  after:                         AA BB 03  <──┘ retained
/// ```
///
/// # Unbounded Packets
///
/// Without a fixed length a packet ends wherever the buffered data ends.
/// Such a packet is emitted as soon as its marker is seen, even if the
/// rest of the logical message arrives with the next read.
#[derive(Debug)]
pub struct StreamFramer {
    /// Bytes received and not yet consumed.
    buffer: BytesMut,

    descriptor: PacketDescriptor,

    /// Marker bytes, parsed once from the descriptor. `None` disables framing.
    marker: Option<Bytes>,

    /// Complete packets ready for extraction.
    packets: VecDeque<Bytes>,

    max_buffer_size: usize,
}

impl StreamFramer {
    /// Create a framer for `descriptor`.
    ///
    /// A fixed length of zero is treated as unbounded.
    ///
    /// # Errors
    /// Returns `Error::InvalidHexDigit` if the start marker is not valid hex.
    pub fn new(mut descriptor: PacketDescriptor) -> Result<Self> {
        descriptor.fixed_length = descriptor.fixed_length.filter(|&len| len > 0);

        let marker = if descriptor.is_framing_active() {
            let text = descriptor.start_marker.as_deref().unwrap_or_default();
            let bytes = hex_to_bytes(text)?;
            if bytes.is_empty() {
                warn!("Start marker '{}' has no complete byte, framing disabled", text);
                None
            } else {
                Some(Bytes::from(bytes))
            }
        } else {
            None
        };

        Ok(Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            descriptor,
            marker,
            packets: VecDeque::with_capacity(INITIAL_PACKET_QUEUE_CAPACITY),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        })
    }

    /// Create a framer that treats every read as one packet.
    pub fn unframed() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            descriptor: PacketDescriptor::unframed(),
            marker: None,
            packets: VecDeque::with_capacity(INITIAL_PACKET_QUEUE_CAPACITY),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Set the buffer size above which buffered data is discarded.
    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    /// Feed bytes read from the transport.
    ///
    /// Appends `bytes` to the buffer and moves every complete packet into
    /// the output queue. An empty slice is a no-op.
    pub fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }

        self.buffer.extend_from_slice(bytes);
        trace!(
            "Framer received {} bytes ({} buffered)",
            bytes.len(),
            self.buffer.len()
        );

        match self.marker.clone() {
            None => self.emit_whole_buffer(),
            Some(marker) => self.extract_framed(&marker),
        }

        if self.buffer.len() > self.max_buffer_size {
            self.discard_overflow();
        }
    }

    /// Extract the next complete packet, if any.
    pub fn next_packet(&mut self) -> Option<Bytes> {
        self.packets.pop_front()
    }

    /// Number of complete packets waiting to be extracted.
    pub fn packets_available(&self) -> usize {
        self.packets.len()
    }

    /// Number of bytes held back waiting for more data.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes held back waiting for more data.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    pub fn descriptor(&self) -> &PacketDescriptor {
        &self.descriptor
    }

    /// Marker bytes in use, or `None` when framing is disabled.
    pub fn marker(&self) -> Option<&[u8]> {
        self.marker.as_deref()
    }

    /// Discard buffered bytes and queued packets.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.packets.clear();
    }

    /// Returns an iterator that drains all currently queued packets.
    ///
    /// It does not process more data; call [`feed()`] first.
    ///
    /// [`feed()`]: StreamFramer::feed
    pub fn drain_packets(&mut self) -> DrainPackets<'_> {
        DrainPackets { framer: self }
    }

    fn emit_whole_buffer(&mut self) {
        let packet = self.buffer.split().freeze();
        trace!("Unframed packet: {}", bytes_to_hex(&packet));
        self.packets.push_back(packet);
    }

    /// Drop buffered bytes, keeping a tail that may be the start of a marker.
    fn discard_overflow(&mut self) {
        let keep = self
            .marker
            .as_ref()
            .map_or(0, |marker| marker.len() - 1)
            .min(self.buffer.len());
        let dropped = self.buffer.len() - keep;

        warn!(
            "Framer buffer exceeded {} bytes without a complete packet, discarding {} bytes",
            self.max_buffer_size, dropped
        );
        let _ = self.buffer.split_to(dropped);
    }

    /// Cut every complete packet out of the buffer.
    fn extract_framed(&mut self, marker: &[u8]) {
        let mut search_from = 0;
        let mut consumed = 0;

        while let Some(start) = find_marker(&self.buffer[search_from..], marker) {
            let start = search_from + start;
            let end = match self.descriptor.fixed_length {
                Some(len) => start.saturating_add(len),
                None => self.buffer.len(),
            };

            if end > self.buffer.len() {
                debug!(
                    "Incomplete packet at offset {} ({} of {} bytes), dropping {} stale bytes",
                    start,
                    self.buffer.len() - start,
                    end - start,
                    start
                );
                let _ = self.buffer.split_to(start);
                return;
            }

            let packet = Bytes::copy_from_slice(&self.buffer[start..end]);
            trace!("Framed packet: {}", bytes_to_hex(&packet));
            self.packets.push_back(packet);

            consumed = end;
            search_from = end;
        }

        if consumed > 0 {
            let _ = self.buffer.split_to(consumed);
        }
    }
}

/// Position of the first occurrence of `marker` in `haystack`.
fn find_marker(haystack: &[u8], marker: &[u8]) -> Option<usize> {
    if marker.is_empty() || haystack.len() < marker.len() {
        return None;
    }
    haystack.windows(marker.len()).position(|w| w == marker)
}

/// Iterator that drains packets from a [`StreamFramer`].
///
/// Created by [`StreamFramer::drain_packets`].
pub struct DrainPackets<'a> {
    framer: &'a mut StreamFramer,
}

impl<'a> Iterator for DrainPackets<'a> {
    type Item = Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_packet()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.framer.packets_available();
        (len, Some(len))
    }
}

impl<'a> ExactSizeIterator for DrainPackets<'a> {
    fn len(&self) -> usize {
        self.framer.packets_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(marker: &str, len: usize) -> StreamFramer {
        StreamFramer::new(PacketDescriptor::framed(marker, Some(len))).unwrap()
    }

    fn unbounded(marker: &str) -> StreamFramer {
        StreamFramer::new(PacketDescriptor::framed(marker, None)).unwrap()
    }

    fn collect(framer: &mut StreamFramer) -> Vec<Vec<u8>> {
        framer.drain_packets().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn test_new_framer() {
        let framer = fixed("AABB", 4);
        assert_eq!(framer.marker(), Some(&[0xAA, 0xBB][..]));
        assert_eq!(framer.packets_available(), 0);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_invalid_marker_rejected() {
        let result = StreamFramer::new(PacketDescriptor::framed("AXBB", Some(4)));
        assert!(result.is_err());
    }

    #[test]
    fn test_lowercase_marker() {
        let mut framer = fixed("aa-bb", 3);
        framer.feed(&[0xAA, 0xBB, 0x01]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x01]]);
    }

    #[test]
    fn test_complete_packet_single_feed() {
        let mut framer = fixed("AABB", 5);
        framer.feed(&[0xAA, 0xBB, 0x01, 0x02, 0x03]);

        assert_eq!(framer.packets_available(), 1);
        assert_eq!(
            framer.next_packet().unwrap().to_vec(),
            vec![0xAA, 0xBB, 0x01, 0x02, 0x03]
        );
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_partial_packet_multiple_feeds() {
        let mut framer = fixed("AABB", 6);

        framer.feed(&[0xAA]);
        assert!(framer.next_packet().is_none());

        framer.feed(&[0xBB, 0x01, 0x02]);
        assert!(framer.next_packet().is_none());
        assert_eq!(framer.buffered(), &[0xAA, 0xBB, 0x01, 0x02]);

        framer.feed(&[0x03, 0x04]);
        assert_eq!(
            collect(&mut framer),
            vec![vec![0xAA, 0xBB, 0x01, 0x02, 0x03, 0x04]]
        );
    }

    #[test]
    fn test_multiple_packets_single_read() {
        let mut framer = fixed("AABB", 3);
        framer.feed(&[0xAA, 0xBB, 0x01, 0xAA, 0xBB, 0x02]);

        assert_eq!(
            collect(&mut framer),
            vec![vec![0xAA, 0xBB, 0x01], vec![0xAA, 0xBB, 0x02]]
        );
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_complete_then_partial() {
        let mut framer = fixed("AABB", 4);
        framer.feed(&[0xAA, 0xBB, 0x01, 0x02, 0x99, 0xAA, 0xBB, 0x03]);

        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x01, 0x02]]);
        // Stale 0x99 is dropped once the incomplete packet's marker is found.
        assert_eq!(framer.buffered(), &[0xAA, 0xBB, 0x03]);

        framer.feed(&[0x04]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x03, 0x04]]);
    }

    #[test]
    fn test_stale_prefix_dropped_for_incomplete_packet() {
        let mut framer = fixed("AABB", 4);
        framer.feed(&[0x10, 0x20, 0x30, 0xAA, 0xBB]);

        assert_eq!(framer.packets_available(), 0);
        assert_eq!(framer.buffered(), &[0xAA, 0xBB]);

        framer.feed(&[0x01, 0x02]);
        let packets = collect(&mut framer);
        assert_eq!(packets, vec![vec![0xAA, 0xBB, 0x01, 0x02]]);
        assert!(!packets[0].contains(&0x10));
    }

    #[test]
    fn test_garbage_before_complete_packet_consumed() {
        let mut framer = fixed("AABB", 3);
        framer.feed(&[0x01, 0x02, 0xAA, 0xBB, 0x03]);

        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x03]]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_no_marker_retains_buffer() {
        let mut framer = fixed("AABB", 3);
        framer.feed(&[0x01, 0x02, 0x03]);

        assert_eq!(framer.packets_available(), 0);
        assert_eq!(framer.buffered(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_marker_split_across_reads() {
        let mut framer = fixed("AABB", 3);
        framer.feed(&[0x00, 0xAA]);
        assert_eq!(framer.packets_available(), 0);

        framer.feed(&[0xBB, 0x07]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x07]]);
    }

    #[test]
    fn test_tail_after_packet_retained() {
        let mut framer = fixed("AABB", 4);
        framer.feed(&[0xAA, 0xBB, 0x01, 0x02, 0x03, 0xAA]);

        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x01, 0x02]]);
        assert_eq!(framer.buffered(), &[0x03, 0xAA]);

        framer.feed(&[0xBB, 0x05, 0x06]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x05, 0x06]]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_byte_by_byte_feeding() {
        let mut framer = fixed("AABB", 5);
        for byte in [0x55, 0xAA, 0xBB, 0x01, 0x02, 0x03] {
            framer.feed(&[byte]);
        }
        assert_eq!(
            collect(&mut framer),
            vec![vec![0xAA, 0xBB, 0x01, 0x02, 0x03]]
        );
    }

    #[test]
    fn test_zero_length_read_is_noop() {
        let mut framer = fixed("AABB", 4);
        framer.feed(&[0xAA, 0xBB]);
        framer.feed(&[]);
        assert_eq!(framer.buffered(), &[0xAA, 0xBB]);
        assert_eq!(framer.packets_available(), 0);

        let mut unframed = StreamFramer::unframed();
        unframed.feed(&[]);
        assert_eq!(unframed.packets_available(), 0);
    }

    #[test]
    fn test_unframed_each_read_is_packet() {
        let mut framer = StreamFramer::unframed();
        framer.feed(&[0x01, 0x02]);
        framer.feed(&[0x03]);

        assert_eq!(collect(&mut framer), vec![vec![0x01, 0x02], vec![0x03]]);
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_empty_marker_disables_framing() {
        let mut framer = StreamFramer::new(PacketDescriptor::framed("", Some(4))).unwrap();
        assert!(framer.marker().is_none());

        framer.feed(&[0xAA, 0xBB]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB]]);
    }

    #[test]
    fn test_single_digit_marker_disables_framing() {
        let framer = StreamFramer::new(PacketDescriptor::framed("A", Some(4))).unwrap();
        assert!(framer.marker().is_none());
    }

    #[test]
    fn test_unbounded_emits_to_end_of_read() {
        let mut framer = unbounded("AABB");
        framer.feed(&[0x01, 0xAA, 0xBB, 0x02]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x02]]);
        assert_eq!(framer.buffered_len(), 0);

        // The continuation of the logical message is not reassembled.
        framer.feed(&[0x03, 0x04]);
        assert_eq!(framer.packets_available(), 0);
        assert_eq!(framer.buffered(), &[0x03, 0x04]);
    }

    #[test]
    fn test_unbounded_swallows_following_markers() {
        let mut framer = unbounded("AABB");
        framer.feed(&[0xAA, 0xBB, 0x01, 0xAA, 0xBB, 0x02]);
        assert_eq!(
            collect(&mut framer),
            vec![vec![0xAA, 0xBB, 0x01, 0xAA, 0xBB, 0x02]]
        );
    }

    #[test]
    fn test_fixed_length_shorter_than_marker() {
        let mut framer = fixed("AABB", 1);
        framer.feed(&[0xAA, 0xBB, 0xAA, 0xBB]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA], vec![0xAA]]);
        assert_eq!(framer.buffered(), &[0xBB]);
    }

    #[test]
    fn test_buffer_size_limit_exceeded() {
        let mut framer = fixed("AABB", 4).with_max_buffer_size(16);
        framer.feed(&[0x00; 17]);

        // One byte short of a marker is kept in case the marker straddles reads.
        assert_eq!(framer.buffered(), &[0x00]);
        assert_eq!(framer.packets_available(), 0);

        framer.feed(&[0xAA, 0xBB, 0x01, 0x02]);
        assert_eq!(framer.packets_available(), 1);
    }

    #[test]
    fn test_overflow_keeps_partial_marker() {
        let mut framer = fixed("AABB", 4).with_max_buffer_size(16);
        let mut noise = vec![0x00; 16];
        noise.push(0xAA);
        framer.feed(&noise);
        assert_eq!(framer.buffered(), &[0xAA]);

        framer.feed(&[0xBB, 0x01, 0x02]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0x01, 0x02]]);
    }

    #[test]
    fn test_overflow_with_long_marker() {
        let mut framer = fixed("AABBCC", 5).with_max_buffer_size(8);
        framer.feed(&[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0xAA, 0xBB]);
        assert_eq!(framer.buffered(), &[0xAA, 0xBB]);

        framer.feed(&[0xCC, 0x09, 0x0A]);
        assert_eq!(collect(&mut framer), vec![vec![0xAA, 0xBB, 0xCC, 0x09, 0x0A]]);
    }

    #[test]
    fn test_zero_fixed_length_is_unbounded() {
        let descriptor = PacketDescriptor {
            use_framing: true,
            start_marker: Some("AABB".to_string()),
            fixed_length: Some(0),
        };
        let mut framer = StreamFramer::new(descriptor).unwrap();
        assert_eq!(framer.descriptor().fixed_length, None);

        framer.feed(&[0x01, 0xAA, 0xBB, 0x02, 0xAA, 0xBB]);
        assert_eq!(
            collect(&mut framer),
            vec![vec![0xAA, 0xBB, 0x02, 0xAA, 0xBB]]
        );
        assert_eq!(framer.buffered_len(), 0);
    }

    #[test]
    fn test_clear_resets_framer() {
        let mut framer = fixed("AABB", 4);
        framer.feed(&[0xAA, 0xBB, 0x01, 0x02, 0xAA]);
        framer.clear();
        framer.clear();

        assert_eq!(framer.packets_available(), 0);
        assert_eq!(framer.buffered_len(), 0);

        framer.feed(&[0xAA, 0xBB, 0x03, 0x04]);
        assert_eq!(framer.packets_available(), 1);
    }

    #[test]
    fn test_drain_packets_size_hint() {
        let mut framer = fixed("AA", 2);
        framer.feed(&[0xAA, 0x01, 0xAA, 0x02, 0xAA, 0x03]);

        let mut iter = framer.drain_packets();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.len(), 3);

        let _ = iter.next();
        assert_eq!(iter.len(), 2);
        let _ = iter.next();
        let _ = iter.next();
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_drain_packets_empty() {
        let mut framer = fixed("AA", 2);
        assert_eq!(framer.drain_packets().count(), 0);
    }
}
