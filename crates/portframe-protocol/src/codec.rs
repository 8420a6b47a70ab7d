//! Tokio codec for framed packet streams.
//!
//! This module provides a Tokio-compatible codec so the framer and the
//! checksum codec can be used with `tokio_util::codec::Framed` over any
//! `AsyncRead + AsyncWrite` byte stream.
//!
//! # Architecture
//!
//! ```text
//! Byte stream -> Decoder (StreamFramer) -> Bytes (one framed packet)
//! OutboundPacket -> Encoder (checksum trailer) -> Byte stream
//! ```
//!
//! The decoder yields raw framed packets. Checking, windowing and event
//! routing stay with the [`Dispatcher`](crate::Dispatcher).
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use portframe_core::{ChecksumKind, ChecksumRequest, PacketDescriptor};
//! use portframe_protocol::{OutboundPacket, PacketCodec};
//! use tokio_util::codec::Framed;
//!
//! # async fn example(stream: tokio::io::DuplexStream) -> portframe_core::Result<()> {
//! let codec = PacketCodec::new(PacketDescriptor::framed("AABB", Some(6)))?;
//! let mut framed = Framed::new(stream, codec);
//!
//! let request = ChecksumRequest::new(ChecksumKind::Crc16, 2);
//! framed.send(OutboundPacket::new(vec![0xAA, 0xBB, 0x01, 0x02], request)).await?;
//!
//! if let Some(Ok(packet)) = framed.next().await {
//!     println!("Received {} bytes", packet.len());
//! }
//! # Ok(())
//! # }
//! ```

use bytes::{Bytes, BytesMut};
use portframe_core::constants::DEFAULT_MAX_FRAME_SIZE;
use portframe_core::{ChecksumRequest, Error, PacketDescriptor, Result};
use tokio_util::codec::{Decoder, Encoder};

use crate::checksum::append_checksum;
use crate::framer::StreamFramer;

/// Payload to transmit together with its trailer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundPacket {
    pub payload: Bytes,
    pub checksum: ChecksumRequest,
}

impl OutboundPacket {
    pub fn new(payload: impl Into<Bytes>, checksum: ChecksumRequest) -> Self {
        Self {
            payload: payload.into(),
            checksum,
        }
    }

    /// Packet sent without a trailer.
    pub fn plain(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, ChecksumRequest::none())
    }

    /// Bytes as they go on the wire.
    pub fn to_wire(&self) -> Bytes {
        append_checksum(&self.payload, self.checksum)
    }
}

/// Tokio codec wrapping a [`StreamFramer`].
#[derive(Debug)]
pub struct PacketCodec {
    framer: StreamFramer,

    /// Maximum size of a decoded or encoded packet.
    max_frame_size: usize,
}

impl PacketCodec {
    /// Create a codec for `descriptor` with the default frame size limit.
    ///
    /// # Errors
    /// Returns `Error::InvalidHexDigit` if the start marker is not valid hex.
    pub fn new(descriptor: PacketDescriptor) -> Result<Self> {
        Ok(Self {
            framer: StreamFramer::new(descriptor)?,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        })
    }

    /// Set the frame size limit.
    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }
}

impl Decoder for PacketCodec {
    type Item = Bytes;
    type Error = Error;

    /// Move all of `src` into the framer and return the next packet.
    ///
    /// # Errors
    /// Returns `Error::FrameTooLarge` if a packet exceeds `max_frame_size`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if !src.is_empty() {
            // The framer keeps its own buffer; src is fully consumed.
            self.framer.feed(src);
            src.clear();
        }

        match self.framer.next_packet() {
            Some(packet) if packet.len() > self.max_frame_size => Err(Error::FrameTooLarge {
                size: packet.len(),
                max: self.max_frame_size,
            }),
            other => Ok(other),
        }
    }
}

impl Encoder<OutboundPacket> for PacketCodec {
    type Error = Error;

    /// Append the requested trailer and write the packet to `dst`.
    ///
    /// # Errors
    /// Returns `Error::FrameTooLarge` if the packet with its trailer exceeds
    /// `max_frame_size`.
    fn encode(&mut self, item: OutboundPacket, dst: &mut BytesMut) -> Result<()> {
        let wire = item.to_wire();
        if wire.len() > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                size: wire.len(),
                max: self.max_frame_size,
            });
        }
        dst.extend_from_slice(&wire);
        Ok(())
    }
}
