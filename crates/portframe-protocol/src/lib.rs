//! Packet framing, checksum trailers and keyed dispatch for byte streams
//! without framing guarantees.
//!
//! # Modules
//!
//! - [`hex`]: hex text and plain text conversions
//! - [`checksum`]: CRC16, XOR and SUM trailers
//! - [`checker`]: pluggable packet integrity checks
//! - [`framer`]: reassembly of marker-delimited packets
//! - [`router`]: case-insensitive event key lookup
//! - [`dispatcher`]: the receive pipeline tying the above together
//! - [`codec`]: `tokio_util` codec over the framer and checksum codec

pub mod checker;
pub mod checksum;
pub mod codec;
pub mod dispatcher;
pub mod framer;
pub mod hex;
pub mod router;

pub use checker::{AcceptAll, PacketChecker, TrailerChecker};
pub use checksum::append_checksum;
pub use codec::{OutboundPacket, PacketCodec};
pub use dispatcher::{Dispatcher, PacketData, PacketHandler, ProcessReport};
pub use framer::{DrainPackets, StreamFramer};
pub use hex::{bytes_to_hex, bytes_to_text, hex_to_bytes, text_to_bytes};
pub use router::EventRouter;
