use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Serde adapter for signed configuration lengths.
///
/// Configuration layers express lengths as signed integers where any
/// non-positive value means "to the end". In memory this is `None`.
mod signed_len {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(len) => serializer.serialize_u64(*len as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let value = Option::<i64>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v > 0))
    }
}

/// Wire encoding a dispatcher operates in.
///
/// Binary packets are framed, buffered across reads and keyed by their hex
/// text. Text packets are processed one read at a time with no reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[serde(alias = "hex")]
    Binary,
    #[serde(alias = "ascii")]
    Text,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// Describes how packets are located in the inbound byte stream.
///
/// When framing is disabled (or no marker is configured) every read is one
/// packet. Otherwise packets start at `start_marker` and span
/// `fixed_length` bytes, or run to the end of the buffered data when no
/// length is set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketDescriptor {
    pub use_framing: bool,

    /// Marker as hex digits, e.g. `"AABB"`.
    pub start_marker: Option<String>,

    #[serde(with = "signed_len")]
    pub fixed_length: Option<usize>,
}

impl PacketDescriptor {
    /// Descriptor that treats every read as one packet.
    pub fn unframed() -> Self {
        Self::default()
    }

    /// Descriptor for marker-delimited packets.
    ///
    /// # Examples
    ///
    /// ```
    /// use portframe_core::PacketDescriptor;
    ///
    /// let descriptor = PacketDescriptor::framed("AABB", Some(6));
    /// assert!(descriptor.is_framing_active());
    /// assert_eq!(descriptor.fixed_length, Some(6));
    /// ```
    pub fn framed(start_marker: impl Into<String>, fixed_length: Option<usize>) -> Self {
        Self {
            use_framing: true,
            start_marker: Some(start_marker.into()),
            fixed_length: fixed_length.filter(|&len| len > 0),
        }
    }

    /// Whether marker framing applies. An empty marker disables it.
    pub fn is_framing_active(&self) -> bool {
        self.use_framing
            && self
                .start_marker
                .as_deref()
                .is_some_and(|m| !m.trim().is_empty())
    }
}

/// Offset and optional length of the application data inside a packet.
///
/// Units are bytes for binary packets and characters for text packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidDataWindow {
    pub start: usize,

    #[serde(with = "signed_len")]
    pub length: Option<usize>,
}

impl ValidDataWindow {
    pub fn new(start: usize, length: Option<usize>) -> Self {
        Self {
            start,
            length: length.filter(|&len| len > 0),
        }
    }

    /// Window covering the whole packet.
    pub fn full() -> Self {
        Self::default()
    }

    /// Resolve the window against a packet of `packet_len` units.
    ///
    /// # Errors
    /// Returns `Error::WindowOutOfRange` if the window extends past the packet.
    ///
    /// # Examples
    ///
    /// ```
    /// use portframe_core::ValidDataWindow;
    ///
    /// let window = ValidDataWindow::new(2, Some(3));
    /// assert_eq!(window.range(8).unwrap(), 2..5);
    /// assert!(window.range(4).is_err());
    /// ```
    pub fn range(&self, packet_len: usize) -> Result<Range<usize>> {
        let end = match self.length {
            Some(len) => self.start.checked_add(len),
            None => Some(packet_len),
        };

        match end {
            Some(end) if self.start <= end && end <= packet_len => Ok(self.start..end),
            _ => Err(Error::WindowOutOfRange {
                start: self.start,
                length: self.length,
                packet_len,
            }),
        }
    }
}

/// Location of the event key inside the key-searchable form of a packet.
///
/// `start` is kept signed because it comes straight from configuration;
/// a negative start is rejected when the router is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyWindow {
    pub start: i64,

    #[serde(with = "signed_len")]
    pub length: Option<usize>,
}

impl KeyWindow {
    pub fn new(start: i64, length: Option<usize>) -> Self {
        Self {
            start,
            length: length.filter(|&len| len > 0),
        }
    }
}

/// Maps a literal key to a named event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKeyRule {
    pub name: String,
    pub key: String,
}

impl EventKeyRule {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

/// Outbound trailer algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumKind {
    #[default]
    None,
    Crc16,
    Xor,
    Sum,
}

impl ChecksumKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Crc16 => "crc16",
            Self::Xor => "xor",
            Self::Sum => "sum",
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChecksumKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "crc16" | "crc" => Ok(Self::Crc16),
            "xor" => Ok(Self::Xor),
            "sum" => Ok(Self::Sum),
            other => Err(Error::config(format!("Unknown checksum kind: {other}"))),
        }
    }
}

/// Parameters for one outbound trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumRequest {
    pub kind: ChecksumKind,
    pub trailer_len: usize,
}

impl ChecksumRequest {
    pub fn new(kind: ChecksumKind, trailer_len: usize) -> Self {
        Self { kind, trailer_len }
    }

    /// Request that leaves the payload untouched.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether applying this request leaves the payload unmodified.
    pub fn is_noop(&self) -> bool {
        self.kind == ChecksumKind::None || self.trailer_len == 0
    }
}

/// Complete receive-side configuration of a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub encoding: Encoding,

    pub packet: PacketDescriptor,

    /// Window applied to binary packets (byte units).
    pub valid_data: ValidDataWindow,

    /// Window applied to text packets (character units).
    pub text_valid_data: ValidDataWindow,

    pub use_event_keys: bool,

    pub event_key: KeyWindow,

    /// Ordered event rules; the first matching key wins.
    pub events: Vec<EventKeyRule>,
}
