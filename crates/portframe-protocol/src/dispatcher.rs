//! Unified receive path: framing, checking, slicing and routing.
//!
//! # Architecture
//!
//! ```text
//! bytes ─> StreamFramer ─> PacketChecker ─> valid-data window ─> EventRouter
//!                                                 │                   │
//!                                                 │                   └─> on_event(name, data)
//!                                                 └─────────────────────> on_packet(data)
//! ```
//!
//! Binary input goes through the framer and may yield zero or more packets
//! per call. Text input is never buffered: each call is one message.
//!
//! Every packet that passes the checker and fits the valid-data window
//! reaches [`PacketHandler::on_packet`] exactly once. When event keys are
//! enabled and the key matches a rule, [`PacketHandler::on_event`] is called
//! exactly once as well, before `on_packet`.

use bytes::Bytes;
use portframe_core::{DispatcherConfig, Encoding, Result, ValidDataWindow};
use std::borrow::Cow;
use std::ops::AddAssign;
use tracing::{debug, warn};

use crate::checker::{AcceptAll, PacketChecker};
use crate::framer::StreamFramer;
use crate::hex::{bytes_to_hex, bytes_to_text};
use crate::router::EventRouter;

/// Application data cut out of a validated packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketData {
    Binary(Bytes),
    Text(String),
}

impl PacketData {
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Binary(_) => Encoding::Binary,
            Self::Text(_) => Encoding::Text,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    /// Form used for event key lookup: hex text for binary data, the text
    /// itself for text data.
    pub fn searchable(&self) -> Cow<'_, str> {
        match self {
            Self::Binary(bytes) => Cow::Owned(bytes_to_hex(bytes)),
            Self::Text(text) => Cow::Borrowed(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl std::fmt::Display for PacketData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary(bytes) => f.write_str(&bytes_to_hex(bytes)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Application callbacks, invoked synchronously from the dispatch call.
pub trait PacketHandler {
    /// Called for every validated packet.
    fn on_packet(&mut self, data: &PacketData);

    /// Called when the packet's key matched a registered event.
    fn on_event(&mut self, _event: &str, _data: &PacketData) {}
}

/// Counters describing one dispatch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Complete packets produced by framing.
    pub framed: usize,

    /// Packets delivered to `on_packet`.
    pub dispatched: usize,

    /// Packets dropped by the checker.
    pub rejected: usize,

    /// Packets dropped because the valid-data window did not fit.
    pub out_of_range: usize,

    /// Packets that also fired a keyed event.
    pub events_matched: usize,
}

impl AddAssign for ProcessReport {
    fn add_assign(&mut self, other: Self) {
        self.framed += other.framed;
        self.dispatched += other.dispatched;
        self.rejected += other.rejected;
        self.out_of_range += other.out_of_range;
        self.events_matched += other.events_matched;
    }
}

/// Receive-side pipeline for one session.
///
/// # Example
///
/// ```
/// use portframe_core::{DispatcherConfig, EventKeyRule, KeyWindow, PacketDescriptor, ValidDataWindow};
/// use portframe_protocol::{Dispatcher, PacketData, PacketHandler};
///
/// #[derive(Default)]
/// struct Events(Vec<String>);
///
/// impl PacketHandler for Events {
///     fn on_packet(&mut self, _data: &PacketData) {}
///
///     fn on_event(&mut self, event: &str, _data: &PacketData) {
///         self.0.push(event.to_string());
///     }
/// }
///
/// let config = DispatcherConfig {
///     packet: PacketDescriptor::framed("AABB", Some(4)),
///     valid_data: ValidDataWindow::new(2, None),
///     use_event_keys: true,
///     event_key: KeyWindow::new(0, Some(2)),
///     events: vec![EventKeyRule::new("ping", "01")],
///     ..Default::default()
/// };
///
/// let mut dispatcher = Dispatcher::new(&config).unwrap();
/// let mut events = Events::default();
/// dispatcher.process_binary(&[0xAA, 0xBB, 0x01, 0x00], &mut events);
/// assert_eq!(events.0, vec!["ping"]);
/// ```
pub struct Dispatcher {
    framer: StreamFramer,
    checker: Box<dyn PacketChecker>,
    binary_window: ValidDataWindow,
    text_window: ValidDataWindow,
    router: EventRouter,
    use_event_keys: bool,
}

impl Dispatcher {
    /// Build a dispatcher that accepts every packet.
    ///
    /// # Errors
    /// Returns a configuration error for an invalid marker, a negative event
    /// key start or duplicate event names.
    pub fn new(config: &DispatcherConfig) -> Result<Self> {
        Self::with_checker(config, AcceptAll)
    }

    /// Build a dispatcher with a custom packet checker.
    ///
    /// # Errors
    /// Same as [`Dispatcher::new`].
    pub fn with_checker(
        config: &DispatcherConfig,
        checker: impl PacketChecker + 'static,
    ) -> Result<Self> {
        Ok(Self {
            framer: StreamFramer::new(config.packet.clone())?,
            checker: Box::new(checker),
            binary_window: config.valid_data,
            text_window: config.text_valid_data,
            router: EventRouter::new(config.event_key, config.events.iter().cloned())?,
            use_event_keys: config.use_event_keys,
        })
    }

    pub fn set_checker(&mut self, checker: impl PacketChecker + 'static) {
        self.checker = Box::new(checker);
    }

    pub fn framer(&self) -> &StreamFramer {
        &self.framer
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Discard any partially received data.
    pub fn reset(&mut self) {
        self.framer.clear();
    }

    /// Process input in the given encoding.
    ///
    /// Text input is decoded as UTF-8, replacing invalid sequences.
    pub fn process<H: PacketHandler + ?Sized>(
        &mut self,
        encoding: Encoding,
        bytes: &[u8],
        handler: &mut H,
    ) -> ProcessReport {
        match encoding {
            Encoding::Binary => self.process_binary(bytes, handler),
            Encoding::Text => {
                if bytes.is_empty() {
                    return ProcessReport::default();
                }
                self.process_text(&bytes_to_text(bytes), handler)
            }
        }
    }

    /// Feed binary input and dispatch every complete packet.
    pub fn process_binary<H: PacketHandler + ?Sized>(
        &mut self,
        bytes: &[u8],
        handler: &mut H,
    ) -> ProcessReport {
        self.framer.feed(bytes);

        let mut report = ProcessReport::default();
        while let Some(packet) = self.framer.next_packet() {
            report.framed += 1;

            if !self.checker.check_binary_packet(&packet) {
                debug!("Checker rejected packet {}", bytes_to_hex(&packet));
                report.rejected += 1;
                continue;
            }

            let range = match self.binary_window.range(packet.len()) {
                Ok(range) => range,
                Err(e) => {
                    warn!("Dropping packet {}: {}", bytes_to_hex(&packet), e);
                    report.out_of_range += 1;
                    continue;
                }
            };

            let data = PacketData::Binary(packet.slice(range));
            self.deliver(&data, handler, &mut report);
        }
        report
    }

    /// Dispatch one text message.
    ///
    /// The valid-data window is applied in characters.
    pub fn process_text<H: PacketHandler + ?Sized>(
        &mut self,
        text: &str,
        handler: &mut H,
    ) -> ProcessReport {
        let mut report = ProcessReport {
            framed: 1,
            ..Default::default()
        };

        if !self.checker.check_text_packet(text) {
            debug!("Checker rejected text packet '{}'", text);
            report.rejected += 1;
            return report;
        }

        let char_count = text.chars().count();
        let slice = match self.text_window.range(char_count) {
            Ok(range) => char_slice(text, range.start, range.end),
            Err(e) => {
                warn!("Dropping text packet '{}': {}", text, e);
                report.out_of_range += 1;
                return report;
            }
        };

        let data = PacketData::Text(slice.to_string());
        self.deliver(&data, handler, &mut report);
        report
    }

    fn deliver<H: PacketHandler + ?Sized>(
        &self,
        data: &PacketData,
        handler: &mut H,
        report: &mut ProcessReport,
    ) {
        if self.use_event_keys && !self.router.is_empty() {
            if let Some(rule) = self.router.route(&data.searchable()) {
                debug!("Dispatching event '{}'", rule.name);
                handler.on_event(&rule.name, data);
                report.events_matched += 1;
            }
        }

        handler.on_packet(data);
        report.dispatched += 1;
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("framer", &self.framer)
            .field("binary_window", &self.binary_window)
            .field("text_window", &self.text_window)
            .field("router", &self.router)
            .field("use_event_keys", &self.use_event_keys)
            .finish_non_exhaustive()
    }
}

/// Slice `text` by character offsets. Offsets must be within bounds.
fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let mut offsets = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()));
    let from = offsets.nth(start).unwrap_or(text.len());
    let to = if end > start {
        offsets.nth(end - start - 1).unwrap_or(text.len())
    } else {
        from
    };
    &text[from..to]
}
