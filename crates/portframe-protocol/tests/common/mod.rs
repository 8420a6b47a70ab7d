//! Common test utilities for integration tests.
//!
//! This module provides a recording [`PacketHandler`] and packet builders
//! shared across the protocol integration tests.
//!
//! # Test Data Constants
//!
//! - `MARKER` ("AABB") - standard start marker
//! - `MARKER_BYTES` - the same marker as bytes
//! - `PACKET_LEN` (8) - standard fixed packet length

#![allow(dead_code)]

use portframe_core::{
    DispatcherConfig, EventKeyRule, KeyWindow, PacketDescriptor, ValidDataWindow,
};
use portframe_protocol::{PacketData, PacketHandler};

pub const MARKER: &str = "AABB";
pub const MARKER_BYTES: [u8; 2] = [0xAA, 0xBB];
pub const PACKET_LEN: usize = 8;

/// One callback invocation, in order of arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Packet(PacketData),
    Event(String, PacketData),
}

/// Handler that records every callback.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub deliveries: Vec<Delivery>,
}

impl RecordingHandler {
    pub fn packets(&self) -> Vec<&PacketData> {
        self.deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Packet(data) => Some(data),
                Delivery::Event(..) => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<&str> {
        self.deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Event(name, _) => Some(name.as_str()),
                Delivery::Packet(_) => None,
            })
            .collect()
    }

    pub fn packet_bytes(&self) -> Vec<Vec<u8>> {
        self.packets().iter().map(|p| p.as_bytes().to_vec()).collect()
    }
}

impl PacketHandler for RecordingHandler {
    fn on_packet(&mut self, data: &PacketData) {
        self.deliveries.push(Delivery::Packet(data.clone()));
    }

    fn on_event(&mut self, event: &str, data: &PacketData) {
        self.deliveries
            .push(Delivery::Event(event.to_string(), data.clone()));
    }
}

/// Build a packet: marker followed by `body`.
pub fn packet(body: &[u8]) -> Vec<u8> {
    let mut data = MARKER_BYTES.to_vec();
    data.extend_from_slice(body);
    data
}

/// Build a standard fixed-length packet with a command byte and payload.
///
/// Layout: `AA BB <cmd> <payload...>` padded with zeros to `PACKET_LEN`.
///
/// # Panics
///
/// Panics if the payload does not fit.
pub fn standard_packet(cmd: u8, payload: &[u8]) -> Vec<u8> {
    assert!(
        payload.len() <= PACKET_LEN - 3,
        "Test helper: payload too long for standard packet"
    );
    let mut data = packet(&[cmd]);
    data.extend_from_slice(payload);
    data.resize(PACKET_LEN, 0);
    data
}

/// Dispatcher configuration used by most flow tests.
///
/// Valid data skips the marker; the event key is the command byte (first
/// two hex characters of the valid data).
pub fn standard_config() -> DispatcherConfig {
    DispatcherConfig {
        packet: PacketDescriptor::framed(MARKER, Some(PACKET_LEN)),
        valid_data: ValidDataWindow::new(2, None),
        use_event_keys: true,
        event_key: KeyWindow::new(0, Some(2)),
        events: vec![
            EventKeyRule::new("status", "01"),
            EventKeyRule::new("alarm", "0A"),
            EventKeyRule::new("reset", "FF"),
        ],
        ..Default::default()
    }
}
