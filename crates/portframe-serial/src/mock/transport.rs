//! Mock transport for testing and development.
//!
//! This module provides a simulated serial link whose inbound bytes are
//! injected programmatically and whose outbound bytes are recorded.

use portframe_protocol::hex_to_bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

use crate::chunks::ChunkReceiver;
use crate::error::{Result, SerialError};
use crate::traits::Transport;

type WriteLog = Arc<Mutex<Vec<Vec<u8>>>>;

/// Mock transport for testing and development.
///
/// Injected chunks become available to `read` in order. A read returns
/// every queued byte that fits into its buffer, so inject between reads to
/// reproduce specific read boundaries.
///
/// # Examples
///
/// ```
/// use portframe_serial::{MockTransport, Transport};
///
/// let (mut transport, handle) = MockTransport::new();
///
/// handle.inject(vec![0xAA, 0xBB, 0x01]).unwrap();
/// let mut buf = [0u8; 16];
/// assert_eq!(transport.read(&mut buf).unwrap(), 3);
///
/// transport.write(&[0x06]).unwrap();
/// assert_eq!(handle.written_bytes(), vec![0x06]);
/// ```
#[derive(Debug)]
pub struct MockTransport {
    inbound: ChunkReceiver,

    written: WriteLog,

    connected: Arc<AtomicBool>,

    name: String,
}

impl MockTransport {
    /// Create a new mock transport with the default name.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle injects inbound data and inspects written data.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("mock")
    }

    /// Create a new mock transport with a custom name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let written = WriteLog::default();
        let connected = Arc::new(AtomicBool::new(true));
        let name = name.into();

        let transport = Self {
            inbound: ChunkReceiver::new(inbound_rx),
            written: Arc::clone(&written),
            connected: Arc::clone(&connected),
            name: name.clone(),
        };

        let handle = MockTransportHandle {
            inbound_tx,
            written,
            connected,
            name,
        };

        (transport, handle)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(SerialError::disconnected(&self.name))
        }
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_connected()?;
        self.inbound.read(buf, &self.name)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bytes.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle for controlling a mock transport.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    inbound_tx: mpsc::UnboundedSender<Vec<u8>>,

    written: WriteLog,

    connected: Arc<AtomicBool>,

    name: String,
}

impl MockTransportHandle {
    /// Make `bytes` available to the next read.
    ///
    /// # Errors
    /// Returns `SerialError::Disconnected` if the transport has been dropped.
    pub fn inject(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.inbound_tx
            .send(bytes.into())
            .map_err(|_| SerialError::disconnected(&self.name))
    }

    /// Inject bytes given as hex text.
    ///
    /// # Errors
    /// Returns a protocol error for invalid hex.
    pub fn inject_hex(&self, text: &str) -> Result<()> {
        self.inject(hex_to_bytes(text)?)
    }

    /// Every write in order, one entry per call.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All written bytes concatenated.
    pub fn written_bytes(&self) -> Vec<u8> {
        self.written().concat()
    }

    pub fn clear_written(&self) {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Simulate the device being unplugged.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
