//! Poll-driven session over a transport.
//!
//! A [`Session`] owns one transport, one [`Dispatcher`] and the application
//! handler. The caller drives it by calling [`Session::poll`] once per
//! tick; every callback fires synchronously inside that call.

use portframe_core::constants::DEFAULT_READ_CHUNK_SIZE;
use portframe_core::{ChecksumRequest, DispatcherConfig, Encoding};
use portframe_protocol::{
    Dispatcher, PacketChecker, PacketHandler, ProcessReport, append_checksum, bytes_to_hex,
    hex_to_bytes, text_to_bytes,
};
use tracing::{debug, trace};

use crate::error::Result;
use crate::traits::Transport;

/// One device link with its receive pipeline.
///
/// # Examples
///
/// ```
/// use portframe_core::{ChecksumRequest, DispatcherConfig, PacketDescriptor};
/// use portframe_protocol::{PacketData, PacketHandler};
/// use portframe_serial::{MockTransport, Session};
///
/// #[derive(Default)]
/// struct Count(usize);
///
/// impl PacketHandler for Count {
///     fn on_packet(&mut self, _data: &PacketData) {
///         self.0 += 1;
///     }
/// }
///
/// let (transport, handle) = MockTransport::new();
/// let config = DispatcherConfig {
///     packet: PacketDescriptor::framed("AABB", Some(3)),
///     ..Default::default()
/// };
/// let mut session = Session::new(transport, &config, Count::default()).unwrap();
///
/// handle.inject(vec![0xAA, 0xBB, 0x01]).unwrap();
/// session.poll().unwrap();
/// assert_eq!(session.handler().0, 1);
///
/// session.send_hex("06", ChecksumRequest::none()).unwrap();
/// assert_eq!(handle.written_bytes(), vec![0x06]);
/// ```
#[derive(Debug)]
pub struct Session<T: Transport, H: PacketHandler> {
    transport: T,
    dispatcher: Dispatcher,
    handler: H,
    encoding: Encoding,
    read_buf: Vec<u8>,
    totals: ProcessReport,
}

impl<T: Transport, H: PacketHandler> Session<T, H> {
    /// Create a session that accepts every packet.
    ///
    /// # Errors
    /// Returns a protocol error if `config` is invalid.
    pub fn new(transport: T, config: &DispatcherConfig, handler: H) -> Result<Self> {
        Ok(Self::from_dispatcher(
            transport,
            Dispatcher::new(config)?,
            config.encoding,
            handler,
        ))
    }

    /// Create a session with a custom packet checker.
    ///
    /// # Errors
    /// Returns a protocol error if `config` is invalid.
    pub fn with_checker(
        transport: T,
        config: &DispatcherConfig,
        checker: impl PacketChecker + 'static,
        handler: H,
    ) -> Result<Self> {
        Ok(Self::from_dispatcher(
            transport,
            Dispatcher::with_checker(config, checker)?,
            config.encoding,
            handler,
        ))
    }

    fn from_dispatcher(transport: T, dispatcher: Dispatcher, encoding: Encoding, handler: H) -> Self {
        debug!("Session on {} in {} mode", transport.name(), encoding);
        Self {
            transport,
            dispatcher,
            handler,
            encoding,
            read_buf: vec![0u8; DEFAULT_READ_CHUNK_SIZE],
            totals: ProcessReport::default(),
        }
    }

    /// Set the size of the buffer used for a single read.
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_buf = vec![0u8; size.max(1)];
        self
    }

    /// Perform one transport read and dispatch its contents.
    ///
    /// # Errors
    /// Returns the transport error if the read fails. Packet-level problems
    /// are reported in the returned [`ProcessReport`], never as errors.
    pub fn poll(&mut self) -> Result<ProcessReport> {
        let n = self.transport.read(&mut self.read_buf)?;
        if n == 0 {
            return Ok(ProcessReport::default());
        }

        trace!("Read {} bytes from {}", n, self.transport.name());
        let report = self
            .dispatcher
            .process(self.encoding, &self.read_buf[..n], &mut self.handler);
        self.totals += report;
        Ok(report)
    }

    /// Append the requested trailer to `payload` and write it.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// Returns the transport error if the write fails.
    pub fn send(&mut self, payload: &[u8], checksum: ChecksumRequest) -> Result<usize> {
        let wire = append_checksum(payload, checksum);
        self.transport.write(&wire)?;
        debug!(
            "Sent {} bytes to {}: {}",
            wire.len(),
            self.transport.name(),
            bytes_to_hex(&wire)
        );
        Ok(wire.len())
    }

    /// Send bytes given as hex text.
    ///
    /// # Errors
    /// Returns a protocol error for invalid hex, or the transport error.
    pub fn send_hex(&mut self, text: &str, checksum: ChecksumRequest) -> Result<usize> {
        let payload = hex_to_bytes(text)?;
        self.send(&payload, checksum)
    }

    /// Send text as its UTF-8 bytes.
    ///
    /// # Errors
    /// Returns the transport error if the write fails.
    pub fn send_text(&mut self, text: &str, checksum: ChecksumRequest) -> Result<usize> {
        self.send(&text_to_bytes(text), checksum)
    }

    /// Drop partially received data.
    pub fn reset(&mut self) {
        self.dispatcher.reset();
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Counters accumulated over every poll.
    pub fn totals(&self) -> ProcessReport {
        self.totals
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the session, returning the transport and handler.
    pub fn into_parts(self) -> (T, H) {
        (self.transport, self.handler)
    }
}
