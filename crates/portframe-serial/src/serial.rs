//! `serialport`-backed transport.

use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use tracing::{debug, info};

use crate::error::{Result, SerialError};
use crate::settings::SerialSettings;
use crate::traits::Transport;

/// Transport over a real serial port.
///
/// Reads block for at most the configured read timeout. A timeout is
/// reported as an empty read.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open the port described by `settings`.
    ///
    /// # Errors
    /// Returns a configuration error for invalid settings and
    /// `SerialError::Open` if the device cannot be opened.
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port = settings
            .builder()?
            .open()
            .map_err(|e| SerialError::open(&settings.port, e.to_string()))?;

        info!(
            "Opened {} at {} baud ({} data bits, parity {:?}, stop bits {:?})",
            settings.port,
            settings.baud_rate,
            settings.data_bits,
            settings.parity,
            settings.stop_bits
        );

        Ok(Self {
            port,
            name: settings.port.clone(),
        })
    }

    /// Second handle to the same port, for split reader/writer use.
    ///
    /// # Errors
    /// Returns the driver error if the handle cannot be duplicated.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            port: self.port.try_clone()?,
            name: self.name.clone(),
        })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_idle(e.kind()) => Ok(0),
            Err(e) if is_gone(e.kind()) => {
                debug!("Read from {} failed: {}", self.name, e);
                Err(SerialError::disconnected(&self.name))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn is_idle(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

fn is_gone(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionAborted
    )
}
