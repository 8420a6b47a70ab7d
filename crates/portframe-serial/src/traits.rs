//! Transport trait definition.
//!
//! A transport is the byte pipe a [`Session`](crate::Session) polls. Reads
//! never block for long: a read with nothing available returns `Ok(0)`,
//! which the dispatcher treats as a no-op.

use crate::error::Result;

/// Byte-oriented duplex link to a device.
pub trait Transport: Send {
    /// Read whatever is available into `buf`.
    ///
    /// Returns the number of bytes read; 0 means nothing is available yet.
    ///
    /// # Errors
    /// Returns `SerialError::Disconnected` once the link is gone.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Human-readable name of the link, used in logs.
    fn name(&self) -> &str;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
