//! Receiving end of a chunk channel with read-sized draining.

use bytes::{Buf, BytesMut};
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::error::{Result, SerialError};

/// Receiver that serves channel chunks through a `read(buf)` interface.
///
/// Chunks larger than the caller's buffer are kept and served by the next
/// read; several small chunks are coalesced into one read.
#[derive(Debug)]
pub(crate) struct ChunkReceiver {
    rx: UnboundedReceiver<Vec<u8>>,
    pending: BytesMut,
}

impl ChunkReceiver {
    pub(crate) fn new(rx: UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            rx,
            pending: BytesMut::new(),
        }
    }

    /// Copy available bytes into `buf` without waiting.
    ///
    /// # Errors
    /// Returns `SerialError::Disconnected` when the sender is gone and
    /// nothing is left to read.
    pub(crate) fn read(&mut self, buf: &mut [u8], port: &str) -> Result<usize> {
        while self.pending.len() < buf.len() {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.pending.is_empty() {
                        return Err(SerialError::disconnected(port));
                    }
                    break;
                }
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}
