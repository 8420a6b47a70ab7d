//! Background reader for blocking transports.
//!
//! # Architecture
//!
//! ```text
//! reader thread: Transport::read ─> mpsc (SPSC, unbounded) ─┐
//!                                                           v
//! poll loop:     ThreadedTransport::read ─> Dispatcher ─> handler
//!                ThreadedTransport::write ─> writer Transport
//! ```
//!
//! The reader thread owns the reading transport exclusively. The poll side
//! only ever sees whole chunks in arrival order, so bytes handed to the
//! framer are never torn or reordered.

use portframe_core::constants::{DEFAULT_READ_CHUNK_SIZE, READER_IDLE_BACKOFF_MS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use crate::chunks::ChunkReceiver;
use crate::error::Result;
use crate::serial::SerialTransport;
use crate::settings::SerialSettings;
use crate::traits::Transport;

/// Transport whose reads happen on a dedicated thread.
#[derive(Debug)]
pub struct ThreadedTransport<W: Transport> {
    inbound: ChunkReceiver,
    writer: W,
    stop: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    name: String,
}

impl ThreadedTransport<SerialTransport> {
    /// Open a serial port and start reading it in the background.
    ///
    /// # Errors
    /// Returns an error if the port cannot be opened or cloned, or the
    /// reader thread cannot be spawned.
    pub fn open_serial(settings: &SerialSettings) -> Result<Self> {
        let reader = SerialTransport::open(settings)?;
        let writer = reader.try_clone()?;
        Self::spawn(reader, writer)
    }
}

impl<W: Transport> ThreadedTransport<W> {
    /// Move `reader` onto a background thread; writes go to `writer`.
    ///
    /// # Errors
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn<R: Transport + 'static>(reader: R, writer: W) -> Result<Self> {
        let name = writer.name().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));

        let handle = std::thread::Builder::new()
            .name(format!("portframe-reader-{name}"))
            .spawn({
                let stop = Arc::clone(&stop);
                move || read_loop(reader, tx, stop)
            })?;

        info!("Started background reader for {}", name);

        Ok(Self {
            inbound: ChunkReceiver::new(rx),
            writer,
            stop,
            reader: Some(handle),
            name,
        })
    }

    /// Whether the reader thread is still running.
    pub fn is_running(&self) -> bool {
        self.reader.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the reader thread and wait for it to exit.
    ///
    /// Chunks already received stay readable.
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.reader.take() {
            if handle.join().is_err() {
                warn!("Background reader for {} panicked", self.name);
            } else {
                debug!("Background reader for {} stopped", self.name);
            }
        }
    }
}

impl<W: Transport> Transport for ThreadedTransport<W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.inbound.read(buf, &self.name)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write(bytes)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<W: Transport> Drop for ThreadedTransport<W> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_loop<R: Transport>(
    mut reader: R,
    tx: mpsc::UnboundedSender<Vec<u8>>,
    stop: Arc<AtomicBool>,
) {
    let mut buf = vec![0u8; DEFAULT_READ_CHUNK_SIZE];
    let idle = Duration::from_millis(READER_IDLE_BACKOFF_MS);

    while !stop.load(Ordering::Acquire) {
        match reader.read(&mut buf) {
            Ok(0) => std::thread::sleep(idle),
            Ok(n) => {
                trace!("Reader thread received {} bytes from {}", n, reader.name());
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Reader thread for {} stopped: {}", reader.name(), e);
                break;
            }
        }
    }
}
