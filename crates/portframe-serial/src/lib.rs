//! Transport layer for portframe sessions.
//!
//! This crate connects the receive pipeline from `portframe-protocol` to
//! real and simulated byte links.
//!
//! # Transports
//!
//! The [`Transport`] trait is a minimal read/write contract: a read with no
//! data available returns `Ok(0)` and never blocks for long.
//!
//! - [`SerialTransport`]: a `serialport`-backed port. Read timeouts are
//!   reported as empty reads.
//! - [`ThreadedTransport`]: moves blocking reads onto a background thread
//!   and hands chunks to the poller over a single-producer/single-consumer
//!   channel.
//! - [`MockTransport`]: channel-driven test double, controlled through a
//!   [`MockTransportHandle`].
//!
//! # Sessions
//!
//! A [`Session`] binds a transport to a dispatcher and an application
//! handler, and is driven by calling [`Session::poll`] once per tick:
//!
//! ```no_run
//! use portframe_core::DispatcherConfig;
//! use portframe_protocol::{PacketData, PacketHandler};
//! use portframe_serial::{SerialSettings, Session, ThreadedTransport};
//!
//! struct Print;
//!
//! impl PacketHandler for Print {
//!     fn on_packet(&mut self, data: &PacketData) {
//!         println!("{data}");
//!     }
//! }
//!
//! # fn main() -> portframe_serial::Result<()> {
//! let transport = ThreadedTransport::open_serial(&SerialSettings::new("/dev/ttyUSB0"))?;
//! let mut session = Session::new(transport, &DispatcherConfig::default(), Print)?;
//! loop {
//!     session.poll()?;
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! # }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`SerialError`] error type.

mod chunks;
pub mod error;
pub mod mock;
pub mod serial;
pub mod session;
pub mod settings;
pub mod threaded;
pub mod traits;

pub use error::{Result, SerialError};
pub use mock::{MockTransport, MockTransportHandle};
pub use serial::SerialTransport;
pub use session::Session;
pub use settings::{Parity, SerialSettings, StopBits};
pub use threaded::ThreadedTransport;
pub use traits::Transport;
