use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use portframe_core::ChecksumRequest;
use portframe_protocol::PacketHandler;
use portframe_serial::{SerialTransport, Session, Transport};
use tracing::info;

use crate::cmd::{PayloadArgs, SendArgs, load_config};
use crate::output::{OutputFormat, Printer};

const REPLY_POLL_INTERVAL: Duration = Duration::from_millis(5);

pub fn run(args: SendArgs, format: OutputFormat) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let settings = args.port.settings();

    let transport = SerialTransport::open(&settings)
        .with_context(|| format!("failed to open {}", settings.port))?;
    let printer = Printer::new(std::io::stdout().lock(), format);
    let mut session = Session::new(transport, &config, printer)?;

    let written = send_payload(&mut session, &args.payload, args.checksum.request())?;
    info!("Sent {} bytes to {}", written, settings.port);

    if let Some(wait_ms) = args.wait_ms {
        collect_replies(&mut session, Duration::from_millis(wait_ms))?;
    }
    Ok(())
}

/// Write the payload selected on the command line.
pub fn send_payload<T: Transport, H: PacketHandler>(
    session: &mut Session<T, H>,
    payload: &PayloadArgs,
    checksum: ChecksumRequest,
) -> Result<usize> {
    let written = match (&payload.hex, &payload.text) {
        (Some(hex), _) => session.send_hex(hex, checksum),
        (None, Some(text)) => session.send_text(text, checksum),
        (None, None) => bail!("either --hex or --text is required"),
    };
    written.context("send failed")
}

fn collect_replies<T: Transport, W: Write>(
    session: &mut Session<T, Printer<W>>,
    wait: Duration,
) -> Result<()> {
    let deadline = Instant::now() + wait;
    while Instant::now() < deadline {
        match session.poll() {
            Ok(_) => {}
            Err(e) if e.is_disconnected() => break,
            Err(e) => return Err(e).context("read failed"),
        }
        std::thread::sleep(REPLY_POLL_INTERVAL);
    }
    info!("Received {} replies", session.handler().packets());
    Ok(())
}
