use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use portframe_protocol::TrailerChecker;
use portframe_serial::{Session, ThreadedTransport, Transport};
use tracing::info;

use crate::cmd::{MonitorArgs, load_config};
use crate::output::{OutputFormat, Printer};

pub fn run(args: MonitorArgs, format: OutputFormat) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let settings = args.port.settings();

    let transport = ThreadedTransport::open_serial(&settings)
        .with_context(|| format!("failed to open {}", settings.port))?;
    let printer = Printer::new(std::io::stdout().lock(), format);
    let mut session = Session::with_checker(
        transport,
        &config,
        TrailerChecker::new(args.verify.request()),
        printer,
    )?;

    info!(
        "Monitoring {} ({} mode, {} event rules)",
        settings.port,
        config.encoding,
        config.events.len()
    );
    monitor_loop(
        &mut session,
        args.count,
        Duration::from_millis(args.interval_ms),
    )
}

/// Poll until `count` packets were printed or the port goes away.
pub fn monitor_loop<T: Transport, W: Write>(
    session: &mut Session<T, Printer<W>>,
    count: Option<usize>,
    interval: Duration,
) -> Result<()> {
    loop {
        match session.poll() {
            Ok(_) => {}
            Err(e) if e.is_disconnected() => {
                info!("{} closed", session.transport().name());
                break;
            }
            Err(e) => return Err(e).context("read failed"),
        }

        if count.is_some_and(|limit| session.handler().packets() >= limit) {
            break;
        }
        std::thread::sleep(interval);
    }

    let totals = session.totals();
    info!(
        "Framed {}, dispatched {}, rejected {}, out of range {}, events {}",
        totals.framed, totals.dispatched, totals.rejected, totals.out_of_range, totals.events_matched
    );
    Ok(())
}
