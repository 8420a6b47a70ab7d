use std::io::Write;

use clap::ValueEnum;
use portframe_protocol::{PacketData, PacketHandler};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<&'a str>,
    encoding: String,
    size: usize,
    data: String,
}

/// Render one callback as a single output line.
pub fn format_line(event: Option<&str>, data: &PacketData, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => match event {
            Some(name) => format!("event  {name:<12} {data}"),
            None => format!("packet {:<12} {data}", data.as_bytes().len()),
        },
        OutputFormat::Json => {
            let out = PacketOutput {
                kind: if event.is_some() { "event" } else { "packet" },
                event,
                encoding: data.encoding().to_string(),
                size: data.as_bytes().len(),
                data: data.to_string(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Handler that writes every packet and event to `out`.
pub struct Printer<W: Write> {
    out: W,
    format: OutputFormat,
    packets: usize,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            packets: 0,
        }
    }

    /// Packets printed so far.
    pub fn packets(&self) -> usize {
        self.packets
    }

    fn emit(&mut self, event: Option<&str>, data: &PacketData) {
        let line = format_line(event, data, self.format);
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!("Failed to write output: {}", e);
        }
    }
}

impl<W: Write> PacketHandler for Printer<W> {
    fn on_packet(&mut self, data: &PacketData) {
        self.emit(None, data);
        self.packets += 1;
    }

    fn on_event(&mut self, event: &str, data: &PacketData) {
        self.emit(Some(event), data);
    }
}
