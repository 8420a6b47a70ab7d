use anyhow::{Context, Result, bail};
use portframe_protocol::checksum::verify_trailer;
use portframe_protocol::{append_checksum, bytes_to_hex, hex_to_bytes};

use crate::cmd::ChecksumCmdArgs;

pub fn run(args: ChecksumCmdArgs) -> Result<()> {
    println!("{}", compute(&args)?);
    Ok(())
}

/// Trailer-appended payload as hex, or `valid` in verify mode.
pub fn compute(args: &ChecksumCmdArgs) -> Result<String> {
    let bytes = hex_to_bytes(&args.hex).context("invalid --hex")?;
    let request = args.checksum.request();

    if args.verify {
        if !verify_trailer(&bytes, request) {
            bail!(
                "{} trailer of {} bytes does not match",
                request.kind,
                request.trailer_len
            );
        }
        return Ok("valid".to_string());
    }

    Ok(bytes_to_hex(&append_checksum(&bytes, request)))
}
