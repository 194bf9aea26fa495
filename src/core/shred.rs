//! Multi-pass overwrite before unlinking a file.
//!
//! Best effort only: journaling filesystems, SSD wear levelling and
//! snapshots can keep copies of the old blocks.

use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use rand::RngCore;
use tracing::debug;

use crate::errors::Result;

/// Passes used when the caller asks for zero or fewer.
pub const DEFAULT_PASSES: u32 = 3;

fn effective_passes(requested: i64) -> u32 {
    if requested > 0 {
        u32::try_from(requested).unwrap_or(u32::MAX)
    } else {
        DEFAULT_PASSES
    }
}

/// Overwrite `path` `passes` times, then remove it.
///
/// A non-positive pass count falls back to [`DEFAULT_PASSES`]; counts
/// above `u32::MAX` are clamped.  A missing
/// path is an error.
pub fn secure_delete(path: &Path, passes: i64) -> Result<()> {
    let passes = effective_passes(passes);

    let len = fs::metadata(path)?.len();
    if len == 0 {
        fs::remove_file(path)?;
        debug!(path = %path.display(), "removed empty file");
        return Ok(());
    }

    let len = usize::try_from(len).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "file too large to overwrite")
    })?;

    {
        let mut file = OpenOptions::new().write(true).open(path)?;
        for pass in 0..passes {
            file.seek(SeekFrom::Start(0))?;
            file.write_all(&overwrite_pattern(pass, len))?;
            file.sync_all()?;
            debug!(path = %path.display(), pass = pass + 1, of = passes, "overwrite pass");
        }
    }

    fs::remove_file(path)?;
    Ok(())
}

/// The bytes written on pass `pass`: random, zeros, then `0xFF`, repeating.
pub fn overwrite_pattern(pass: u32, len: usize) -> Vec<u8> {
    match pass % 3 {
        0 => {
            let mut buf = vec![0u8; len];
            rand::rng().fill_bytes(&mut buf);
            buf
        }
        1 => vec![0x00; len],
        _ => vec![0xFF; len],
    }
}
