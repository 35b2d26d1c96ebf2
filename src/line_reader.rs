//! Byte-wise reader for replies framed by a one- or two-byte end-of-line marker.
//!
//! The supply terminates replies with `\r` (older firmware) or `\r\n` (newer
//! firmware). [`std::io::BufRead::read_line`] only splits on `\n`, so replies are
//! collected one byte at a time until the trailing bytes match the delimiter.

use std::io::{ErrorKind, Read};

/// End-of-line marker used by the supply's replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Delimiter {
    /// Carriage return only, used by older firmware.
    #[default]
    Cr,
    /// Carriage return followed by line feed, used by newer firmware.
    CrLf,
}

impl Delimiter {
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Cr => b"\r",
            Self::CrLf => b"\r\n",
        }
    }

    /// Remove the delimiter from the end of `line` if it is there.
    pub fn strip(self, line: &[u8]) -> &[u8] {
        line.strip_suffix(self.as_bytes()).unwrap_or(line)
    }
}

/// Read a single reply from `source`, including the trailing `delimiter`.
///
/// Reading stops early when the source has nothing more to give: a read of zero
/// bytes, or a `TimedOut`/`WouldBlock` error. Whatever was collected up to that
/// point is returned, which may be empty.
pub fn read_line<R: Read + ?Sized>(source: &mut R, delimiter: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match source.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                line.push(byte[0]);
                if !delimiter.is_empty() && line.ends_with(delimiter) {
                    break;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => break,
            Err(e) => return Err(e),
        }
    }

    log::trace!("Read line {:?}", String::from_utf8_lossy(&line));
    Ok(line)
}
