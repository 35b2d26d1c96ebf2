//! In-memory stand-in for a serial port with a scripted supply behind it.
//!
//! Every line written to the port (terminated by `\n`) is handed to the device
//! closure, and whatever the closure returns is queued for reading.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use crate::transport::Transport;

type Device = Box<dyn FnMut(&str) -> Vec<u8> + Send>;

pub struct MockPort {
    device: Device,
    /// Bytes waiting to be read by the driver
    pending: VecDeque<u8>,
    /// Partial command line not yet terminated by `\n`
    line: Vec<u8>,
    /// Every complete command received, without the trailing `\n`
    commands: Vec<String>,
    timeout: Duration,
    /// Every timeout applied through `set_timeout`, in order
    timeout_history: Vec<Duration>,
}

impl MockPort {
    pub fn new(device: impl FnMut(&str) -> Vec<u8> + Send + 'static) -> Self {
        Self {
            device: Box::new(device),
            pending: VecDeque::new(),
            line: Vec::new(),
            commands: Vec::new(),
            timeout: Duration::from_secs(1),
            timeout_history: Vec::new(),
        }
    }

    /// A supply that answers `ERR?` with `No Error.` and `reply` to everything else.
    pub fn healthy(eol: &'static str, reply: impl Fn(&str) -> String + Send + 'static) -> Self {
        Self::new(move |command| {
            if command == "ERR?" {
                format!("No Error.{eol}").into_bytes()
            } else {
                reply(command).into_bytes()
            }
        })
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn count(&self, command: &str) -> usize {
        self.commands.iter().filter(|c| *c == command).count()
    }

    pub fn timeout_history(&self) -> &[Duration] {
        &self.timeout_history
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.pending.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            None => Err(std::io::Error::new(ErrorKind::TimedOut, "mock read timed out")),
        }
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for &byte in buf {
            if byte == b'\n' {
                let command = String::from_utf8_lossy(&self.line).into_owned();
                self.line.clear();
                let reply = (self.device)(&command);
                self.pending.extend(reply);
                self.commands.push(command);
            } else {
                self.line.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for MockPort {
    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        self.timeout = timeout;
        self.timeout_history.push(timeout);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_commands_and_queues_replies() {
        let mut mock = MockPort::healthy("\r", |_| "GW INSTEK\r".to_string());
        mock.write_all(b"*IDN?\nERR?\n").unwrap();

        assert_eq!(mock.commands(), ["*IDN?", "ERR?"]);
        let mut reply = Vec::new();
        let mut byte = [0u8; 1];
        while mock.read(&mut byte).is_ok() {
            reply.push(byte[0]);
        }
        assert_eq!(reply, b"GW INSTEK\rNo Error.\r");
    }

    #[test]
    fn test_partial_line_is_not_a_command() {
        let mut mock = MockPort::healthy("\r", |_| String::new());
        mock.write_all(b"VSET1").unwrap();
        assert!(mock.commands().is_empty());
        mock.write_all(b":1.000\n").unwrap();
        assert_eq!(mock.count("VSET1:1.000"), 1);
    }

    #[test]
    fn test_empty_read_times_out() {
        let mut mock = MockPort::new(|_| Vec::new());
        let mut byte = [0u8; 1];
        let err = mock.read(&mut byte).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimedOut);
    }
}
