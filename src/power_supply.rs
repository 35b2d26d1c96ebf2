use serialport::SerialPort;
use std::fmt;
use std::io::ErrorKind;
use std::time::Duration;

use crate::error::{GpdError, Result};
use crate::line_reader::{read_line, Delimiter};
use crate::transport::{open_serial, SerialSettings, Transport};
use crate::validation::{check_setpoint, is_valid_memory, ChannelPolicy, Model};

const NO_ERROR: &str = "No Error.";
const UNDEFINED_HEADER: &str = "Undefined header.";

/// Status reported by the supply in reply to `ERR?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorStatus {
    NoError,
    /// The supply did not recognise the last command. Usually goes away on resend.
    UndefinedHeader,
    Other(String),
}

impl ErrorStatus {
    fn from_reply(reply: &[u8]) -> Self {
        match reply {
            r if r == NO_ERROR.as_bytes() => Self::NoError,
            r if r == UNDEFINED_HEADER.as_bytes() => Self::UndefinedHeader,
            r => Self::Other(String::from_utf8_lossy(r).into_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoError => NO_ERROR,
            Self::UndefinedHeader => UNDEFINED_HEADER,
            Self::Other(status) => status,
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the outputs are coupled, selected with `TRACK<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    Independent,
    Series,
    Parallel,
}

impl TrackingMode {
    pub const fn code(self) -> u8 {
        match self {
            Self::Independent => 0,
            Self::Series => 1,
            Self::Parallel => 2,
        }
    }
}

/// Driver for a GW Instek GPD-3303S / GPD-4303S.
///
/// Every command is followed by an `ERR?` query. Commands the supply answers
/// with `Undefined header.` are sent again, up to [`PowerSupply::MAX_ATTEMPTS`] times.
#[derive(Debug)]
pub struct PowerSupply<T: Transport> {
    serial: T,
    delimiter: Delimiter,
    channels: ChannelPolicy,
}

impl PowerSupply<Box<dyn SerialPort>> {
    /// Open `port` and bring the connection up.
    pub fn open(port: &str, settings: &SerialSettings, model: Model) -> Result<Self> {
        log::debug!("Connecting to {:?} on port {}", model, port);
        let serial = open_serial(port, settings)?;
        Self::connect(serial, model.channels())
    }
}

impl<T: Transport> PowerSupply<T> {
    pub const MAX_ATTEMPTS: usize = 20;
    const STATUS_LINES: usize = 3;
    const HELP_LINES: usize = 19;
    const DETECT_TIMEOUT: Duration = Duration::from_millis(100);

    /// Bring up a connection over an already opened transport.
    ///
    /// The supply must report a clean error status. Afterwards a leftover line
    /// feed tells a `\r\n` firmware apart from a `\r` one.
    pub fn connect(serial: T, channels: ChannelPolicy) -> Result<Self> {
        let mut psu = Self {
            serial,
            delimiter: Delimiter::default(),
            channels,
        };

        log::debug!("Checking error status");
        match psu.query_error()? {
            ErrorStatus::NoError => {}
            status => return Err(GpdError::Connection(status.to_string())),
        }

        psu.detect_delimiter()?;
        Ok(psu)
    }

    fn detect_delimiter(&mut self) -> Result<()> {
        let saved = self.serial.timeout();
        self.serial.set_timeout(Self::DETECT_TIMEOUT)?;

        let mut byte = [0u8; 1];
        let detected = self.serial.read(&mut byte);
        self.serial.set_timeout(saved)?;

        match detected {
            Ok(n) if n > 0 && byte[0] == b'\n' => {
                log::debug!("Trailing line feed seen, replies end with \\r\\n");
                self.delimiter = Delimiter::CrLf;
            }
            Ok(_) => log::debug!("Replies end with \\r"),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                log::debug!("Replies end with \\r");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Release the port.
    pub fn close(self) {
        log::debug!("Closing connection");
    }

    /// Hand back the transport without closing it.
    pub fn into_inner(self) -> T {
        self.serial
    }

    pub fn get_ref(&self) -> &T {
        &self.serial
    }

    /// Override the detected reply delimiter.
    pub fn set_delimiter(&mut self, delimiter: Delimiter) {
        log::debug!("Delimiter set to {:?}", delimiter);
        self.delimiter = delimiter;
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    pub fn channels(&self) -> ChannelPolicy {
        self.channels
    }

    pub fn is_valid_channel(&self, channel: u8) -> Result<()> {
        self.channels.is_valid_channel(channel)
    }

    fn write_command(&mut self, command: &str) -> Result<()> {
        log::debug!("> {}", command);
        self.serial.write_all(format!("{command}\n").as_bytes())?;
        self.serial.flush()?;
        Ok(())
    }

    /// Next reply with its delimiter removed.
    fn read_reply(&mut self) -> Result<Vec<u8>> {
        let line = read_line(&mut self.serial, self.delimiter.as_bytes())?;
        Ok(self.delimiter.strip(&line).to_vec())
    }

    /// Ask the supply for the outcome of the last command (`ERR?`).
    pub fn query_error(&mut self) -> Result<ErrorStatus> {
        self.write_command("ERR?")?;
        let line = read_line(&mut self.serial, self.delimiter.as_bytes())?;
        if line.is_empty() {
            return Err(GpdError::Communication(
                "cannot read error message".to_string(),
            ));
        }
        let status = ErrorStatus::from_reply(self.delimiter.strip(&line));
        log::debug!("< {}", status);
        Ok(status)
    }

    /// Send `command`, read its reply, then check the error status. No retry.
    pub fn transact_once(&mut self, command: &str) -> Result<(Vec<u8>, ErrorStatus)> {
        self.write_command(command)?;
        let reply = self.read_reply()?;
        let status = self.query_error()?;
        Ok((reply, status))
    }

    /// Send `command`, which has no reply, then check the error status. No retry.
    pub fn act_once(&mut self, command: &str) -> Result<ErrorStatus> {
        self.write_command(command)?;
        self.query_error()
    }

    fn retry<R>(
        &mut self,
        command: &str,
        mut attempt: impl FnMut(&mut Self) -> Result<(R, ErrorStatus)>,
    ) -> Result<R> {
        for n in 1..=Self::MAX_ATTEMPTS {
            let (value, status) = attempt(self)?;
            match status {
                ErrorStatus::NoError => return Ok(value),
                ErrorStatus::UndefinedHeader => {
                    log::debug!(
                        "'{}' not recognised (attempt {}/{}), resending",
                        command,
                        n,
                        Self::MAX_ATTEMPTS
                    );
                }
                ErrorStatus::Other(status) => {
                    return Err(GpdError::Protocol {
                        command: command.to_string(),
                        status,
                    })
                }
            }
        }

        Err(GpdError::Protocol {
            command: command.to_string(),
            status: UNDEFINED_HEADER.to_string(),
        })
    }

    /// Send a command that returns a value and give back the reply text.
    pub fn query(&mut self, command: &str) -> Result<String> {
        let reply = self.retry(command, |psu| psu.transact_once(command))?;
        Ok(String::from_utf8(reply)?)
    }

    /// Send a command that returns nothing.
    pub fn send(&mut self, command: &str) -> Result<()> {
        self.retry(command, |psu| Ok(((), psu.act_once(command)?)))
    }

    fn query_measurement(&mut self, command: &str, unit: char) -> Result<f64> {
        let reply = self.query(command)?;
        let value = reply.trim_end_matches(unit).trim().parse::<f64>();
        value.map_err(|_| GpdError::InvalidResponse(reply))
    }

    fn read_block(&mut self, command: &str, count: usize) -> Result<Vec<String>> {
        self.write_command(command)?;

        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            let line = String::from_utf8(self.read_reply()?)?;
            log::info!("{}", line);
            lines.push(line);
        }

        match self.query_error()? {
            ErrorStatus::NoError => Ok(lines),
            status => Err(GpdError::Protocol {
                command: command.to_string(),
                status: status.to_string(),
            }),
        }
    }

    /// Set the current limit of `channel` in amperes (`ISET<X>:<NR2>`).
    pub fn set_current(&mut self, channel: u8, current: f64) -> Result<()> {
        self.is_valid_channel(channel)?;
        check_setpoint(current)?;
        self.send(&format!("ISET{channel}:{current:.3}"))
    }

    /// Current limit of `channel` in amperes (`ISET<X>?`).
    pub fn get_current(&mut self, channel: u8) -> Result<f64> {
        self.is_valid_channel(channel)?;
        self.query_measurement(&format!("ISET{channel}?"), 'A')
    }

    /// Set the output voltage of `channel` in volts (`VSET<X>:<NR2>`).
    pub fn set_voltage(&mut self, channel: u8, voltage: f64) -> Result<()> {
        self.is_valid_channel(channel)?;
        check_setpoint(voltage)?;
        self.send(&format!("VSET{channel}:{voltage:.3}"))
    }

    /// Voltage setting of `channel` in volts (`VSET<X>?`).
    pub fn get_voltage(&mut self, channel: u8) -> Result<f64> {
        self.is_valid_channel(channel)?;
        self.query_measurement(&format!("VSET{channel}?"), 'V')
    }

    /// Measured output current of `channel` (`IOUT<X>?`).
    pub fn get_current_output(&mut self, channel: u8) -> Result<f64> {
        self.is_valid_channel(channel)?;
        self.query_measurement(&format!("IOUT{channel}?"), 'A')
    }

    /// Measured output voltage of `channel` (`VOUT<X>?`).
    pub fn get_voltage_output(&mut self, channel: u8) -> Result<f64> {
        self.is_valid_channel(channel)?;
        self.query_measurement(&format!("VOUT{channel}?"), 'V')
    }

    pub fn select_tracking_mode(&mut self, mode: TrackingMode) -> Result<()> {
        self.send(&format!("TRACK{}", mode.code()))
    }

    pub fn select_independent_mode(&mut self) -> Result<()> {
        self.select_tracking_mode(TrackingMode::Independent)
    }

    pub fn select_tracking_series_mode(&mut self) -> Result<()> {
        self.select_tracking_mode(TrackingMode::Series)
    }

    pub fn select_tracking_parallel_mode(&mut self) -> Result<()> {
        self.select_tracking_mode(TrackingMode::Parallel)
    }

    pub fn enable_beep(&mut self, enable: bool) -> Result<()> {
        self.send(&format!("BEEP{}", u8::from(enable)))
    }

    pub fn enable_output(&mut self, enable: bool) -> Result<()> {
        self.send(&format!("OUT{}", u8::from(enable)))
    }

    /// Identification string (`*IDN?`), e.g. `GW INSTEK,GPD-3303S,SN:...,V2.0`.
    pub fn get_identification(&mut self) -> Result<String> {
        self.query("*IDN?")
    }

    /// Recall the panel settings stored in memory `slot` (`RCL<NR1>`).
    pub fn recall_setting(&mut self, slot: u8) -> Result<String> {
        is_valid_memory(slot)?;
        self.query(&format!("RCL{slot}"))
    }

    /// Store the current panel settings in memory `slot` (`SAV<NR1>`).
    pub fn save_setting(&mut self, slot: u8) -> Result<()> {
        is_valid_memory(slot)?;
        self.send(&format!("SAV{slot}"))
    }

    /// The three status lines reported by `STATUS?`.
    pub fn print_status(&mut self) -> Result<Vec<String>> {
        self.read_block("STATUS?", Self::STATUS_LINES)
    }

    /// The command summary reported by `HELP?`.
    pub fn print_help(&mut self) -> Result<Vec<String>> {
        self.read_block("HELP?", Self::HELP_LINES)
    }
}
