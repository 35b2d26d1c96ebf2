use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Byte source/sink the driver talks through.
///
/// Implemented for real serial ports; tests plug in an in-memory device.
pub trait Transport: Read + Write {
    fn timeout(&self) -> Duration;

    fn set_timeout(&mut self, timeout: Duration) -> std::io::Result<()>;
}

impl Transport for Box<dyn SerialPort> {
    fn timeout(&self) -> Duration {
        SerialPort::timeout(&**self)
    }

    fn set_timeout(&mut self, timeout: Duration) -> std::io::Result<()> {
        SerialPort::set_timeout(&mut **self, timeout).map_err(std::io::Error::from)
    }
}

/// Serial line settings. The supply only talks 9600-8-N-1 without flow control,
/// so the timeout bounding every single byte read and write is all that varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub timeout: Duration,
}

impl SerialSettings {
    pub const BAUD_RATE: u32 = 9600;

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub const fn baud_rate(&self) -> u32 {
        Self::BAUD_RATE
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(1))
    }
}

/// Open `port` with the fixed framing the supply expects.
pub fn open_serial(port: &str, settings: &SerialSettings) -> Result<Box<dyn SerialPort>> {
    log::debug!(
        "Opening {} at {} baud, timeout {:?}",
        port,
        settings.baud_rate(),
        settings.timeout
    );
    let serial = serialport::new(port, settings.baud_rate())
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(settings.timeout)
        .open()?;
    Ok(serial)
}
