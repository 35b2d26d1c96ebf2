//! Error types for the GPD power supply driver.

pub type Result<T> = std::result::Result<T, GpdError>;

#[derive(Debug, thiserror::Error)]
pub enum GpdError {
    /// The supply did not report a clean error status right after the port was opened.
    #[error("Connection error: device reported '{0}' after open")]
    Connection(String),

    /// The transport returned nothing where a reply was expected.
    #[error("Communication error: {0}")]
    Communication(String),

    /// Out-of-range channel, memory slot or numeric argument. Raised before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The `ERR?` query following `command` returned a non-success status.
    #[error("Protocol error: '{command}' failed with '{status}'")]
    Protocol { command: String, status: String },

    #[error("Invalid response from device: '{0}'")]
    InvalidResponse(String),

    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
