//! # GPD PSU
//!
//! A Rust library for controlling GW Instek GPD-3303S and GPD-4303S bench power
//! supplies over their serial (USB CDC) interface.
//!
//! The supply speaks a line-oriented ASCII protocol: commands end with `\n`,
//! replies end with `\r` on older firmware and `\r\n` on newer firmware. The
//! driver detects which one when it connects.
//!
//! ## Features
//!
//! - **Typed API**: voltage and current settings, output readback, tracking
//!   modes, output and beeper switches, memory slots, identification
//! - **Checked transactions**: every command is followed by an `ERR?` query, and
//!   commands the supply did not recognise are sent again (up to 20 times)
//! - **Model aware**: channel numbers are validated against the model's range
//!   before anything goes over the wire
//! - **Transport agnostic**: anything implementing [`Transport`] works, real
//!   ports are opened through `serialport`
//!
//! ## Examples
//!
//! ```rust,no_run
//! use gpd_psu::{Model, PowerSupply, SerialSettings};
//!
//! let mut psu = PowerSupply::open("/dev/ttyUSB0", &SerialSettings::default(), Model::Gpd3303s)?;
//! println!("Connected to {}", psu.get_identification()?);
//!
//! psu.set_voltage(1, 5.0)?;
//! psu.set_current(1, 0.25)?;
//! psu.enable_output(true)?;
//!
//! println!("CH1: {} V, {} A", psu.get_voltage_output(1)?, psu.get_current_output(1)?);
//! psu.close();
//! # Ok::<(), gpd_psu::GpdError>(())
//! ```
//!
//! ### Four channel model
//!
//! ```rust,no_run
//! use gpd_psu::{Model, PowerSupply, SerialSettings, TrackingMode};
//! use std::time::Duration;
//!
//! let settings = SerialSettings::with_timeout(Duration::from_millis(500));
//! let mut psu = PowerSupply::open("/dev/ttyUSB0", &settings, Model::Gpd4303s)?;
//! psu.select_tracking_mode(TrackingMode::Independent)?;
//! psu.set_voltage(3, 3.3)?;
//! # Ok::<(), gpd_psu::GpdError>(())
//! ```

pub mod error;
pub mod line_reader;
pub mod power_supply;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod mock_port;

pub use error::{GpdError, Result};

pub use line_reader::Delimiter;

pub use power_supply::{ErrorStatus, PowerSupply, TrackingMode};

pub use transport::{SerialSettings, Transport};

pub use validation::{is_valid_float, is_valid_memory, ChannelPolicy, Model};
