//! Argument checks performed before anything is sent to the supply.

use crate::error::{GpdError, Result};

/// Number of setting-save slots on the front panel.
pub const MEMORY_SLOTS: u8 = 4;

/// Range of channel numbers a supply model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub min: u8,
    pub max: u8,
}

impl ChannelPolicy {
    pub const TWO_CHANNEL: Self = Self { min: 1, max: 2 };
    pub const FOUR_CHANNEL: Self = Self { min: 1, max: 4 };

    pub fn is_valid_channel(&self, channel: u8) -> Result<()> {
        if (self.min..=self.max).contains(&channel) {
            Ok(())
        } else {
            Err(GpdError::Validation(format!(
                "Invalid channel number: {} was given (valid: {}..={})",
                channel, self.min, self.max
            )))
        }
    }
}

impl Default for ChannelPolicy {
    fn default() -> Self {
        Self::TWO_CHANNEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    #[default]
    Gpd3303s,
    Gpd4303s,
}

impl Model {
    pub const fn channels(self) -> ChannelPolicy {
        match self {
            Self::Gpd3303s => ChannelPolicy::TWO_CHANNEL,
            Self::Gpd4303s => ChannelPolicy::FOUR_CHANNEL,
        }
    }
}

pub fn is_valid_memory(slot: u8) -> Result<()> {
    if (1..=MEMORY_SLOTS).contains(&slot) {
        Ok(())
    } else {
        Err(GpdError::Validation(format!(
            "Invalid memory number: {slot} was given"
        )))
    }
}

/// Check that `value` survives the supply's three fractional digits.
///
/// Negative and non-finite values are rejected outright. A value that would
/// lose precision is only reported: a warning is logged and `Ok(false)` returned.
pub fn is_valid_float(value: f64) -> Result<bool> {
    if value < 0.0 || !value.is_finite() {
        return Err(GpdError::Validation(format!(
            "Invalid float value: {value} was given"
        )));
    }

    let mut digits = format!("{value:.6}");
    if let Some(point) = digits.find('.') {
        digits.truncate(point + 4);
    }

    if digits.parse::<f64>().ok() != Some(value) {
        log::warn!("Invalid float value: {value} was given, the supply keeps {digits}");
        return Ok(false);
    }

    Ok(true)
}

/// Check a setpoint before it is formatted into a command.
///
/// Only values that cannot be formatted as a number (NaN, infinities) fail.
/// Anything else that [`is_valid_float`] objects to is logged and sent anyway.
pub(crate) fn check_setpoint(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(GpdError::Validation(format!(
            "Invalid float value: {value} was given"
        )));
    }
    if let Err(e) = is_valid_float(value) {
        log::warn!("{e}");
    }
    Ok(())
}
