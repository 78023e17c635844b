//! Error definitions for the charger core and its peripheral drivers.

use crate::data_types::ChargerState;

/// Failures reported by the INA219/MCP4726 drivers and the `Vreg` regulator.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum DeviceError<I2cError> {
    /// Underlying I2C transaction failed.
    I2c(I2cError),
    /// Regulator enable pin could not be driven.
    Pin(embedded_hal::digital::ErrorKind),
    /// Device did not answer the presence probe.
    NotResponding,
    /// Provided parameter was outside datasheet limits.
    OutOfRange,
}

impl<I2cError: core::fmt::Debug> core::fmt::Display for DeviceError<I2cError> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceError::I2c(e) => write!(f, "I2C error: {:?}", e),
            DeviceError::Pin(kind) => write!(f, "enable pin error: {:?}", kind),
            DeviceError::NotResponding => write!(f, "device not responding"),
            DeviceError::OutOfRange => write!(f, "parameter out of range"),
        }
    }
}

/// Charger-level errors.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// Every slot of the alarm pool is already taken.
    AlarmPoolExhausted,
    /// A charge cycle was used before `init()` registered its timer.
    NotInitialized,
    /// A regulator, battery or display operation failed.
    Hardware,
    /// The supervisor reached a state it cannot run; it stays halted.
    InvalidState(ChargerState),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::AlarmPoolExhausted => write!(f, "no alarm slots available"),
            Error::NotInitialized => write!(f, "charge cycle not initialized"),
            Error::Hardware => write!(f, "hardware access failed"),
            Error::InvalidState(state) => write!(f, "invalid charger state '{}'", state),
        }
    }
}
