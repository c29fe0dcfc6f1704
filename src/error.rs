use core::convert::Infallible;

use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A strip or buffer was asked for zero pixels, or more than its static capacity.
    #[display("Invalid configuration: pixel count must be between 1 and the buffer capacity")]
    InvalidConfiguration,

    /// The pin is already claimed by another driver, or does not exist on this platform.
    #[display("GPIO {pin} is unavailable")]
    PeripheralUnavailable { pin: u8 },

    /// A pixel index fell outside `0..len`.
    #[display("Pixel index out of range (strip has {len} pixels)")]
    IndexOutOfRange { len: usize },

    /// The strip was already released.
    #[display("LED strip used after release")]
    UseAfterRelease,

    /// The output line failed while a frame was being sent.
    #[display("LED strip transmission failed")]
    Transmission,

    /// A knob or button read failed.
    #[display("Sensor read failed")]
    SensorRead,

    /// The character display did not accept a command.
    #[display("Character display I/O failed")]
    Display,

    /// Display text did not fit its line buffer.
    #[display("Format error")]
    Format,

    // `#[error(not(source))]` tells `derive_more` that `embassy_executor::SpawnError` does not
    // implement `core::error::Error`.
    #[cfg(feature = "board")]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),
}

// Pins on most HALs (embassy-rp included) cannot fail to change level.
impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        Self::Transmission
    }
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::Format
    }
}

#[cfg(feature = "board")]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}
