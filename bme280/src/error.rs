use thiserror_no_std::Error;

use crate::config::Mode;

/// Driver errors, generic over the bus error `E`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    #[error("bus transfer failed: {0:?}")]
    Bus(E),

    /// Something answered, but it is not a BME280.
    #[error("unexpected chip id {0:#04x}, expected 0x60")]
    ChipId(u8),

    /// The measuring flag did not clear in time.
    #[error("sensor still measuring")]
    Busy,

    #[error("operation not allowed in {0:?} mode")]
    WrongMode(Mode),

    /// The channel needed for this reading has oversampling set to skip.
    #[error("measurement skipped")]
    Skipped,

    #[error("invalid calibration data")]
    Calibration,
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for Error<E> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Bus(_) => defmt::write!(fmt, "bus transfer failed"),
            Self::ChipId(id) => defmt::write!(fmt, "unexpected chip id {=u8:#x}", id),
            Self::Busy => defmt::write!(fmt, "sensor still measuring"),
            Self::WrongMode(mode) => defmt::write!(fmt, "not allowed in {} mode", mode),
            Self::Skipped => defmt::write!(fmt, "measurement skipped"),
            Self::Calibration => defmt::write!(fmt, "invalid calibration data"),
        }
    }
}
