//! Blocking `embedded-hal` driver for the Bosch BME280 temperature, pressure
//! and humidity sensor, over I2C or SPI.
//!
//! ```no_run
//! # fn demo<I2C, D, E>(i2c: I2C, delay: D) -> Result<(), bme280::Error<E>>
//! # where
//! #     I2C: embedded_hal::blocking::i2c::WriteRead<Error = E>
//! #         + embedded_hal::blocking::i2c::Write<Error = E>,
//! #     D: embedded_hal::blocking::delay::DelayMs<u32>,
//! #     E: core::fmt::Debug,
//! # {
//! use bme280::{Bme280, Config, I2cBus};
//!
//! let mut sensor = Bme280::new(I2cBus::new(i2c), delay)?;
//! sensor.configure(&Config::WEATHER_MONITORING)?;
//!
//! // sleep mode + forced conversion on demand
//! let m = sensor.read_all_forced()?;
//! let _ = (m.temperature.int, m.pressure.int, m.humidity.int);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub use crate::bme280::{Bme280, Bme280Result};
pub use bus::{Bus, I2cBus, SpiBus, SpiError};
pub use calibration::CalibrationData;
pub use config::{Config, Filter, Mode, Oversampling, StandbyTime};
pub use error::Error;
pub use measurement::{Humidity, Measurement, MeasurementF, Pressure, Temperature};
pub use registers::{I2C_ADDR_SDO_HIGH, I2C_ADDR_SDO_LOW};

pub mod bme280;
pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod config;
mod error;
pub mod measurement;
pub mod registers;
#[cfg(test)]
mod testing;
