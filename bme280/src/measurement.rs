//! Raw ADC parsing and the result types handed back to callers.

use crate::registers::{SKIPPED_16BIT, SKIPPED_20BIT};

/// Uncompensated ADC words; `None` where the channel was skipped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawData {
    pub pressure: Option<u32>,
    pub temperature: Option<u32>,
    pub humidity: Option<u32>,
}

/// 20-bit value from msb, lsb and the upper nibble of xlsb.
pub fn parse_20bit(bytes: &[u8]) -> Option<u32> {
    let value = ((bytes[0] as u32) << 12) | ((bytes[1] as u32) << 4) | ((bytes[2] as u32) >> 4);
    (value != SKIPPED_20BIT).then_some(value)
}

pub fn parse_16bit(bytes: &[u8]) -> Option<u32> {
    let value = ((bytes[0] as u32) << 8) | bytes[1] as u32;
    (value != SKIPPED_16BIT).then_some(value)
}

/// Temperature as whole degrees and hundredths; both carry the sign,
/// so -0.5 °C is `{ int: 0, fract: -50 }`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature {
    pub int: i8,
    pub fract: i8,
}

impl Temperature {
    /// From the compensated value in 0.01 °C, saturating at ±128.99 °C.
    pub fn from_centi_celsius(t: i32) -> Self {
        let t = t.clamp(i8::MIN as i32 * 100 - 99, i8::MAX as i32 * 100 + 99);
        Temperature {
            int: (t / 100) as i8,
            fract: (t % 100) as i8,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.int as f32 + self.fract as f32 / 100.0
    }
}

/// Pressure in hPa with hundredths (i.e. the Pa remainder).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure {
    pub int: u16,
    pub fract: u8,
}

impl Pressure {
    pub fn from_pascal(p: u32) -> Self {
        Pressure {
            int: (p / 100).min(u16::MAX as u32) as u16,
            fract: (p % 100) as u8,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.int as f32 + self.fract as f32 / 100.0
    }
}

/// Relative humidity in % with hundredths.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity {
    pub int: u8,
    pub fract: u8,
}

impl Humidity {
    /// From the compensated Q22.10 value.
    pub fn from_q22_10(h: u32) -> Self {
        Humidity {
            int: (h >> 10).min(100) as u8,
            fract: (((h & 0x3FF) * 100) >> 10) as u8,
        }
    }

    pub fn as_f32(&self) -> f32 {
        self.int as f32 + self.fract as f32 / 100.0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub temperature: Temperature,
    pub pressure: Pressure,
    pub humidity: Humidity,
}

/// °C, hPa and %RH.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MeasurementF {
    pub temperature: f32,
    pub pressure: f32,
    pub humidity: f32,
}

pub fn temperature_f32(t: i32) -> f32 {
    t as f32 / 100.0
}

pub fn pressure_f32(p: u32) -> f32 {
    p as f32 / 100.0
}

pub fn humidity_f32(h: u32) -> f32 {
    h as f32 / 1024.0
}
