//! Sensor settings: oversampling, power mode, standby time, IIR filter.
//!
//! Every enum carries the datasheet register code as its discriminant so it
//! can be cast straight into a register field. Decoding is total: reserved
//! codes map to the value the chip actually uses for them.

use crate::registers::{
    with_field, FILTER_MASK, FILTER_POS, MODE_MASK, OSRS_H_MASK, OSRS_P_MASK, OSRS_P_POS,
    OSRS_T_MASK, OSRS_T_POS, SPI3W_EN_MASK, T_SB_MASK, T_SB_POS,
};

#[repr(u8)] // allow us to cast enums to u8s
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    /// Channel disabled; its data register reads back as the "skipped" marker.
    Skip = 0b000,
    #[default]
    X1 = 0b001,
    X2 = 0b010,
    X4 = 0b011,
    X8 = 0b100,
    X16 = 0b101,
}

impl Oversampling {
    pub fn from_bits(val: u8) -> Self {
        match val & 0b111 {
            0 => Oversampling::Skip,
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }

    /// Number of samples averaged per conversion.
    pub fn multiplier(self) -> u32 {
        match self {
            Oversampling::Skip => 0,
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
            Oversampling::X16 => 16,
        }
    }
}

#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    #[default]
    Sleep = 0b00,
    Forced = 0b01,
    Normal = 0b11,
}

impl Mode {
    pub fn from_bits(val: u8) -> Self {
        match val & MODE_MASK {
            0b00 => Mode::Sleep,
            0b11 => Mode::Normal,
            // both 01 and 10 select forced mode
            _ => Mode::Forced,
        }
    }
}

/// Inactive period between conversions in normal mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StandbyTime {
    #[default]
    Ms0_5 = 0b000,
    Ms62_5 = 0b001,
    Ms125 = 0b010,
    Ms250 = 0b011,
    Ms500 = 0b100,
    Ms1000 = 0b101,
    Ms10 = 0b110,
    Ms20 = 0b111,
}

impl StandbyTime {
    pub fn from_bits(val: u8) -> Self {
        match val & 0b111 {
            0 => StandbyTime::Ms0_5,
            1 => StandbyTime::Ms62_5,
            2 => StandbyTime::Ms125,
            3 => StandbyTime::Ms250,
            4 => StandbyTime::Ms500,
            5 => StandbyTime::Ms1000,
            6 => StandbyTime::Ms10,
            _ => StandbyTime::Ms20,
        }
    }

    /// Standby duration in microseconds.
    pub fn as_micros(self) -> u32 {
        match self {
            StandbyTime::Ms0_5 => 500,
            StandbyTime::Ms62_5 => 62_500,
            StandbyTime::Ms125 => 125_000,
            StandbyTime::Ms250 => 250_000,
            StandbyTime::Ms500 => 500_000,
            StandbyTime::Ms1000 => 1_000_000,
            StandbyTime::Ms10 => 10_000,
            StandbyTime::Ms20 => 20_000,
        }
    }
}

/// IIR filter coefficient applied to temperature and pressure.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Filter {
    #[default]
    Off = 0b000,
    X2 = 0b001,
    X4 = 0b010,
    X8 = 0b011,
    X16 = 0b100,
}

impl Filter {
    pub fn from_bits(val: u8) -> Self {
        match val & 0b111 {
            0 => Filter::Off,
            1 => Filter::X2,
            2 => Filter::X4,
            3 => Filter::X8,
            _ => Filter::X16,
        }
    }
}

/// Every user-settable option of the sensor, written at once by
/// [`Bme280::configure`](crate::Bme280::configure).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub oversampling_t: Oversampling,
    pub oversampling_p: Oversampling,
    pub oversampling_h: Oversampling,
    /// `Sleep` or `Normal`. Forced conversions are started by the
    /// `read_*_forced` methods instead.
    pub mode: Mode,
    pub standby: StandbyTime,
    pub filter: Filter,
    pub spi3w_enable: bool,
}

impl Config {
    // Recommended settings, datasheet section 3.5. The forced-mode scenarios
    // are left in sleep mode and sampled through `read_all_forced`.

    pub const WEATHER_MONITORING: Config = Config {
        oversampling_t: Oversampling::X1,
        oversampling_p: Oversampling::X1,
        oversampling_h: Oversampling::X1,
        mode: Mode::Sleep,
        standby: StandbyTime::Ms0_5,
        filter: Filter::Off,
        spi3w_enable: false,
    };

    pub const HUMIDITY_SENSING: Config = Config {
        oversampling_t: Oversampling::X1,
        oversampling_p: Oversampling::Skip,
        oversampling_h: Oversampling::X1,
        mode: Mode::Sleep,
        standby: StandbyTime::Ms0_5,
        filter: Filter::Off,
        spi3w_enable: false,
    };

    pub const INDOOR_NAVIGATION: Config = Config {
        oversampling_t: Oversampling::X2,
        oversampling_p: Oversampling::X16,
        oversampling_h: Oversampling::X1,
        mode: Mode::Normal,
        standby: StandbyTime::Ms0_5,
        filter: Filter::X16,
        spi3w_enable: false,
    };

    pub const GAMING: Config = Config {
        oversampling_t: Oversampling::X1,
        oversampling_p: Oversampling::X4,
        oversampling_h: Oversampling::Skip,
        mode: Mode::Normal,
        standby: StandbyTime::Ms0_5,
        filter: Filter::X16,
        spi3w_enable: false,
    };

    pub fn ctrl_meas(&self) -> u8 {
        let reg = with_field(0, OSRS_T_MASK, OSRS_T_POS, self.oversampling_t as u8);
        let reg = with_field(reg, OSRS_P_MASK, OSRS_P_POS, self.oversampling_p as u8);
        with_field(reg, MODE_MASK, 0, self.mode as u8)
    }

    pub fn ctrl_hum(&self) -> u8 {
        self.oversampling_h as u8 & OSRS_H_MASK
    }

    pub fn config_reg(&self) -> u8 {
        let reg = with_field(0, T_SB_MASK, T_SB_POS, self.standby as u8);
        let reg = with_field(reg, FILTER_MASK, FILTER_POS, self.filter as u8);
        with_field(reg, SPI3W_EN_MASK, 0, self.spi3w_enable as u8)
    }

    /// Maximum duration of one conversion, datasheet section 9.1.
    pub fn measurement_time_us(&self) -> u32 {
        measurement_time_us(self.oversampling_t, self.oversampling_p, self.oversampling_h)
    }
}

pub fn measurement_time_us(t: Oversampling, p: Oversampling, h: Oversampling) -> u32 {
    let mut time = 1250 + 2300 * t.multiplier();
    if p != Oversampling::Skip {
        time += 2300 * p.multiplier() + 575;
    }
    if h != Oversampling::Skip {
        time += 2300 * h.multiplier() + 575;
    }
    time
}
