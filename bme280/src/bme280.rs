/* BME280 driver
 *
 * See links for reference:
 * https://www.bosch-sensortec.com/media/boschsensortec/downloads/datasheets/bst-bme280-ds002.pdf
 * https://cdn-shop.adafruit.com/datasheets/BST-BMP280-DS001-11.pdf
 */

use embedded_hal::blocking::delay::DelayMs;

use crate::bus::Bus;
use crate::calibration::CalibrationData;
use crate::compensation::{compensate_humidity, compensate_pressure, compensate_temperature};
use crate::config::{measurement_time_us, Config, Filter, Mode, Oversampling, StandbyTime};
use crate::error::Error;
use crate::measurement::{
    humidity_f32, parse_16bit, parse_20bit, pressure_f32, temperature_f32, Humidity, Measurement,
    MeasurementF, Pressure, RawData, Temperature,
};
use crate::registers::*;

pub type Bme280Result<T, E> = Result<T, Error<E>>;

/// Status polls after the expected conversion time has elapsed.
const BUSY_RETRIES: usize = 10;
/// Power-on reset start-up time, datasheet table 1.
const STARTUP_MS: u32 = 2;

/// Which compensated values a read needs; decides the burst window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Channels {
    Temperature,
    Pressure,
    Humidity,
    All,
}

impl Channels {
    fn burst(self) -> (u8, usize) {
        match self {
            Channels::Temperature => (REG_TEMP_ADDR, TEMP_LEN),
            Channels::Pressure => (REG_PRES_ADDR, PRES_TEMP_LEN),
            Channels::Humidity => (REG_TEMP_ADDR, TEMP_HUM_LEN),
            Channels::All => (REG_PRES_ADDR, PRES_TEMP_HUM_LEN),
        }
    }
}

/// Compensated values; channels that were not requested stay zero.
#[derive(Copy, Clone, Debug, Default)]
struct Compensated {
    temperature: i32,
    pressure: u32,
    humidity: u32,
}

impl Compensated {
    fn measurement(&self) -> Measurement {
        Measurement {
            temperature: Temperature::from_centi_celsius(self.temperature),
            pressure: Pressure::from_pascal(self.pressure),
            humidity: Humidity::from_q22_10(self.humidity),
        }
    }

    fn measurement_f32(&self) -> MeasurementF {
        MeasurementF {
            temperature: temperature_f32(self.temperature),
            pressure: pressure_f32(self.pressure),
            humidity: humidity_f32(self.humidity),
        }
    }
}

/// A single BME280.
///
/// Owns its bus and delay provider; wrap a shared bus in your own [`Bus`]
/// impl when several devices hang off it. Operations are blocking and not
/// reentrant.
pub struct Bme280<B, D> {
    bus: B,
    delay: D,
    calib: CalibrationData,
    /// Last mode written to the chip. Forced conversions end in sleep, so
    /// this is only ever `Sleep` or `Normal`.
    mode: Mode,
}

impl<B, D> Bme280<B, D>
where
    B: Bus,
    D: DelayMs<u32>,
{
    /// Check the chip id, soft-reset the sensor and load its trimming
    /// parameters. The sensor is left in sleep mode with every setting at its
    /// reset value.
    pub fn new(bus: B, delay: D) -> Bme280Result<Self, B::Error> {
        let mut dev = Bme280 {
            bus,
            delay,
            calib: CalibrationData::default(),
            mode: Mode::Sleep,
        };

        let chip_id = dev.read_u8(REG_ID_ADDR)?;
        if chip_id != BME280_CHIP_ID {
            log_warn!("actual chip id: {:#04x}, expected chip id: {:#04x}", chip_id, BME280_CHIP_ID);
            return Err(Error::ChipId(chip_id));
        }

        dev.reset()?;
        dev.read_calibration()?;
        log_debug!("bme280 initialized: {:?}", dev.calib);
        Ok(dev)
    }

    /// Power-on reset. Waits for the NVM copy to finish; all settings return
    /// to their defaults and the sensor sleeps.
    pub fn reset(&mut self) -> Bme280Result<(), B::Error> {
        self.write_u8(REG_RESET_ADDR, RESET_VAL)?;
        self.mode = Mode::Sleep;
        self.delay.delay_ms(STARTUP_MS);
        self.poll_status(STATUS_IM_UPDATE)?;
        log_debug!("bme280 reset");
        Ok(())
    }

    /// Write every setting at once. The sensor is put to sleep first so the
    /// config register write is not ignored; `config.mode` is applied last.
    pub fn configure(&mut self, config: &Config) -> Bme280Result<(), B::Error> {
        if config.mode == Mode::Forced {
            return Err(Error::WrongMode(Mode::Forced));
        }

        self.update_reg(REG_CTRL_MEAS_ADDR, MODE_MASK, 0, Mode::Sleep as u8)?;
        self.mode = Mode::Sleep;

        self.write_u8(REG_CONFIG_ADDR, config.config_reg())?;
        let ctrl_hum = self.read_u8(REG_CTRL_HUM_ADDR)?;
        self.write_u8(REG_CTRL_HUM_ADDR, (ctrl_hum & !OSRS_H_MASK) | config.ctrl_hum())?;
        // ctrl_hum only takes effect after this write
        self.write_u8(REG_CTRL_MEAS_ADDR, config.ctrl_meas())?;
        self.mode = config.mode;

        log_debug!("bme280 configured: {:?}", config);
        Ok(())
    }

    pub fn set_temperature_oversampling(&mut self, osrs: Oversampling) -> Bme280Result<(), B::Error> {
        self.update_reg(REG_CTRL_MEAS_ADDR, OSRS_T_MASK, OSRS_T_POS, osrs as u8)
    }

    pub fn temperature_oversampling(&mut self) -> Bme280Result<Oversampling, B::Error> {
        let reg = self.read_u8(REG_CTRL_MEAS_ADDR)?;
        Ok(Oversampling::from_bits(field(reg, OSRS_T_MASK, OSRS_T_POS)))
    }

    pub fn set_pressure_oversampling(&mut self, osrs: Oversampling) -> Bme280Result<(), B::Error> {
        self.update_reg(REG_CTRL_MEAS_ADDR, OSRS_P_MASK, OSRS_P_POS, osrs as u8)
    }

    pub fn pressure_oversampling(&mut self) -> Bme280Result<Oversampling, B::Error> {
        let reg = self.read_u8(REG_CTRL_MEAS_ADDR)?;
        Ok(Oversampling::from_bits(field(reg, OSRS_P_MASK, OSRS_P_POS)))
    }

    pub fn set_humidity_oversampling(&mut self, osrs: Oversampling) -> Bme280Result<(), B::Error> {
        self.update_reg(REG_CTRL_HUM_ADDR, OSRS_H_MASK, 0, osrs as u8)?;
        // latch ctrl_hum by rewriting ctrl_meas unchanged
        let ctrl_meas = self.read_u8(REG_CTRL_MEAS_ADDR)?;
        self.write_u8(REG_CTRL_MEAS_ADDR, ctrl_meas)
    }

    pub fn humidity_oversampling(&mut self) -> Bme280Result<Oversampling, B::Error> {
        let reg = self.read_u8(REG_CTRL_HUM_ADDR)?;
        Ok(Oversampling::from_bits(reg & OSRS_H_MASK))
    }

    /// Switch between sleep and normal mode. Forced conversions are started
    /// by the `read_*_forced` methods.
    pub fn set_mode(&mut self, mode: Mode) -> Bme280Result<(), B::Error> {
        if mode == Mode::Forced {
            return Err(Error::WrongMode(Mode::Forced));
        }
        self.update_reg(REG_CTRL_MEAS_ADDR, MODE_MASK, 0, mode as u8)?;
        self.mode = mode;
        Ok(())
    }

    /// Mode as reported by the chip. Also resynchronizes the cached mode.
    pub fn mode(&mut self) -> Bme280Result<Mode, B::Error> {
        let mode = Mode::from_bits(self.read_u8(REG_CTRL_MEAS_ADDR)?);
        self.mode = match mode {
            Mode::Normal => Mode::Normal,
            // a running forced conversion falls back to sleep on its own
            Mode::Sleep | Mode::Forced => Mode::Sleep,
        };
        Ok(mode)
    }

    pub fn set_standby_time(&mut self, t_sb: StandbyTime) -> Bme280Result<(), B::Error> {
        self.require_mode(Mode::Sleep)?;
        self.update_reg(REG_CONFIG_ADDR, T_SB_MASK, T_SB_POS, t_sb as u8)
    }

    pub fn standby_time(&mut self) -> Bme280Result<StandbyTime, B::Error> {
        let reg = self.read_u8(REG_CONFIG_ADDR)?;
        Ok(StandbyTime::from_bits(field(reg, T_SB_MASK, T_SB_POS)))
    }

    pub fn set_filter(&mut self, filter: Filter) -> Bme280Result<(), B::Error> {
        self.require_mode(Mode::Sleep)?;
        self.update_reg(REG_CONFIG_ADDR, FILTER_MASK, FILTER_POS, filter as u8)
    }

    pub fn filter(&mut self) -> Bme280Result<Filter, B::Error> {
        let reg = self.read_u8(REG_CONFIG_ADDR)?;
        Ok(Filter::from_bits(field(reg, FILTER_MASK, FILTER_POS)))
    }

    pub fn enable_spi3w(&mut self) -> Bme280Result<(), B::Error> {
        self.require_mode(Mode::Sleep)?;
        self.update_reg(REG_CONFIG_ADDR, SPI3W_EN_MASK, 0, 1)
    }

    pub fn disable_spi3w(&mut self) -> Bme280Result<(), B::Error> {
        self.require_mode(Mode::Sleep)?;
        self.update_reg(REG_CONFIG_ADDR, SPI3W_EN_MASK, 0, 0)
    }

    pub fn is_spi3w_enabled(&mut self) -> Bme280Result<bool, B::Error> {
        Ok(self.read_u8(REG_CONFIG_ADDR)? & SPI3W_EN_MASK != 0)
    }

    /* Last conversion, normal mode only */

    pub fn read_temperature_last(&mut self) -> Bme280Result<Temperature, B::Error> {
        let c = self.sample(Channels::Temperature, false)?;
        Ok(Temperature::from_centi_celsius(c.temperature))
    }

    pub fn read_pressure_last(&mut self) -> Bme280Result<Pressure, B::Error> {
        let c = self.sample(Channels::Pressure, false)?;
        Ok(Pressure::from_pascal(c.pressure))
    }

    pub fn read_humidity_last(&mut self) -> Bme280Result<Humidity, B::Error> {
        let c = self.sample(Channels::Humidity, false)?;
        Ok(Humidity::from_q22_10(c.humidity))
    }

    pub fn read_all_last(&mut self) -> Bme280Result<Measurement, B::Error> {
        Ok(self.sample(Channels::All, false)?.measurement())
    }

    pub fn read_temperature_last_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Temperature, false)?;
        Ok(temperature_f32(c.temperature))
    }

    pub fn read_pressure_last_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Pressure, false)?;
        Ok(pressure_f32(c.pressure))
    }

    pub fn read_humidity_last_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Humidity, false)?;
        Ok(humidity_f32(c.humidity))
    }

    pub fn read_all_last_f32(&mut self) -> Bme280Result<MeasurementF, B::Error> {
        Ok(self.sample(Channels::All, false)?.measurement_f32())
    }

    /* Single forced conversion, sleep mode only */

    pub fn read_temperature_forced(&mut self) -> Bme280Result<Temperature, B::Error> {
        let c = self.sample(Channels::Temperature, true)?;
        Ok(Temperature::from_centi_celsius(c.temperature))
    }

    pub fn read_pressure_forced(&mut self) -> Bme280Result<Pressure, B::Error> {
        let c = self.sample(Channels::Pressure, true)?;
        Ok(Pressure::from_pascal(c.pressure))
    }

    pub fn read_humidity_forced(&mut self) -> Bme280Result<Humidity, B::Error> {
        let c = self.sample(Channels::Humidity, true)?;
        Ok(Humidity::from_q22_10(c.humidity))
    }

    pub fn read_all_forced(&mut self) -> Bme280Result<Measurement, B::Error> {
        Ok(self.sample(Channels::All, true)?.measurement())
    }

    pub fn read_temperature_forced_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Temperature, true)?;
        Ok(temperature_f32(c.temperature))
    }

    pub fn read_pressure_forced_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Pressure, true)?;
        Ok(pressure_f32(c.pressure))
    }

    pub fn read_humidity_forced_f32(&mut self) -> Bme280Result<f32, B::Error> {
        let c = self.sample(Channels::Humidity, true)?;
        Ok(humidity_f32(c.humidity))
    }

    pub fn read_all_forced_f32(&mut self) -> Bme280Result<MeasurementF, B::Error> {
        Ok(self.sample(Channels::All, true)?.measurement_f32())
    }

    pub fn calibration(&self) -> &CalibrationData {
        &self.calib
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn sample(&mut self, channels: Channels, forced: bool) -> Bme280Result<Compensated, B::Error> {
        if forced {
            self.require_mode(Mode::Sleep)?;
            let wait_ms = self.trigger_forced()?;
            self.delay.delay_ms(wait_ms);
            self.poll_status(STATUS_MEASURING)?;
        } else {
            self.require_mode(Mode::Normal)?;
        }
        self.read_compensated(channels)
    }

    /// Start one conversion; returns how long it takes at most, in ms.
    fn trigger_forced(&mut self) -> Bme280Result<u32, B::Error> {
        let ctrl_hum = self.read_u8(REG_CTRL_HUM_ADDR)?;
        let ctrl_meas = self.read_u8(REG_CTRL_MEAS_ADDR)?;
        let time_us = measurement_time_us(
            Oversampling::from_bits(field(ctrl_meas, OSRS_T_MASK, OSRS_T_POS)),
            Oversampling::from_bits(field(ctrl_meas, OSRS_P_MASK, OSRS_P_POS)),
            Oversampling::from_bits(ctrl_hum & OSRS_H_MASK),
        );
        self.write_u8(REG_CTRL_MEAS_ADDR, with_field(ctrl_meas, MODE_MASK, 0, Mode::Forced as u8))?;
        Ok((time_us + 999) / 1000)
    }

    /// Wait for `flag` in the status register to clear.
    fn poll_status(&mut self, flag: u8) -> Bme280Result<(), B::Error> {
        for _ in 0..BUSY_RETRIES {
            if self.read_u8(REG_STATUS_ADDR)? & flag == 0 {
                return Ok(());
            }
            self.delay.delay_ms(1);
        }
        log_warn!("bme280 status flag {:#04x} still set", flag);
        Err(Error::Busy)
    }

    fn read_calibration(&mut self) -> Bme280Result<(), B::Error> {
        let mut block1 = [0u8; CALIB1_LEN];
        let mut block2 = [0u8; CALIB2_LEN];
        self.bus.read(REG_CALIB1_ADDR, &mut block1).map_err(Error::Bus)?;
        self.bus.read(REG_CALIB2_ADDR, &mut block2).map_err(Error::Bus)?;

        let calib = CalibrationData::parse(&block1, &block2);
        if !calib.is_valid() {
            return Err(Error::Calibration);
        }
        self.calib = calib;
        Ok(())
    }

    fn read_raw(&mut self, channels: Channels) -> Bme280Result<RawData, B::Error> {
        let (start, len) = channels.burst();
        let mut rx_buffer = [0u8; PRES_TEMP_HUM_LEN];
        let buf = &mut rx_buffer[..len];
        self.bus.read(start, buf).map_err(Error::Bus)?;

        let raw = match channels {
            Channels::Temperature => RawData {
                temperature: parse_20bit(&buf[0..3]),
                ..RawData::default()
            },
            Channels::Pressure => RawData {
                pressure: parse_20bit(&buf[0..3]),
                temperature: parse_20bit(&buf[3..6]),
                humidity: None,
            },
            Channels::Humidity => RawData {
                pressure: None,
                temperature: parse_20bit(&buf[0..3]),
                humidity: parse_16bit(&buf[3..5]),
            },
            Channels::All => RawData {
                pressure: parse_20bit(&buf[0..3]),
                temperature: parse_20bit(&buf[3..6]),
                humidity: parse_16bit(&buf[6..8]),
            },
        };
        log_trace!("bme280 raw: {:?}", raw);
        Ok(raw)
    }

    fn read_compensated(&mut self, channels: Channels) -> Bme280Result<Compensated, B::Error> {
        let raw = self.read_raw(channels)?;

        // pressure and humidity both need t_fine
        let adc_t = raw.temperature.ok_or(Error::Skipped)?;
        let (t_fine, temperature) = compensate_temperature(&self.calib, adc_t);
        let mut out = Compensated {
            temperature,
            ..Compensated::default()
        };

        if matches!(channels, Channels::Pressure | Channels::All) {
            let adc_p = raw.pressure.ok_or(Error::Skipped)?;
            out.pressure = compensate_pressure(&self.calib, t_fine, adc_p).ok_or(Error::Calibration)?;
        }
        if matches!(channels, Channels::Humidity | Channels::All) {
            let adc_h = raw.humidity.ok_or(Error::Skipped)?;
            out.humidity = compensate_humidity(&self.calib, t_fine, adc_h);
        }
        Ok(out)
    }

    fn require_mode(&self, expected: Mode) -> Bme280Result<(), B::Error> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(Error::WrongMode(self.mode))
        }
    }

    fn update_reg(&mut self, reg: u8, mask: u8, pos: u8, value: u8) -> Bme280Result<(), B::Error> {
        let current = self.read_u8(reg)?;
        self.write_u8(reg, with_field(current, mask, pos, value))
    }

    fn read_u8(&mut self, reg: u8) -> Bme280Result<u8, B::Error> {
        let mut rx_buffer: [u8; 1] = [0];
        self.bus.read(reg, &mut rx_buffer).map_err(Error::Bus)?;
        Ok(rx_buffer[0])
    }

    fn write_u8(&mut self, reg: u8, value: u8) -> Bme280Result<(), B::Error> {
        self.bus.write(reg, value).map_err(Error::Bus)
    }
}
