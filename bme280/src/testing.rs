//! In-memory stand-ins for the sensor, its bus and the delay provider.

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write as I2cWrite, WriteRead};
use embedded_hal::blocking::spi::{Transfer, Write as SpiWrite};
use embedded_hal::digital::v2::OutputPin;

use crate::bus::Bus;
use crate::registers::*;

/// Datasheet example trimming: T1..T3 and P1..P9 from the BMP280 datasheet
/// (section 3.12), H1..H6 from a production part.
pub const CALIB1: [u8; CALIB1_LEN] = [
    0x70, 0x6B, // T1 = 27504
    0x43, 0x67, // T2 = 26435
    0x18, 0xFC, // T3 = -1000
    0x7D, 0x8E, // P1 = 36477
    0x43, 0xD6, // P2 = -10685
    0xD0, 0x0B, // P3 = 3024
    0x27, 0x0B, // P4 = 2855
    0x8C, 0x00, // P5 = 140
    0xF9, 0xFF, // P6 = -7
    0x8C, 0x3C, // P7 = 15500
    0xF8, 0xC6, // P8 = -14600
    0x70, 0x17, // P9 = 6000
    0x00, // reserved
    75,   // H1
];

pub const CALIB2: [u8; CALIB2_LEN] = [
    0x6A, 0x01, // H2 = 362
    0x00, // H3
    0x13, // H4 msb: 313 >> 4
    0x29, // H5 lsn << 4 | H4 lsn
    0x03, // H5 msb: 50 >> 4
    30,   // H6
];

/// adc_P = 415148, adc_T = 519888, adc_H = 30000
pub const DATA: [u8; PRES_TEMP_HUM_LEN] = [0x65, 0x59, 0xC0, 0x7E, 0xED, 0x00, 0x75, 0x30];

/// Register file behaving like a BME280 that finishes conversions instantly,
/// unless told to stay busy for a number of status polls. Data registers
/// hold `DATA` for every channel that is not skipped.
pub struct FakeBus {
    pub regs: [u8; 256],
    pub writes: Vec<(u8, u8)>,
    pub busy_polls: usize,
    pub fail: bool,
}

impl FakeBus {
    pub fn new() -> Self {
        let mut regs = [0u8; 256];
        regs[REG_ID_ADDR as usize] = BME280_CHIP_ID;
        let c1 = REG_CALIB1_ADDR as usize;
        regs[c1..c1 + CALIB1_LEN].copy_from_slice(&CALIB1);
        let c2 = REG_CALIB2_ADDR as usize;
        regs[c2..c2 + CALIB2_LEN].copy_from_slice(&CALIB2);
        let d = REG_PRES_ADDR as usize;
        regs[d..d + PRES_TEMP_HUM_LEN].copy_from_slice(&DATA);
        FakeBus {
            regs,
            writes: Vec::new(),
            busy_polls: 0,
            fail: false,
        }
    }

    pub fn reg(&self, reg: u8) -> u8 {
        self.regs[reg as usize]
    }

    /// Register content as the chip reports it: a channel with oversampling
    /// set to skip reads back as the 0x80000 / 0x8000 marker.
    fn peek(&self, addr: usize) -> u8 {
        let ctrl_meas = self.regs[REG_CTRL_MEAS_ADDR as usize];
        let ctrl_hum = self.regs[REG_CTRL_HUM_ADDR as usize];
        let (first, skipped) = match addr as u8 {
            REG_PRES_ADDR..=0xF9 => (REG_PRES_ADDR, ctrl_meas & OSRS_P_MASK == 0),
            REG_TEMP_ADDR..=0xFC => (REG_TEMP_ADDR, ctrl_meas & OSRS_T_MASK == 0),
            REG_HUM_ADDR..=0xFE => (REG_HUM_ADDR, ctrl_hum & OSRS_H_MASK == 0),
            _ => return self.regs[addr],
        };
        match (skipped, addr as u8 == first) {
            (false, _) => self.regs[addr],
            (true, true) => 0x80,
            (true, false) => 0x00,
        }
    }

    pub fn wrote(&self, reg: u8) -> Vec<u8> {
        self.writes
            .iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
            .collect()
    }
}

impl Bus for FakeBus {
    type Error = ();

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        if reg == REG_STATUS_ADDR && self.busy_polls > 0 {
            self.busy_polls -= 1;
            buf[0] = STATUS_MEASURING;
            return Ok(());
        }
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.peek(reg as usize + i);
        }
        Ok(())
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.writes.push((reg, value));
        match reg {
            REG_RESET_ADDR if value == RESET_VAL => {
                self.regs[REG_CTRL_HUM_ADDR as usize] = 0;
                self.regs[REG_CTRL_MEAS_ADDR as usize] = 0;
                self.regs[REG_CONFIG_ADDR as usize] = 0;
            }
            // forced conversion completes immediately and drops back to sleep
            REG_CTRL_MEAS_ADDR if value & MODE_MASK == 0b01 || value & MODE_MASK == 0b10 => {
                self.regs[reg as usize] = value & !MODE_MASK;
            }
            _ => self.regs[reg as usize] = value,
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingDelay {
    pub total_ms: u32,
    pub calls: usize,
}

impl DelayMs<u32> for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms;
        self.calls += 1;
    }
}

#[derive(Default)]
pub struct FakeI2c {
    pub response: [u8; 8],
    pub written: Vec<u8>,
    pub last_address: Option<u8>,
}

impl WriteRead for FakeI2c {
    type Error = ();

    fn write_read(&mut self, address: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), ()> {
        self.last_address = Some(address);
        self.written.extend_from_slice(bytes);
        let n = buffer.len();
        buffer.copy_from_slice(&self.response[..n]);
        Ok(())
    }
}

impl I2cWrite for FakeI2c {
    type Error = ();

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
        self.last_address = Some(address);
        self.written.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SpiOp {
    /// Up to two written bytes and how many were sent.
    Write([u8; 2], usize),
    Transfer(usize),
}

#[derive(Default)]
pub struct FakeSpi {
    pub ops: Vec<SpiOp>,
    pub fail: bool,
    pub fail_transfer: bool,
}

impl SpiWrite<u8> for FakeSpi {
    type Error = ();

    fn write(&mut self, words: &[u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        let mut bytes = [0u8; 2];
        bytes[..words.len()].copy_from_slice(words);
        self.ops.push(SpiOp::Write(bytes, words.len()));
        Ok(())
    }
}

impl Transfer<u8> for FakeSpi {
    type Error = ();

    fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8], ()> {
        if self.fail || self.fail_transfer {
            return Err(());
        }
        self.ops.push(SpiOp::Transfer(words.len()));
        Ok(words)
    }
}

pub struct RecordingPin {
    pub high: bool,
    pub lows: usize,
    pub highs: usize,
}

impl Default for RecordingPin {
    fn default() -> Self {
        RecordingPin { high: true, lows: 0, highs: 0 }
    }
}

impl OutputPin for RecordingPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.lows += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.highs += 1;
        Ok(())
    }
}
