//! Register access over I2C or SPI.
//!
//! The driver only ever needs two primitives: a burst read starting at a
//! register and a single-byte register write. Anything that can do those can
//! implement [`Bus`], e.g. a bus shared behind a mutex.

use core::fmt::Debug;

use embedded_hal::blocking::i2c::{Write as I2cWrite, WriteRead};
use embedded_hal::blocking::spi::{Transfer, Write as SpiWrite};
use embedded_hal::digital::v2::OutputPin;

use crate::registers::{I2C_ADDR_SDO_LOW, SPI_READ_BIT, SPI_WRITE_MASK};

pub trait Bus {
    type Error: Debug;

    /// Fill `buf` with consecutive registers starting at `reg`.
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    fn write(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;
}

pub struct I2cBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cBus<I2C> {
    /// Sensor with SDO tied to GND (0x76).
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, I2C_ADDR_SDO_LOW)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        I2cBus { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Bus for I2cBus<I2C>
where
    I2C: WriteRead<Error = E> + I2cWrite<Error = E>,
    E: Debug,
{
    type Error = E;

    // If we use a buffer of length n, the chip auto-increments the register
    // pointer: buf[0] is `reg`, buf[1] is `reg + 1`, ...
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), E> {
        self.i2c.write_read(self.address, &[reg], buf)
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[reg, value])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiError<S, P> {
    Spi(S),
    Pin(P),
}

/// 4-wire SPI with a software-driven chip select.
pub struct SpiBus<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> SpiBus<SPI, CS> {
    pub fn new(spi: SPI, cs: CS) -> Self {
        SpiBus { spi, cs }
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }
}

impl<SPI, CS: OutputPin> SpiBus<SPI, CS> {
    /// Run `f` with CS held low. CS goes high again even if `f` fails.
    fn selected<T, S>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> Result<T, S>,
    ) -> Result<T, SpiError<S, CS::Error>> {
        self.cs.set_low().map_err(SpiError::Pin)?;
        let res = f(&mut self.spi).map_err(SpiError::Spi);
        let deselect = self.cs.set_high().map_err(SpiError::Pin);
        let value = res?;
        deselect?;
        Ok(value)
    }
}

impl<SPI, CS, S, P> Bus for SpiBus<SPI, CS>
where
    SPI: Transfer<u8, Error = S> + SpiWrite<u8, Error = S>,
    CS: OutputPin<Error = P>,
    S: Debug,
    P: Debug,
{
    type Error = SpiError<S, P>;

    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.selected(|spi| -> Result<(), S> {
            spi.write(&[reg | SPI_READ_BIT])?;
            buf.iter_mut().for_each(|b| *b = 0);
            spi.transfer(buf)?;
            Ok(())
        })
    }

    fn write(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        // MSB of the control byte must be cleared in write mode
        self.selected(|spi| spi.write(&[reg & SPI_WRITE_MASK, value]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeI2c, FakeSpi, RecordingPin, SpiOp};

    #[test]
    fn i2c_reads_with_register_pointer() {
        let mut i2c = FakeI2c::default();
        i2c.response = [0x60, 0x61, 0x62, 0, 0, 0, 0, 0];
        let mut bus = I2cBus::with_address(i2c, 0x77);
        let mut buf = [0u8; 3];
        bus.read(0xD0, &mut buf).unwrap();
        assert_eq!(buf, [0x60, 0x61, 0x62]);

        let i2c = bus.release();
        assert_eq!(i2c.last_address, Some(0x77));
        assert_eq!(i2c.written.as_slice(), &[0xD0]);
    }

    #[test]
    fn i2c_write_sends_register_and_value() {
        let mut bus = I2cBus::new(FakeI2c::default());
        assert_eq!(bus.address(), 0x76);
        bus.write(0xF4, 0x27).unwrap();
        assert_eq!(bus.release().written.as_slice(), &[0xF4, 0x27]);
    }

    #[test]
    fn spi_sets_read_bit_and_clears_write_bit() {
        let mut bus = SpiBus::new(FakeSpi::default(), RecordingPin::default());
        let mut buf = [0u8; 2];
        bus.read(0x75, &mut buf).unwrap();
        bus.write(0xF4, 0x01).unwrap();

        let (spi, cs) = bus.release();
        assert_eq!(spi.ops[0], SpiOp::Write([0xF5, 0], 1));
        assert_eq!(spi.ops[1], SpiOp::Transfer(2));
        assert_eq!(spi.ops[2], SpiOp::Write([0x74, 0x01], 2));
        assert_eq!(cs.lows, 2);
        assert_eq!(cs.highs, 2);
        assert!(cs.high);
    }

    #[test]
    fn spi_releases_chip_select_on_failure() {
        let spi = FakeSpi { fail: true, ..FakeSpi::default() };
        let mut bus = SpiBus::new(spi, RecordingPin::default());
        let err = bus.write(0xE0, 0xB6).unwrap_err();
        assert_eq!(err, SpiError::Spi(()));

        let (_, cs) = bus.release();
        assert!(cs.high);
        assert_eq!(cs.highs, 1);
    }

    #[test]
    fn spi_releases_chip_select_when_read_transfer_fails() {
        let spi = FakeSpi { fail_transfer: true, ..FakeSpi::default() };
        let mut bus = SpiBus::new(spi, RecordingPin::default());
        let mut buf = [0u8; 8];
        assert_eq!(bus.read(0xF7, &mut buf), Err(SpiError::Spi(())));

        let (spi, cs) = bus.release();
        assert_eq!(spi.ops, [SpiOp::Write([0xF7, 0], 1)]);
        assert!(cs.high);
        assert_eq!((cs.lows, cs.highs), (1, 1));
    }
}
