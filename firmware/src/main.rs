// src/main.rs
// BME280 on I2C1 (PB6 = SCL, PB7 = SDA, SDO tied to GND), normal mode, last
// measurement printed over semihosting every 500 ms.
#![no_std]
#![no_main]

use bme280::{Bme280, Config, Filter, I2cBus, Mode, Oversampling, StandbyTime};
use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use panic_halt as _;
use stm32f1xx_hal::{
    i2c::{BlockingI2c, Mode as I2cMode},
    pac,
    prelude::*,
}; // STM32F1 hardware abstraction layer crate

#[entry]
fn main() -> ! {

    hprintln!("Starting program");

    let cp = cortex_m::Peripherals::take().unwrap();
    let dp = pac::Peripherals::take().unwrap();
    let mut flash = dp.FLASH.constrain();
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.acr);
    let mut afio = dp.AFIO.constrain();

    // Get GPIO
    let mut gpiob = dp.GPIOB.split();

    let scl =
        gpiob.pb6.into_alternate_open_drain(&mut gpiob.crl);
    let sda =
        gpiob.pb7.into_alternate_open_drain(&mut gpiob.crl);

    let i2c = BlockingI2c::i2c1(
        dp.I2C1,
        (scl, sda),
        &mut afio.mapr,
        I2cMode::Standard { frequency: 100.kHz() },
        clocks,
        1000,
        10,
        1000,
        1000
    );
    let delay = cp.SYST.delay(&clocks);

    let mut bme1 = match Bme280::new(I2cBus::new(i2c), delay) {
        Ok(dev) => dev,
        Err(e) => {
            hprintln!("BME280 init error: {:?}", e);
            loop {}
        }
    };

    let config = Config {
        oversampling_t: Oversampling::X2,
        oversampling_p: Oversampling::X2,
        oversampling_h: Oversampling::X4,
        mode: Mode::Normal,
        standby: StandbyTime::Ms500,
        filter: Filter::X2,
        spi3w_enable: false,
    };
    if let Err(e) = bme1.configure(&config) {
        hprintln!("BME280 configure error: {:?}", e);
    }

    loop {
        match bme1.read_all_last() {
            Ok(m) => hprintln!(
                "Temperature: {}{}.{:02} degC, Pressure: {}.{:02} hPa, Humidity: {}.{:02} %",
                if m.temperature.int < 0 || m.temperature.fract < 0 { "-" } else { "" },
                m.temperature.int.unsigned_abs(), m.temperature.fract.unsigned_abs(),
                m.pressure.int, m.pressure.fract,
                m.humidity.int, m.humidity.fract
            ),
            Err(e) => hprintln!("BME280 read error: {:?}", e),
        }
        // wait ~500ms
        cortex_m::asm::delay(clocks.sysclk().raw() / 2);
    }

}
