//! BME280 register map and bit layout (Bosch BST-BME280-DS002, section 5.3).

/* CHIP CONSTANTS */
pub const BME280_CHIP_ID:       u8 = 0x60;  // value of REG_ID_ADDR on a genuine BME280
pub const RESET_VAL:            u8 = 0xB6;  // writing this to REG_RESET_ADDR triggers a power-on reset

/* I2C ADDRESSES */
pub const I2C_ADDR_SDO_LOW:     u8 = 0x76;  // SDO pin tied to GND
pub const I2C_ADDR_SDO_HIGH:    u8 = 0x77;  // SDO pin tied to VDDIO

/* ADDRESSES */
pub const REG_ID_ADDR:          u8 = 0xD0;
pub const REG_RESET_ADDR:       u8 = 0xE0;
pub const REG_CTRL_HUM_ADDR:    u8 = 0xF2;  // only becomes effective after a write to REG_CTRL_MEAS_ADDR
pub const REG_STATUS_ADDR:      u8 = 0xF3;  // measuring and im_update flags
pub const REG_CTRL_MEAS_ADDR:   u8 = 0xF4;  // osrs_t, osrs_p and power mode
pub const REG_CONFIG_ADDR:      u8 = 0xF5;  // standby, filter and 3-wire SPI; writes ignored in normal mode
pub const REG_PRES_ADDR:        u8 = 0xF7;  // press_msb, press_lsb, press_xlsb
pub const REG_TEMP_ADDR:        u8 = 0xFA;  // temp_msb, temp_lsb, temp_xlsb
pub const REG_HUM_ADDR:         u8 = 0xFD;  // hum_msb, hum_lsb

/* CALIBRATION */
pub const REG_CALIB1_ADDR:      u8 = 0x88;  // dig_T1 .. dig_P9, one reserved byte, dig_H1
pub const CALIB1_LEN:           usize = 26;
pub const REG_CALIB2_ADDR:      u8 = 0xE1;  // dig_H2 .. dig_H6
pub const CALIB2_LEN:           usize = 7;

/* DATA BURST LENGTHS */
pub const PRES_TEMP_HUM_LEN:    usize = 8;
pub const PRES_TEMP_LEN:        usize = 6;
pub const TEMP_HUM_LEN:         usize = 5;
pub const TEMP_LEN:             usize = 3;

/* BITMASKS */
pub const OSRS_T_MASK:          u8 = 0b1110_0000;
pub const OSRS_P_MASK:          u8 = 0b0001_1100;
pub const MODE_MASK:            u8 = 0b0000_0011;
pub const OSRS_H_MASK:          u8 = 0b0000_0111;
pub const T_SB_MASK:            u8 = 0b1110_0000;
pub const FILTER_MASK:          u8 = 0b0001_1100;
pub const SPI3W_EN_MASK:        u8 = 0b0000_0001;
pub const STATUS_MEASURING:     u8 = 0b0000_1000;
pub const STATUS_IM_UPDATE:     u8 = 0b0000_0001;

pub const OSRS_T_POS:           u8 = 5;
pub const OSRS_P_POS:           u8 = 2;
pub const T_SB_POS:             u8 = 5;
pub const FILTER_POS:           u8 = 2;

/* SPI */
pub const SPI_READ_BIT:         u8 = 0x80;
pub const SPI_WRITE_MASK:       u8 = 0x7F;

/* ADC MARKERS */
pub const SKIPPED_20BIT:        u32 = 0x80000;  // press/temp value when the channel is skipped
pub const SKIPPED_16BIT:        u32 = 0x8000;   // hum value when the channel is skipped

/// Replace the bits selected by `mask` in `reg` with `value << pos`.
#[inline]
pub(crate) fn with_field(reg: u8, mask: u8, pos: u8, value: u8) -> u8 {
    (reg & !mask) | ((value << pos) & mask)
}

#[inline]
pub(crate) fn field(reg: u8, mask: u8, pos: u8) -> u8 {
    (reg & mask) >> pos
}
