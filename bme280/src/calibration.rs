//! Factory trimming parameters stored in the sensor's NVM.

use crate::registers::{CALIB1_LEN, CALIB2_LEN};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationData {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl CalibrationData {
    /// Build from the 0x88..=0xA1 and 0xE1..=0xE7 register blocks.
    ///
    /// dig_H4 and dig_H5 are 12-bit signed values sharing register 0xE5:
    /// H4 takes its low nibble, H5 its high nibble.
    pub fn parse(block1: &[u8; CALIB1_LEN], block2: &[u8; CALIB2_LEN]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([block1[i], block1[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([block1[i], block1[i + 1]]);

        CalibrationData {
            dig_t1: u16_at(0),
            dig_t2: i16_at(2),
            dig_t3: i16_at(4),
            dig_p1: u16_at(6),
            dig_p2: i16_at(8),
            dig_p3: i16_at(10),
            dig_p4: i16_at(12),
            dig_p5: i16_at(14),
            dig_p6: i16_at(16),
            dig_p7: i16_at(18),
            dig_p8: i16_at(20),
            dig_p9: i16_at(22),
            // block1[24] is reserved
            dig_h1: block1[25],
            dig_h2: i16::from_le_bytes([block2[0], block2[1]]),
            dig_h3: block2[2],
            dig_h4: ((block2[3] as i8 as i16) << 4) | (block2[4] & 0x0F) as i16,
            dig_h5: ((block2[5] as i8 as i16) << 4) | (block2[4] >> 4) as i16,
            dig_h6: block2[6] as i8,
        }
    }

    /// A zero dig_P1 makes the pressure formula divide by zero; it only
    /// shows up when the NVM read went wrong.
    pub fn is_valid(&self) -> bool {
        self.dig_p1 != 0
    }
}
