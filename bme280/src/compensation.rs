//! Bosch integer compensation formulas (datasheet section 4.2.3 and 8.2).
//!
//! The reference code uses 32-bit arithmetic; intermediates here are i64 so
//! that a corrupt ADC word or trimming value cannot overflow. For readings
//! inside the sensor's range the results are bit-identical.

use crate::calibration::CalibrationData;

/// Fine temperature carried into the pressure and humidity formulas.
pub type TFine = i32;

/// Returns `(t_fine, temperature)` with temperature in 0.01 °C.
pub fn compensate_temperature(calib: &CalibrationData, adc_t: u32) -> (TFine, i32) {
    let adc_t = adc_t as i64;
    let dig_t1 = calib.dig_t1 as i64;
    let dig_t2 = calib.dig_t2 as i64;
    let dig_t3 = calib.dig_t3 as i64;

    let var1 = (((adc_t >> 3) - (dig_t1 << 1)) * dig_t2) >> 11;
    let var2 = (((((adc_t >> 4) - dig_t1) * ((adc_t >> 4) - dig_t1)) >> 12) * dig_t3) >> 14;
    // bounded by |2^24| for any 20-bit adc_t and 16-bit trimming
    let t_fine = (var1 + var2) as i32;
    let t = (t_fine * 5 + 128) >> 8;
    (t_fine, t)
}

/// Pressure in Pa, or `None` when dig_P1 leaves nothing to divide by.
pub fn compensate_pressure(calib: &CalibrationData, t_fine: TFine, adc_p: u32) -> Option<u32> {
    let dig_p1 = calib.dig_p1 as i64;
    let dig_p2 = calib.dig_p2 as i64;
    let dig_p3 = calib.dig_p3 as i64;
    let dig_p4 = calib.dig_p4 as i64;
    let dig_p5 = calib.dig_p5 as i64;
    let dig_p6 = calib.dig_p6 as i64;
    let dig_p7 = calib.dig_p7 as i64;
    let dig_p8 = calib.dig_p8 as i64;
    let dig_p9 = calib.dig_p9 as i64;

    let mut var1 = ((t_fine as i64) >> 1) - 64000;
    let mut var2 = (((var1 >> 2) * (var1 >> 2)) >> 11) * dig_p6;
    var2 += (var1 * dig_p5) << 1;
    var2 = (var2 >> 2) + (dig_p4 << 16);
    var1 = (((dig_p3 * (((var1 >> 2) * (var1 >> 2)) >> 13)) >> 3) + ((dig_p2 * var1) >> 1)) >> 18;
    var1 = ((32768 + var1) * dig_p1) >> 15;
    if var1 == 0 {
        return None;
    }

    let mut p = ((1_048_576 - adc_p as i64) - (var2 >> 12)) * 3125;
    if p < 0x8000_0000 {
        p = (p << 1) / var1;
    } else {
        p = (p / var1) * 2;
    }
    // the reference keeps p in a u32 from here on
    let p = p.clamp(0, u32::MAX as i64);
    let p_8 = (p >> 3) as u32;
    let var1 = (dig_p9 * (p_8.wrapping_mul(p_8) >> 13) as i64) >> 12;
    let var2 = ((p >> 2) * dig_p8) >> 13;
    let p = p + ((var1 + var2 + dig_p7) >> 4);

    Some(p.clamp(0, u32::MAX as i64) as u32)
}

/// Relative humidity in %RH as unsigned Q22.10 (47445 => 46.333 %RH),
/// clamped to 0..=100 %.
pub fn compensate_humidity(calib: &CalibrationData, t_fine: TFine, adc_h: u32) -> u32 {
    let adc_h = adc_h as i64;
    let dig_h1 = calib.dig_h1 as i64;
    let dig_h2 = calib.dig_h2 as i64;
    let dig_h3 = calib.dig_h3 as i64;
    let dig_h4 = calib.dig_h4 as i64;
    let dig_h5 = calib.dig_h5 as i64;
    let dig_h6 = calib.dig_h6 as i64;

    let mut v_x1 = t_fine as i64 - 76800;
    v_x1 = (((adc_h << 14) - (dig_h4 << 20) - (dig_h5 * v_x1) + 16384) >> 15)
        * (((((((v_x1 * dig_h6) >> 10) * (((v_x1 * dig_h3) >> 11) + 32768)) >> 10) + 2_097_152)
            * dig_h2
            + 8192)
            >> 14);
    let v_x1 = v_x1.clamp(i32::MIN as i64, i32::MAX as i64);
    let v_x1 = v_x1 - (((((v_x1 >> 15) * (v_x1 >> 15)) >> 7) * dig_h1) >> 4);
    let v_x1 = v_x1.clamp(0, 419_430_400);
    (v_x1 >> 12) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CALIB1, CALIB2};
    use proptest::prelude::*;

    fn calib() -> CalibrationData {
        CalibrationData::parse(&CALIB1, &CALIB2)
    }

    #[test]
    fn datasheet_temperature() {
        assert_eq!(compensate_temperature(&calib(), 519_888), (128_422, 2508));
    }

    #[test]
    fn below_freezing() {
        let (_, t) = compensate_temperature(&calib(), 400_000);
        assert_eq!(t, -1264);
    }

    #[test]
    fn datasheet_pressure() {
        assert_eq!(compensate_pressure(&calib(), 128_422, 415_148), Some(100_656));
    }

    #[test]
    fn pressure_without_p1_is_none() {
        let mut c = calib();
        c.dig_p1 = 0;
        assert_eq!(compensate_pressure(&c, 128_422, 415_148), None);
    }

    #[test]
    fn humidity_reference() {
        // 56317 / 1024 = 54.997 %RH
        assert_eq!(compensate_humidity(&calib(), 128_422, 30_000), 56_317);
    }

    #[test]
    fn humidity_clamps_at_both_ends() {
        assert_eq!(compensate_humidity(&calib(), 128_422, 0), 0);
        assert_eq!(compensate_humidity(&calib(), 128_422, 0xFFFF), 102_400);
    }

    proptest! {
        #[test]
        fn humidity_stays_in_percent_range(adc_t in 0u32..0x10_0000, adc_h in 0u32..0x1_0000) {
            let c = calib();
            let (t_fine, _) = compensate_temperature(&c, adc_t);
            let h = compensate_humidity(&c, t_fine, adc_h);
            prop_assert!(h <= 100 * 1024);
        }

        #[test]
        fn arbitrary_trimming_never_panics(
            t2 in any::<i16>(), t3 in any::<i16>(), p6 in any::<i16>(), p9 in any::<i16>(),
            h2 in any::<i16>(), h5 in -2048i16..2048, adc_t in 0u32..0x10_0000,
            adc_p in 0u32..0x10_0000, adc_h in 0u32..0x1_0000
        ) {
            let mut c = calib();
            c.dig_t2 = t2;
            c.dig_t3 = t3;
            c.dig_p6 = p6;
            c.dig_p9 = p9;
            c.dig_h2 = h2;
            c.dig_h5 = h5;
            let (t_fine, _) = compensate_temperature(&c, adc_t);
            let _ = compensate_pressure(&c, t_fine, adc_p);
            prop_assert!(compensate_humidity(&c, t_fine, adc_h) <= 102_400);
        }
    }
}
