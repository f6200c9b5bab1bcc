use crate::bme680::bme680_calib::CalibData;
use crate::errors::Bme680Error;

// -- documented physical bounds of the compensated outputs; results
// -- outside these bands point at a calibration or wiring fault
const BME680_TEMPERATURE_MIN: i32 = -4000;
const BME680_TEMPERATURE_MAX: i32 = 8500;
const BME680_PRESSURE_MIN: u32 = 30000;
const BME680_PRESSURE_MAX: u32 = 110000;
const BME680_HUMIDITY_MIN: i32 = 0;
const BME680_HUMIDITY_MAX: i32 = 100000;

// -- heater limits and gas wait encoding
const BME680_HEATER_TEMP_MAX: i32 = 400;
const BME680_GAS_WAIT_SATURATION: u16 = 0x0fc0;
const BME680_GAS_WAIT_MANTISSA_MAX: u16 = 0x3f;
const BME680_GAS_WAIT_FACTOR_SHL: u8 = 6;

// -- constants used by the gas resistance formula, one entry per 4-bit
// -- gas range: reference resistances and range scale values
const GAS_RANGE_LOOKUP_1: [u32; 16] = [
    2147483647, 2147483647, 2147483647, 2147483647, 2147483647, 2126008810, 2147483647,
    2130303777, 2147483647, 2147483647, 2143188679, 2136746228, 2147483647, 2126008810,
    2147483647, 2147483647,
];
const GAS_RANGE_LOOKUP_2: [u32; 16] = [
    4096000000, 2048000000, 1024000000, 512000000, 255744255, 127110228, 64000000, 32258064,
    16016016, 8000000, 4000000, 2000000, 1000000, 500000, 250000, 125000,
];

/// Compensates a raw 20-bit temperature code into centi-degrees Celsius,
/// returning `(temp_comp, t_fine)`. The fine value feeds the pressure and
/// humidity formulas.
pub fn calc_temperature(temperature_raw: u32, calib: &CalibData) -> Result<(i32, i32), Bme680Error> {
    let var1 = ((temperature_raw as i32) >> 3) - ((calib.par_t1 as i32) << 1);
    let var2 = (var1 * (calib.par_t2 as i32)) >> 11;
    let var3 = ((((var1 >> 1) * (var1 >> 1)) >> 12) * ((calib.par_t3 as i32) << 4)) >> 14;
    let t_fine = var2 + var3;
    let temp_comp = ((t_fine * 5) + 128) >> 8;
    if !(BME680_TEMPERATURE_MIN..=BME680_TEMPERATURE_MAX).contains(&temp_comp) {
        return Err(Bme680Error::RangeError {
            quantity: "temperature",
            value: temp_comp as i64,
            min: BME680_TEMPERATURE_MIN as i64,
            max: BME680_TEMPERATURE_MAX as i64,
        });
    }
    Ok((temp_comp, t_fine))
}

/// Compensates a raw 20-bit pressure code into Pascal using `t_fine` from
/// the temperature compensation.
///
/// Near the top of the scale the in-progress value is compared against
/// 1 << 30: above the threshold it must be divided before doubling so the
/// intermediate stays inside 32 bits, below it is doubled before dividing
/// to keep the extra bit of precision.
pub fn calc_pressure(pressure_raw: u32, t_fine: i32, calib: &CalibData) -> Result<u32, Bme680Error> {
    let mut var1 = (t_fine >> 1) - 64000;
    let mut var2 = ((((var1 >> 2) * (var1 >> 2)) >> 11) * (calib.par_p6 as i32)) >> 2;
    var2 += (var1 * (calib.par_p5 as i32)) << 1;
    var2 = (var2 >> 2) + ((calib.par_p4 as i32) << 16);
    var1 = (((((var1 >> 2) * (var1 >> 2)) >> 13) * ((calib.par_p3 as i32) << 5)) >> 3)
        + (((calib.par_p2 as i32) * var1) >> 1);
    var1 >>= 18;
    var1 = ((32768 + var1) * (calib.par_p1 as i32)) >> 15;

    let mut press_comp = 1048576u32.wrapping_sub(pressure_raw) as i32;
    press_comp = ((press_comp - (var2 >> 12)) as u32).wrapping_mul(3125) as i32;
    if press_comp >= (1 << 30) {
        press_comp = (((press_comp as u32) / (var1 as u32)) << 1) as i32;
    } else {
        press_comp = (((press_comp as u32) << 1) / (var1 as u32)) as i32;
    }

    let var1 = ((calib.par_p9 as i32) * (((press_comp >> 3) * (press_comp >> 3)) >> 13)) >> 12;
    let var2 = ((press_comp >> 2) * (calib.par_p8 as i32)) >> 13;
    let var3 = ((press_comp >> 8)
        * (press_comp >> 8)
        * (press_comp >> 8)
        * (calib.par_p10 as i32))
        >> 17;
    press_comp += (var1 + var2 + var3 + ((calib.par_p7 as i32) << 7)) >> 4;

    let pressure = press_comp as u32;
    if !(BME680_PRESSURE_MIN..=BME680_PRESSURE_MAX).contains(&pressure) {
        return Err(Bme680Error::RangeError {
            quantity: "pressure",
            value: press_comp as i64,
            min: BME680_PRESSURE_MIN as i64,
            max: BME680_PRESSURE_MAX as i64,
        });
    }
    Ok(pressure)
}

/// Compensates a raw 16-bit humidity code into milli-percent relative
/// humidity, consuming the compensated temperature.
pub fn calc_humidity(humidity_raw: u16, temp_comp: i32, calib: &CalibData) -> Result<u32, Bme680Error> {
    let var1 = (humidity_raw as i32)
        - ((calib.par_h1 as i32) << 4)
        - (((temp_comp * (calib.par_h3 as i32)) / 100) >> 1);
    let var2 = ((calib.par_h2 as i32)
        * (((temp_comp * (calib.par_h4 as i32)) / 100)
            + (((temp_comp * ((temp_comp * (calib.par_h5 as i32)) / 100)) >> 6) / 100)
            + (1 << 14)))
        >> 10;
    let var3 = var1 * var2;
    let var4 = (((calib.par_h6 as i32) << 7) + ((temp_comp * (calib.par_h7 as i32)) / 100)) >> 4;
    let var5 = ((var3 >> 14) * (var3 >> 14)) >> 10;
    let var6 = (var4 * var5) >> 1;
    let hum_comp = (((var3 + var6) >> 10) * 1000) >> 12;
    if !(BME680_HUMIDITY_MIN..=BME680_HUMIDITY_MAX).contains(&hum_comp) {
        return Err(Bme680Error::RangeError {
            quantity: "humidity",
            value: hum_comp as i64,
            min: BME680_HUMIDITY_MIN as i64,
            max: BME680_HUMIDITY_MAX as i64,
        });
    }
    Ok(hum_comp as u32)
}

/// Converts a raw 10-bit gas code and its 4-bit range into a resistance in
/// Ohm. Validity is carried by the raw status bits, there is no range
/// check on the result.
pub fn calc_gas_resistance(gas_adc: u16, gas_range: u8, calib: &CalibData) -> u32 {
    let range = (gas_range & 0x0f) as usize;
    let var1 = ((1340 + (5 * (calib.range_sw_err as i64))) * (GAS_RANGE_LOOKUP_1[range] as i64))
        >> 16;
    let var2 = ((gas_adc as i64) << 15) - (1 << 24) + var1;
    let var3 = ((GAS_RANGE_LOOKUP_2[range] as i64) * var1) >> 9;
    ((var3 + (var2 >> 1)) / var2) as u32
}

/// Derives the 8-bit heater resistance register code from the target plate
/// temperature and the current ambient estimate. Targets above 400 C are
/// capped to protect the heater plate.
pub fn calc_res_heat(target_temp: i32, ambient_temp: i32, calib: &CalibData) -> u8 {
    let target_temp = target_temp.min(BME680_HEATER_TEMP_MAX);
    let var1 = ((ambient_temp * (calib.par_g3 as i32)) / 10) << 8;
    let var2 = ((calib.par_g1 as i32) + 784)
        * ((((((calib.par_g2 as i32) + 154009) * target_temp * 5) / 100) + 3276800) / 10);
    let var3 = var1 + (var2 >> 1);
    let var4 = var3 / ((calib.res_heat_range as i32) + 4);
    let var5 = (131 * (calib.res_heat_val as i32)) + 65536;
    let res_heat_x100 = ((var4 / var5) - 250) * 34;
    ((res_heat_x100 + 50) / 100) as u8
}

/// Encodes a heating duration in milliseconds into the gas_wait register
/// format: a 6-bit mantissa and a 2-bit multiplication factor. Durations
/// of 0xfc0 (4032 ms) and above saturate to 0xff.
pub fn calc_gas_wait(duration_ms: u16) -> u8 {
    if duration_ms >= BME680_GAS_WAIT_SATURATION {
        return 0xff;
    }
    let mut duration = duration_ms;
    let mut factor: u8 = 0;
    while duration > BME680_GAS_WAIT_MANTISSA_MAX {
        duration /= 4;
        factor += 1;
    }
    (duration as u8) + (factor << BME680_GAS_WAIT_FACTOR_SHL)
}

/// Inverse of [`calc_gas_wait`]: expands the packed register byte back
/// into milliseconds.
pub fn decode_gas_wait(code: u8) -> u16 {
    let mantissa = (code & (BME680_GAS_WAIT_MANTISSA_MAX as u8)) as u16;
    let factor = code >> BME680_GAS_WAIT_FACTOR_SHL;
    mantissa << (2 * factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bme680::bme680_calib::test_support::calib_fixture;

    #[test]
    fn temperature_mid_range_code() {
        let calib = calib_fixture();
        let (temp_comp, t_fine) = calc_temperature(496768, &calib).unwrap();
        assert_eq!(temp_comp, 2504);
        assert_eq!(t_fine, 128189);
    }

    #[test]
    fn temperature_out_of_band_is_a_range_error() {
        // -- an adversarial coefficient set pushing the result far above
        // -- the 85 C band must error, not wrap or truncate
        let mut calib = calib_fixture();
        calib.par_t1 = 0;
        calib.par_t2 = 12500;
        calib.par_t3 = 0;
        let result = calc_temperature(600000, &calib);
        match result {
            Err(Bme680Error::RangeError { quantity, value, .. }) => {
                assert_eq!(quantity, "temperature");
                assert!(value > 8500);
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }

    // -- the float rendition of the pressure compensation, used as the
    // -- reference the fixed-point path is checked against
    fn pressure_reference(pressure_raw: u32, t_fine: f64, calib: &CalibData) -> f64 {
        let par_p1 = calib.par_p1 as f64;
        let par_p2 = calib.par_p2 as f64;
        let par_p3 = calib.par_p3 as f64;
        let par_p4 = calib.par_p4 as f64;
        let par_p5 = calib.par_p5 as f64;
        let par_p6 = calib.par_p6 as f64;
        let par_p7 = calib.par_p7 as f64;
        let par_p8 = calib.par_p8 as f64;
        let par_p9 = calib.par_p9 as f64;
        let par_p10 = calib.par_p10 as f64;
        let var1 = (t_fine / 2.0) - 64000.0;
        let var2 = var1 * var1 * (par_p6 / 131072.0);
        let var2 = var2 + (var1 * par_p5 * 2.0);
        let var2 = (var2 / 4.0) + (par_p4 * 65536.0);
        let var1 = (((par_p3 * var1 * var1) / 16384.0) + (par_p2 * var1)) / 524288.0;
        let var1 = (1.0 + (var1 / 32768.0)) * par_p1;
        let press_comp = 1048576.0 - (pressure_raw as f64);
        let press_comp = ((press_comp - (var2 / 4096.0)) * 6250.0) / var1;
        let var1 = (par_p9 * press_comp * press_comp) / 2147483648.0;
        let var2 = press_comp * (par_p8 / 32768.0);
        let var3 =
            (press_comp / 256.0) * (press_comp / 256.0) * (press_comp / 256.0) * (par_p10 / 131072.0);
        press_comp + (var1 + var2 + var3 + (par_p7 * 128.0)) / 16.0
    }

    #[test]
    fn pressure_known_vector() {
        let calib = calib_fixture();
        let pressure = calc_pressure(360610, 128189, &calib).unwrap();
        assert_eq!(pressure, 100062);
    }

    #[test]
    fn pressure_overflow_branch_agrees_with_reference() {
        let calib = calib_fixture();
        let t_fine = 128189;
        // -- raw codes straddling the 1 << 30 intermediate threshold:
        // -- 592000 lands above it, 594000 below
        for pressure_raw in [360610u32, 592000, 594000] {
            let fixed = calc_pressure(pressure_raw, t_fine, &calib).unwrap();
            let float = pressure_reference(pressure_raw, t_fine as f64, &calib);
            let diff = (fixed as f64 - float).abs();
            assert!(
                diff < 200.0,
                "raw {pressure_raw}: fixed {fixed} vs reference {float}"
            );
        }
    }

    #[test]
    fn humidity_known_vector() {
        let calib = calib_fixture();
        let humidity = calc_humidity(21000, 2504, &calib).unwrap();
        assert_eq!(humidity, 50394);
    }

    #[test]
    fn humidity_above_hundred_percent_is_a_range_error() {
        let calib = calib_fixture();
        let result = calc_humidity(35200, 2504, &calib);
        match result {
            Err(Bme680Error::RangeError { quantity, value, .. }) => {
                assert_eq!(quantity, "humidity");
                assert!(value > 100000);
            }
            other => panic!("expected range error, got {other:?}"),
        }
    }

    #[test]
    fn gas_resistance_known_vector() {
        // -- adc 512 cancels the offset term, leaving the range scale:
        // -- lookup2[0] / 512 = 8 MOhm
        let calib = calib_fixture();
        assert_eq!(calc_gas_resistance(512, 0, &calib), 8000000);
    }

    #[test]
    fn gas_resistance_drops_with_higher_adc() {
        let calib = calib_fixture();
        let low = calc_gas_resistance(200, 5, &calib);
        let high = calc_gas_resistance(900, 5, &calib);
        assert!(low > high);
    }

    #[test]
    fn res_heat_code_for_known_target() {
        let calib = calib_fixture();
        assert_eq!(calc_res_heat(300, 25, &calib), 110);
    }

    #[test]
    fn res_heat_target_capped_at_400() {
        let calib = calib_fixture();
        assert_eq!(calc_res_heat(400, 25, &calib), 137);
        assert_eq!(calc_res_heat(500, 25, &calib), calc_res_heat(400, 25, &calib));
    }

    #[test]
    fn gas_wait_saturates() {
        assert_eq!(calc_gas_wait(0x0fc0), 0xff);
        assert_eq!(calc_gas_wait(4100), 0xff);
        assert_eq!(calc_gas_wait(u16::MAX), 0xff);
        // -- 0xff decodes to the largest representable duration
        assert_eq!(decode_gas_wait(0xff), 4032);
    }

    #[test]
    fn gas_wait_known_encodings() {
        assert_eq!(calc_gas_wait(0), 0x00);
        assert_eq!(calc_gas_wait(63), 0x3f);
        // -- 100 ms = 25 * 4, factor 1
        assert_eq!(calc_gas_wait(100), 0x40 | 25);
        assert_eq!(decode_gas_wait(0x40 | 25), 100);
    }

    #[test]
    fn gas_wait_round_trips_below_saturation() {
        for duration in 0..BME680_GAS_WAIT_SATURATION {
            let code = calc_gas_wait(duration);
            let decoded = decode_gas_wait(code);
            let step = 1u16 << (2 * (code >> BME680_GAS_WAIT_FACTOR_SHL));
            // -- encoding truncates to the active step size; values on a
            // -- step boundary round-trip exactly
            assert!(decoded <= duration);
            assert!(duration - decoded < step);
            assert_eq!(calc_gas_wait(decoded), code);
        }
    }
}
