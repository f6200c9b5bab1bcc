#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::bme680::bme680_calc::{
    calc_gas_resistance, calc_gas_wait, calc_humidity, calc_pressure, calc_res_heat,
    calc_temperature,
};
use crate::bme680::bme680_calib::{
    CalibData, BME680_CALIB_BLOCK_1_LEN, BME680_CALIB_COEFF_LEN, BME680_CALIB_HEATER_LEN,
};
use crate::bme680::bme680_enums::*;
use crate::busio::{self, RegisterBus};
use crate::errors::Bme680Error;

const BME680_CHIP_ID: u8 = 0x61;

// -- control, status and result registers
const BME680_REG_MEAS_STATUS_0: u8 = 0x1d;
const BME680_REG_RES_HEAT_BASE: u8 = 0x5a;
const BME680_REG_GAS_WAIT_BASE: u8 = 0x64;
const BME680_REG_CTRL_GAS_1: u8 = 0x71;
const BME680_REG_CTRL_HUM: u8 = 0x72;
const BME680_REG_CTRL_MEAS: u8 = 0x74;
const BME680_REG_CONFIG: u8 = 0x75;
const BME680_REG_CHIP_ID: u8 = 0xd0;
const BME680_REG_RESET: u8 = 0xe0;

// -- registers for calibration data
const BME680_REG_CALIB_BLOCK_1: u8 = 0x89;
const BME680_REG_CALIB_BLOCK_2: u8 = 0xe1;
const BME680_REG_CALIB_HEATER: u8 = 0x00;

// -- length of the field data block at 0x1d
const BME680_FIELD_LEN: usize = 15;

// -- commands
const BME680_COMMAND_SOFT_RESET: u8 = 0xb6;

// -- startup and poll timing
const BME680_STARTUP_DELAY_MS: u32 = 2;
const BME680_RESET_POLL_ATTEMPTS: u8 = 5;
const BME680_POLL_DELAY_MS: u32 = 10;
const BME680_MAX_POLL_ATTEMPTS: u8 = 10;

// -- masks and bits for the meas_status_0 register
const BME680_MEAS_STATUS_0_NEW_DATA_BIT: u8 = 0x80;
const BME680_MEAS_STATUS_0_GAS_MEASURING_BIT: u8 = 0x40;
const BME680_MEAS_STATUS_0_MEASURING_BIT: u8 = 0x20;
const BME680_MEAS_STATUS_0_GAS_MEAS_INDEX_MASK: u8 = 0x0f;

// -- masks and bits for the gas lsb field byte
const BME680_GAS_VALID_BIT: u8 = 0x20;
const BME680_HEAT_STAB_BIT: u8 = 0x10;
const BME680_GAS_RANGE_MASK: u8 = 0x0f;

// -- shifts and masks for the control registers
const BME680_CTRL_HUM_OS_MASK: u8 = 0x07;
const BME680_CTRL_MEAS_TEMPERATURE_SHL: u8 = 5;
const BME680_CTRL_MEAS_PRESSURE_SHL: u8 = 2;
const BME680_CTRL_MEAS_MODE_MASK: u8 = 0x03;
const BME680_CONFIG_IIR_FILTER_SHL: u8 = 2;
const BME680_CONFIG_IIR_FILTER_MASK: u8 = 0x1c;
const BME680_CTRL_GAS_1_RUN_GAS_BIT: u8 = 0x10;
const BME680_CTRL_GAS_1_NB_CONV_MASK: u8 = 0x0f;

/// States of one forced-mode measurement cycle. `DataReady` and
/// `TimedOut` are terminal outcomes; like `Idle` they permit starting a
/// fresh cycle.
#[derive(Clone, Debug, PartialEq)]
pub enum Bme680CycleState {
    Idle,
    Configuring,
    Triggered,
    Polling,
    DataReady,
    TimedOut,
}

/// Heater section of the measurement configuration.
#[derive(Clone, Debug)]
pub struct Bme680GasConfig {
    // -- target heater plate temperature in degrees Celsius, capped at 400
    pub heater_temp: u16,
    // -- heating duration in milliseconds, saturating at 4032
    pub heater_duration_ms: u16,
    pub heater_profile: Bme680HeaterProfile,
}

/// Measurement configuration owned by the device handle. Set once at
/// init and mutable by the owning caller between cycles; the driver only
/// derives heater register values from it.
#[derive(Clone, Debug)]
pub struct Bme680Config {
    pub humidity_osr: Bme680OverSampling,
    pub pressure_osr: Bme680OverSampling,
    pub temperature_osr: Bme680OverSampling,
    pub irr_filter: Bme680IrrFilter,
    // -- ambient temperature estimate in degrees Celsius, feeds the
    // -- heater resistance formula
    pub ambient_temp: i32,
    // -- None disables the gas measurement entirely
    pub gas_config: Option<Bme680GasConfig>,
}

#[derive(Debug)]
pub struct Bme680MeasStatus {
    pub new_data: bool,
    pub gas_measuring: bool,
    pub measuring: bool,
    pub gas_meas_index: u8,
}

/// Raw ADC codes and status bits of one completed measurement cycle.
/// Produced fresh per cycle, consumed once by the compensation step.
#[derive(Debug)]
pub struct Bme680RawData {
    pub pressure_raw: u32,
    pub temperature_raw: u32,
    pub humidity_raw: u16,
    pub gas_adc: u16,
    pub gas_range: u8,
    pub gas_valid: bool,
    pub heat_stab: bool,
    pub gas_meas_index: u8,
    pub meas_index: u8,
}

/// Compensated measurement in the device's native output units:
/// centi-degrees Celsius, Pascal, milli-percent relative humidity, Ohm.
#[derive(Debug)]
pub struct Bme680Reading {
    pub temperature: i32,
    pub pressure: u32,
    pub humidity: u32,
    pub gas_resistance: u32,
    pub gas_valid: bool,
    pub heat_stab: bool,
    pub meas_index: u8,
}

/// Device handle, generic over the bus transport. Owns the calibration
/// data and configuration; the bus is used exclusively for this handle's
/// transactions.
pub struct BME680<B: RegisterBus> {
    // -- register transport, I2C or SPI
    bus: B,
    // -- measurement configuration
    config: Bme680Config,
    // -- chip id as read at init
    chip_id: u8,
    // -- calibration params, decoded once at init
    calib_data: CalibData,
    // -- forced-mode cycle state
    cycle_state: Bme680CycleState,
}

impl<B: RegisterBus> BME680<B> {
    /// Initializes the sensor: soft reset, chip id check, calibration
    /// read, then writes the measurement configuration.
    pub fn new(bus: B, config: Bme680Config) -> Result<BME680<B>, Bme680Error> {
        let mut bme680 = BME680 {
            bus,
            config,
            chip_id: 0,
            calib_data: CalibData::default(),
            cycle_state: Bme680CycleState::Idle,
        };
        // -- the device is in an unknown state, reset before identifying it
        bme680.soft_reset()?;
        let chip_id = bme680.bus.read_register(BME680_REG_CHIP_ID)?;
        if chip_id != BME680_CHIP_ID {
            return Err(Bme680Error::UnexpectedDeviceId {
                found: chip_id,
                expected: BME680_CHIP_ID,
            });
        }
        debug!("Got chip id: {chip_id:#x}");
        bme680.chip_id = chip_id;
        bme680.calib_data = bme680.read_calib_data()?;
        debug!("Got calibration data: {:#?}", bme680.calib_data);
        bme680.write_measurement_config()?;
        Ok(bme680)
    }

    pub fn get_chip_id(&self) -> u8 {
        self.chip_id
    }

    pub fn get_calib_data(&self) -> &CalibData {
        &self.calib_data
    }

    pub fn get_cycle_state(&self) -> Bme680CycleState {
        self.cycle_state.clone()
    }

    pub fn get_config(&self) -> &Bme680Config {
        &self.config
    }

    /// Replaces the measurement configuration; applied on the next cycle.
    pub fn set_config(&mut self, config: Bme680Config) {
        self.config = config;
    }

    /// Updates the ambient temperature estimate the heater resistance is
    /// derived from. Callers usually feed the last compensated
    /// temperature back here.
    pub fn set_ambient_temp(&mut self, celsius: i32) {
        self.config.ambient_temp = celsius;
    }

    /// Abandons an in-flight cycle. The device finishes its conversion
    /// on its own and falls back to sleep; restarting from `Idle` later
    /// is harmless.
    pub fn reset_cycle(&mut self) {
        self.cycle_state = Bme680CycleState::Idle;
    }

    pub fn soft_reset(&mut self) -> Result<(), Bme680Error> {
        debug!("Initiating soft reset");
        self.bus
            .write_register(BME680_REG_RESET, BME680_COMMAND_SOFT_RESET)?;
        busio::delay(BME680_STARTUP_DELAY_MS);
        // -- the reset register reads 0 once the device has come back up
        for _attempt in 0..BME680_RESET_POLL_ATTEMPTS {
            if self.bus.read_register(BME680_REG_RESET)? == 0 {
                self.cycle_state = Bme680CycleState::Idle;
                return Ok(());
            }
            busio::delay(BME680_STARTUP_DELAY_MS);
        }
        Err(Bme680Error::Communication(std::io::Error::other(
            "soft reset did not complete",
        )))
    }

    fn read_calib_data(&mut self) -> Result<CalibData, Bme680Error> {
        let mut coeff: [u8; BME680_CALIB_COEFF_LEN] = [0; BME680_CALIB_COEFF_LEN];
        self.bus
            .read_registers(BME680_REG_CALIB_BLOCK_1, &mut coeff[..BME680_CALIB_BLOCK_1_LEN])?;
        self.bus
            .read_registers(BME680_REG_CALIB_BLOCK_2, &mut coeff[BME680_CALIB_BLOCK_1_LEN..])?;
        let mut heater: [u8; BME680_CALIB_HEATER_LEN] = [0; BME680_CALIB_HEATER_LEN];
        self.bus.read_registers(BME680_REG_CALIB_HEATER, &mut heater)?;
        Ok(CalibData::decode(&coeff, &heater))
    }

    pub fn get_meas_status(&mut self) -> Result<Bme680MeasStatus, Bme680Error> {
        let reg_val = self.bus.read_register(BME680_REG_MEAS_STATUS_0)?;
        let new_data = (reg_val & BME680_MEAS_STATUS_0_NEW_DATA_BIT) > 0;
        let gas_measuring = (reg_val & BME680_MEAS_STATUS_0_GAS_MEASURING_BIT) > 0;
        let measuring = (reg_val & BME680_MEAS_STATUS_0_MEASURING_BIT) > 0;
        let gas_meas_index = reg_val & BME680_MEAS_STATUS_0_GAS_MEAS_INDEX_MASK;
        Ok(Bme680MeasStatus {
            new_data,
            gas_measuring,
            measuring,
            gas_meas_index,
        })
    }

    /// Starts one forced-mode cycle: writes the measurement
    /// configuration and sets the power mode to forced. Rejected while a
    /// cycle is in flight on this handle.
    pub fn trigger_measurement(&mut self) -> Result<(), Bme680Error> {
        match self.cycle_state {
            Bme680CycleState::Configuring
            | Bme680CycleState::Triggered
            | Bme680CycleState::Polling => return Err(Bme680Error::MeasurementInProgress),
            Bme680CycleState::Idle | Bme680CycleState::DataReady | Bme680CycleState::TimedOut => {}
        }
        self.cycle_state = Bme680CycleState::Configuring;
        let result = self
            .write_measurement_config()
            .and_then(|_| self.set_forced_mode());
        match result {
            Ok(()) => {
                self.cycle_state = Bme680CycleState::Triggered;
                Ok(())
            }
            Err(err) => {
                self.cycle_state = Bme680CycleState::Idle;
                Err(err)
            }
        }
    }

    /// Polls for the new-data bit and reads the raw field block. The bus
    /// is released between polls; only this loop retries, with its fixed
    /// budget of attempts.
    pub fn wait_for_data(&mut self) -> Result<Bme680RawData, Bme680Error> {
        self.cycle_state = Bme680CycleState::Polling;
        for attempt in 1..=BME680_MAX_POLL_ATTEMPTS {
            let status = match self.get_meas_status() {
                Ok(status) => status,
                Err(err) => {
                    self.cycle_state = Bme680CycleState::Idle;
                    return Err(err);
                }
            };
            if status.new_data {
                debug!("New data after {attempt} poll attempts");
                match self.read_raw_data() {
                    Ok(raw_data) => {
                        self.cycle_state = Bme680CycleState::DataReady;
                        return Ok(raw_data);
                    }
                    Err(err) => {
                        self.cycle_state = Bme680CycleState::Idle;
                        return Err(err);
                    }
                }
            }
            busio::delay(BME680_POLL_DELAY_MS);
        }
        warn!("No new data after {BME680_MAX_POLL_ATTEMPTS} poll attempts");
        self.cycle_state = Bme680CycleState::TimedOut;
        Err(Bme680Error::NoNewData {
            attempts: BME680_MAX_POLL_ATTEMPTS,
        })
    }

    /// Runs one complete forced-mode cycle and compensates the result.
    pub fn measure(&mut self) -> Result<Bme680Reading, Bme680Error> {
        self.trigger_measurement()?;
        let raw_data = self.wait_for_data()?;
        self.compensate(raw_data)
    }

    /// Maps one raw sample into physical units using the calibration
    /// coefficients. Gas validity is reported alongside the value, never
    /// suppressed.
    pub fn compensate(&self, raw_data: Bme680RawData) -> Result<Bme680Reading, Bme680Error> {
        let (temperature, t_fine) = calc_temperature(raw_data.temperature_raw, &self.calib_data)?;
        let pressure = calc_pressure(raw_data.pressure_raw, t_fine, &self.calib_data)?;
        let humidity = calc_humidity(raw_data.humidity_raw, temperature, &self.calib_data)?;
        let gas_resistance =
            calc_gas_resistance(raw_data.gas_adc, raw_data.gas_range, &self.calib_data);
        Ok(Bme680Reading {
            temperature,
            pressure,
            humidity,
            gas_resistance,
            gas_valid: raw_data.gas_valid,
            heat_stab: raw_data.heat_stab,
            meas_index: raw_data.meas_index,
        })
    }

    /// Burst-reads the 15-byte field block and splits it into raw ADC
    /// codes with explicit shifts and masks per field.
    pub fn read_raw_data(&mut self) -> Result<Bme680RawData, Bme680Error> {
        let mut reg_data: [u8; BME680_FIELD_LEN] = [0; BME680_FIELD_LEN];
        self.bus
            .read_registers(BME680_REG_MEAS_STATUS_0, &mut reg_data)?;
        // -- byte 0: status bits and gas measurement index, byte 1: index
        // -- of the running measurement
        let gas_meas_index = reg_data[0] & BME680_MEAS_STATUS_0_GAS_MEAS_INDEX_MASK;
        let meas_index = reg_data[1];
        // -- bytes 2..=4: 20-bit pressure code, msb / lsb / xlsb nibble
        let data_msb = (reg_data[2] as u32) << 12;
        let data_lsb = (reg_data[3] as u32) << 4;
        let data_xlsb = (reg_data[4] as u32) >> 4;
        let pressure_raw = data_msb | data_lsb | data_xlsb;
        // -- bytes 5..=7: 20-bit temperature code
        let data_msb = (reg_data[5] as u32) << 12;
        let data_lsb = (reg_data[6] as u32) << 4;
        let data_xlsb = (reg_data[7] as u32) >> 4;
        let temperature_raw = data_msb | data_lsb | data_xlsb;
        // -- bytes 8..=9: 16-bit humidity code
        let humidity_raw = ((reg_data[8] as u16) << 8) | (reg_data[9] as u16);
        // -- bytes 13..=14: 10-bit gas code, 4-bit range and validity bits
        let gas_adc = ((reg_data[13] as u16) << 2) | ((reg_data[14] as u16) >> 6);
        let gas_range = reg_data[14] & BME680_GAS_RANGE_MASK;
        let gas_valid = (reg_data[14] & BME680_GAS_VALID_BIT) > 0;
        let heat_stab = (reg_data[14] & BME680_HEAT_STAB_BIT) > 0;
        Ok(Bme680RawData {
            pressure_raw,
            temperature_raw,
            humidity_raw,
            gas_adc,
            gas_range,
            gas_valid,
            heat_stab,
            gas_meas_index,
            meas_index,
        })
    }

    /// Writes oversampling, filter and heater registers from the current
    /// configuration. The power mode bits are left untouched.
    fn write_measurement_config(&mut self) -> Result<(), Bme680Error> {
        // -- humidity oversampling, bits 0..=2 of ctrl_hum
        let reg_val = self.bus.read_register(BME680_REG_CTRL_HUM)?;
        let reg_val = (reg_val & !BME680_CTRL_HUM_OS_MASK) | self.config.humidity_osr.value();
        debug!("Setting humidity oversampling to {reg_val:#010b}");
        self.bus.write_register(BME680_REG_CTRL_HUM, reg_val)?;
        // -- temperature os bits 5..=7 and pressure os bits 2..=4 of
        // -- ctrl_meas, mode bits kept at sleep
        let reg_val = self.bus.read_register(BME680_REG_CTRL_MEAS)?;
        let reg_val = (reg_val & BME680_CTRL_MEAS_MODE_MASK)
            | (self.config.temperature_osr.value() << BME680_CTRL_MEAS_TEMPERATURE_SHL)
            | (self.config.pressure_osr.value() << BME680_CTRL_MEAS_PRESSURE_SHL);
        debug!("Setting pressure and temperature oversampling to {reg_val:#010b}");
        self.bus.write_register(BME680_REG_CTRL_MEAS, reg_val)?;
        // -- IIR filter, bits 2..=4 of config
        let reg_val = self.bus.read_register(BME680_REG_CONFIG)?;
        let reg_val = (reg_val & !BME680_CONFIG_IIR_FILTER_MASK)
            | (self.config.irr_filter.value() << BME680_CONFIG_IIR_FILTER_SHL);
        debug!("Setting IRR filter to {reg_val:#010b}");
        self.bus.write_register(BME680_REG_CONFIG, reg_val)?;
        // -- heater set point and run gas bit
        match self.config.gas_config.as_ref() {
            Some(gas_config) => {
                let profile = gas_config.heater_profile.value();
                let res_heat = calc_res_heat(
                    gas_config.heater_temp as i32,
                    self.config.ambient_temp,
                    &self.calib_data,
                );
                let gas_wait = calc_gas_wait(gas_config.heater_duration_ms);
                debug!(
                    "Setting heater set point {profile}: res_heat {res_heat:#04x}, gas_wait {gas_wait:#04x}"
                );
                self.bus
                    .write_register(BME680_REG_RES_HEAT_BASE + profile, res_heat)?;
                self.bus
                    .write_register(BME680_REG_GAS_WAIT_BASE + profile, gas_wait)?;
                let reg_val = self.bus.read_register(BME680_REG_CTRL_GAS_1)?;
                let reg_val = (reg_val & !BME680_CTRL_GAS_1_NB_CONV_MASK)
                    | profile
                    | BME680_CTRL_GAS_1_RUN_GAS_BIT;
                debug!("Enabling run gas with nb_conv {profile}");
                self.bus.write_register(BME680_REG_CTRL_GAS_1, reg_val)?;
            }
            None => {
                let reg_val = self.bus.read_register(BME680_REG_CTRL_GAS_1)?;
                let reg_val = reg_val & !BME680_CTRL_GAS_1_RUN_GAS_BIT;
                debug!("Disabling run gas");
                self.bus.write_register(BME680_REG_CTRL_GAS_1, reg_val)?;
            }
        }
        Ok(())
    }

    /// Requests one forced-mode conversion. The device returns to sleep
    /// on its own once the conversion finishes.
    fn set_forced_mode(&mut self) -> Result<(), Bme680Error> {
        let reg_val = self.bus.read_register(BME680_REG_CTRL_MEAS)?;
        let reg_val = (reg_val & !BME680_CTRL_MEAS_MODE_MASK)
            | Bme680SensorPowerMode::Forced.value();
        debug!("Setting power mode {}", Bme680SensorPowerMode::Forced);
        self.bus.write_register(BME680_REG_CTRL_MEAS, reg_val)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bme680::bme680_calib::test_support::{coeff_fixture, heater_fixture};
    use std::collections::VecDeque;

    // -- field block matching the calibration fixture: raw codes decoding
    // -- to 25.04 C, 100062 Pa, 50.394 %, 8 MOhm
    const FIELD_FIXTURE: [u8; BME680_FIELD_LEN] = [
        0x80, 0x00, 0x58, 0x0a, 0x20, 0x79, 0x48, 0x00, 0x52, 0x08, 0x00, 0x00, 0x00, 0x80, 0x30,
    ];

    // -- scripted bus: canned responses per register, all writes recorded
    struct ScriptedBus {
        chip_id: u8,
        status_script: VecDeque<u8>,
        field_data: [u8; BME680_FIELD_LEN],
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl ScriptedBus {
        fn new() -> ScriptedBus {
            ScriptedBus {
                chip_id: BME680_CHIP_ID,
                status_script: VecDeque::new(),
                field_data: FIELD_FIXTURE,
                writes: Vec::new(),
            }
        }

        fn wrote(&self, reg: u8, value: u8) -> bool {
            self.writes
                .iter()
                .any(|(written_reg, data)| *written_reg == reg && data.len() == 1 && data[0] == value)
        }
    }

    impl RegisterBus for ScriptedBus {
        fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), std::io::Error> {
            match (reg, data.len()) {
                (BME680_REG_RESET, 1) => data[0] = 0,
                (BME680_REG_CHIP_ID, 1) => data[0] = self.chip_id,
                (BME680_REG_CALIB_BLOCK_1, BME680_CALIB_BLOCK_1_LEN) => {
                    data.copy_from_slice(&coeff_fixture()[..BME680_CALIB_BLOCK_1_LEN])
                }
                (BME680_REG_CALIB_BLOCK_2, _) => {
                    data.copy_from_slice(&coeff_fixture()[BME680_CALIB_BLOCK_1_LEN..])
                }
                (BME680_REG_CALIB_HEATER, BME680_CALIB_HEATER_LEN) => {
                    data.copy_from_slice(&heater_fixture())
                }
                (BME680_REG_MEAS_STATUS_0, 1) => {
                    data[0] = self.status_script.pop_front().unwrap_or(0)
                }
                (BME680_REG_MEAS_STATUS_0, BME680_FIELD_LEN) => {
                    data.copy_from_slice(&self.field_data)
                }
                _ => data.fill(0),
            }
            Ok(())
        }

        fn write_registers(&mut self, reg: u8, data: &[u8]) -> Result<(), std::io::Error> {
            self.writes.push((reg, data.to_vec()));
            Ok(())
        }
    }

    fn test_config() -> Bme680Config {
        Bme680Config {
            humidity_osr: Bme680OverSampling::Oversampling1x,
            pressure_osr: Bme680OverSampling::Oversampling16x,
            temperature_osr: Bme680OverSampling::Oversampling2x,
            irr_filter: Bme680IrrFilter::Coef3,
            ambient_temp: 25,
            gas_config: Some(Bme680GasConfig {
                heater_temp: 300,
                heater_duration_ms: 100,
                heater_profile: Bme680HeaterProfile::SetPoint1,
            }),
        }
    }

    #[test]
    fn init_rejects_unexpected_chip_id() {
        let mut bus = ScriptedBus::new();
        bus.chip_id = 0x58;
        match BME680::new(bus, test_config()) {
            Err(Bme680Error::UnexpectedDeviceId { found, expected }) => {
                assert_eq!(found, 0x58);
                assert_eq!(expected, BME680_CHIP_ID);
            }
            _ => panic!("expected unexpected-device-id error"),
        }
    }

    #[test]
    fn init_writes_heater_registers_for_selected_set_point() {
        let bus = ScriptedBus::new();
        let bme680 = BME680::new(bus, test_config()).unwrap();
        // -- res_heat code 110 for 300 C at 25 C ambient, gas_wait 100 ms
        // -- encodes as factor 1, mantissa 25; both land in slot 1
        assert!(bme680.bus.wrote(BME680_REG_RES_HEAT_BASE + 1, 110));
        assert!(bme680.bus.wrote(BME680_REG_GAS_WAIT_BASE + 1, 0x40 | 25));
        // -- run gas enabled with nb_conv selecting set point 1
        assert!(bme680
            .bus
            .wrote(BME680_REG_CTRL_GAS_1, BME680_CTRL_GAS_1_RUN_GAS_BIT | 1));
    }

    #[test]
    fn measure_compensates_full_cycle() {
        let mut bus = ScriptedBus::new();
        bus.status_script.push_back(BME680_MEAS_STATUS_0_NEW_DATA_BIT);
        let mut bme680 = BME680::new(bus, test_config()).unwrap();
        let reading = bme680.measure().unwrap();
        assert_eq!(reading.temperature, 2504);
        assert_eq!(reading.pressure, 100062);
        assert_eq!(reading.humidity, 50394);
        assert_eq!(reading.gas_resistance, 8000000);
        assert!(reading.gas_valid);
        assert!(reading.heat_stab);
        assert_eq!(reading.meas_index, 0);
        assert_eq!(bme680.get_cycle_state(), Bme680CycleState::DataReady);
    }

    #[test]
    fn data_ready_on_last_permitted_poll() {
        let mut bus = ScriptedBus::new();
        for _ in 0..9 {
            bus.status_script.push_back(0);
        }
        bus.status_script.push_back(BME680_MEAS_STATUS_0_NEW_DATA_BIT);
        let mut bme680 = BME680::new(bus, test_config()).unwrap();
        bme680.trigger_measurement().unwrap();
        let raw_data = bme680.wait_for_data().unwrap();
        assert_eq!(raw_data.temperature_raw, 496768);
        assert_eq!(raw_data.pressure_raw, 360610);
        assert_eq!(raw_data.humidity_raw, 21000);
        assert_eq!(raw_data.gas_adc, 512);
        assert_eq!(raw_data.gas_range, 0);
        assert_eq!(bme680.get_cycle_state(), Bme680CycleState::DataReady);
    }

    #[test]
    fn poll_budget_exhaustion_times_out() {
        // -- empty script: every status poll reads 0, never new data
        let bus = ScriptedBus::new();
        let mut bme680 = BME680::new(bus, test_config()).unwrap();
        bme680.trigger_measurement().unwrap();
        match bme680.wait_for_data() {
            Err(Bme680Error::NoNewData { attempts }) => {
                assert_eq!(attempts, BME680_MAX_POLL_ATTEMPTS)
            }
            _ => panic!("expected no-new-data error"),
        }
        assert_eq!(bme680.get_cycle_state(), Bme680CycleState::TimedOut);
        // -- the outcome is terminal, a fresh cycle may start
        bme680.trigger_measurement().unwrap();
    }

    #[test]
    fn second_trigger_while_in_flight_is_rejected() {
        let bus = ScriptedBus::new();
        let mut bme680 = BME680::new(bus, test_config()).unwrap();
        bme680.trigger_measurement().unwrap();
        assert_eq!(bme680.get_cycle_state(), Bme680CycleState::Triggered);
        match bme680.trigger_measurement() {
            Err(Bme680Error::MeasurementInProgress) => {}
            _ => panic!("expected in-progress rejection"),
        }
        // -- abandoning the cycle frees the handle again
        bme680.reset_cycle();
        bme680.trigger_measurement().unwrap();
    }

    #[test]
    fn run_gas_cleared_when_gas_disabled() {
        let bus = ScriptedBus::new();
        let mut config = test_config();
        config.gas_config = None;
        let bme680 = BME680::new(bus, config).unwrap();
        assert!(bme680.bus.wrote(BME680_REG_CTRL_GAS_1, 0));
        assert!(!bme680
            .bus
            .wrote(BME680_REG_CTRL_GAS_1, BME680_CTRL_GAS_1_RUN_GAS_BIT | 1));
    }
}
