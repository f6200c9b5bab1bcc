use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use std::path::Path;
use std::process::ExitCode;
use std::{thread, time};

use bme680_linux::bme680::*;
use bme680_linux::busio::SpiAdapter;
use bme680_linux::errors::Bme680Error;

const EXIT_CODE_SET_CTR_C_HNDLR_FAILED: u8 = 0x02;
const EXIT_CODE_BME680_OPEN_BUS_FAILED: u8 = 0x71;
const EXIT_CODE_BME680_INIT_FAILED: u8 = 0x72;
const EXIT_CODE_BME680_MEASURE_FAILED: u8 = 0x73;

const MEASURING_DELAY_SEC: u64 = 5;
const DEFAULT_SPI_SPEED_HZ: u32 = 1_000_000;
const HEATER_TARGET_TEMP: u16 = 320;
const HEATER_DURATION_MS: u16 = 150;

#[derive(Parser)]
struct Args {
    // -- spidev device, e.g. /dev/spidev0.0, chip select is implied by
    // -- the device node
    bus_path: String,
    // -- spi clock speed in Hz
    #[arg(long, default_value_t = DEFAULT_SPI_SPEED_HZ)]
    speed_hz: u32,
}

fn main() -> ExitCode {
    // -- read .env file
    dotenv::dotenv().ok();
    // -- setup logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let now = Local::now();
    info!("Starting up: {now}");

    let args = Args::parse();
    let bus_path = args.bus_path;
    info!("Using spi device {bus_path} at {} Hz", args.speed_hz);

    // -- set handler for Ctrl-C
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, terminating...");
        std::process::exit(0);
    }) {
        error!("ERROR - Failed to set Ctrl-C handler: {err}");
        return ExitCode::from(EXIT_CODE_SET_CTR_C_HNDLR_FAILED);
    }

    info!("Initializing BME680");
    let bus_path = Path::new(&bus_path);
    let adapter = match SpiAdapter::open(bus_path, args.speed_hz) {
        Ok(adapter) => adapter,
        Err(err) => {
            error!("ERROR - Failed to open spi device: {err}");
            return ExitCode::from(EXIT_CODE_BME680_OPEN_BUS_FAILED);
        }
    };
    let config = Bme680Config {
        humidity_osr: Bme680OverSampling::Oversampling1x,
        pressure_osr: Bme680OverSampling::Oversampling16x,
        temperature_osr: Bme680OverSampling::Oversampling2x,
        irr_filter: Bme680IrrFilter::Coef3,
        ambient_temp: 20,
        gas_config: Some(Bme680GasConfig {
            heater_temp: HEATER_TARGET_TEMP,
            heater_duration_ms: HEATER_DURATION_MS,
            heater_profile: Bme680HeaterProfile::SetPoint0,
        }),
    };
    let mut bme680 = match BME680::new(adapter, config) {
        Ok(bme680) => bme680,
        Err(err) => {
            error!("ERROR - Failed to initialize BME680: {err}");
            return ExitCode::from(EXIT_CODE_BME680_INIT_FAILED);
        }
    };
    info!("Got chip id {:#04x}", bme680.get_chip_id());

    loop {
        let reading = match bme680.measure() {
            Ok(reading) => reading,
            Err(Bme680Error::NoNewData { attempts }) => {
                // -- transient, a fresh cycle may succeed
                warn!("No new data after {attempts} polls, retrying");
                let measuring_delay = time::Duration::from_millis(MEASURING_DELAY_SEC * 1000);
                thread::sleep(measuring_delay);
                continue;
            }
            Err(err) => {
                error!("ERROR - BME680 measurement failed: {err}");
                return ExitCode::from(EXIT_CODE_BME680_MEASURE_FAILED);
            }
        };
        info!(
            "Temperature {}.{:02} C",
            reading.temperature / 100,
            (reading.temperature % 100).abs()
        );
        info!("Pressure {} Pa", reading.pressure);
        info!(
            "Humidity {}.{:03} %",
            reading.humidity / 1000,
            reading.humidity % 1000
        );
        if reading.gas_valid && reading.heat_stab {
            info!("Gas resistance {} Ohm", reading.gas_resistance);
        } else {
            // -- reported but not trustworthy, the heater was not stable
            warn!(
                "Gas resistance {} Ohm (valid: {}, heater stable: {})",
                reading.gas_resistance, reading.gas_valid, reading.heat_stab
            );
        }

        // -- feed the measured temperature back as the ambient estimate
        // -- for the next heater cycle
        bme680.set_ambient_temp(reading.temperature / 100);

        // -- delay next measuring
        let measuring_delay = time::Duration::from_millis(MEASURING_DELAY_SEC * 1000);
        thread::sleep(measuring_delay);
    }
}
