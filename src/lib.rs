//! Linux userspace driver for the Bosch BME680 environmental sensor
//! (temperature, pressure, humidity, gas resistance) over I2C or SPI.
//!
//! Output units are the device's native fixed-point units:
//! temperature in centi-degrees Celsius (2350 = 23.50 C), pressure in
//! Pascal, humidity in milli-percent relative humidity (45123 = 45.123 %),
//! gas resistance in Ohm.

pub mod bme680;
pub mod busio;
pub mod errors;
