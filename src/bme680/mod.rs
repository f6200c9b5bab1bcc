pub mod bme680_calc;
pub mod bme680_calib;
pub mod bme680_core;
pub mod bme680_enums;

pub use bme680_calc::*;
pub use bme680_calib::*;
pub use bme680_core::*;
pub use bme680_enums::*;
