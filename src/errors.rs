use thiserror::Error;

/// Failures surfaced by the BME680 driver. None of these are retried
/// internally except the bounded poll loop behind [`Bme680Error::NoNewData`].
#[derive(Debug, Error)]
pub enum Bme680Error {
    /// A bus transaction failed. Propagated immediately, never retried here.
    #[error("bus communication failed: {0}")]
    Communication(#[from] std::io::Error),

    /// The chip id read after reset did not match the expected device.
    #[error("found unknown chip id {found:#04x}, expected {expected:#04x}")]
    UnexpectedDeviceId { found: u8, expected: u8 },

    /// The poll budget ran out without the new-data bit coming up.
    /// The cycle state is reset, a fresh cycle may be started.
    #[error("no new data after {attempts} poll attempts")]
    NoNewData { attempts: u8 },

    /// A compensated value fell outside its documented physical bounds,
    /// pointing at a calibration or wiring fault rather than a transient.
    #[error("compensated {quantity} value {value} outside valid range [{min}, {max}]")]
    RangeError {
        quantity: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A second measurement was triggered while one is still in flight
    /// on this handle.
    #[error("measurement cycle already in progress")]
    MeasurementInProgress,
}
