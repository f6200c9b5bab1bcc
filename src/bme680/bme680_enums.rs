use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Bme680DeviceAddress {
    Default,
    Secondary,
}

impl Default for Bme680DeviceAddress {
    fn default() -> Self {
        Bme680DeviceAddress::Default
    }
}

impl Bme680DeviceAddress {
    const BME680_DEV_ADDR_DEFAULT: u16 = 0x77;
    const BME680_DEV_ADDR_SECONDARY: u16 = 0x76;

    pub fn value(&self) -> u16 {
        match *self {
            Self::Default => Self::BME680_DEV_ADDR_DEFAULT,
            Self::Secondary => Self::BME680_DEV_ADDR_SECONDARY,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Bme680SensorPowerMode {
    Sleep,
    Forced,
}

impl Bme680SensorPowerMode {
    const BME680_POWERMODE_SLEEP: u8 = 0x00;
    const BME680_POWERMODE_FORCED: u8 = 0x01;

    pub fn value(&self) -> u8 {
        match *self {
            Self::Sleep => Self::BME680_POWERMODE_SLEEP,
            Self::Forced => Self::BME680_POWERMODE_FORCED,
        }
    }
}

impl fmt::Display for Bme680SensorPowerMode {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Sleep => write!(f, "Sleep/{:#04x}", self.value()),
            Self::Forced => write!(f, "Forced/{:#04x}", self.value()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Bme680OverSampling {
    NoOversampling,
    Oversampling1x,
    Oversampling2x,
    Oversampling4x,
    Oversampling8x,
    Oversampling16x,
}

impl Bme680OverSampling {
    const BME680_NO_OVERSAMPLING: u8 = 0x00;
    const BME680_OVERSAMPLING_1X: u8 = 0x01;
    const BME680_OVERSAMPLING_2X: u8 = 0x02;
    const BME680_OVERSAMPLING_4X: u8 = 0x03;
    const BME680_OVERSAMPLING_8X: u8 = 0x04;
    const BME680_OVERSAMPLING_16X: u8 = 0x05;

    pub fn value(&self) -> u8 {
        match *self {
            Self::NoOversampling => Self::BME680_NO_OVERSAMPLING,
            Self::Oversampling1x => Self::BME680_OVERSAMPLING_1X,
            Self::Oversampling2x => Self::BME680_OVERSAMPLING_2X,
            Self::Oversampling4x => Self::BME680_OVERSAMPLING_4X,
            Self::Oversampling8x => Self::BME680_OVERSAMPLING_8X,
            Self::Oversampling16x => Self::BME680_OVERSAMPLING_16X,
        }
    }
}

impl fmt::Display for Bme680OverSampling {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NoOversampling => write!(f, "NoOversampling/{:#04x}", self.value()),
            Self::Oversampling1x => write!(f, "Oversampling1x/{:#04x}", self.value()),
            Self::Oversampling2x => write!(f, "Oversampling2x/{:#04x}", self.value()),
            Self::Oversampling4x => write!(f, "Oversampling4x/{:#04x}", self.value()),
            Self::Oversampling8x => write!(f, "Oversampling8x/{:#04x}", self.value()),
            Self::Oversampling16x => write!(f, "Oversampling16x/{:#04x}", self.value()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Bme680IrrFilter {
    FilterOff,
    Coef1,
    Coef3,
    Coef7,
    Coef15,
    Coef31,
    Coef63,
    Coef127,
}

impl Bme680IrrFilter {
    const BME680_FILTER_COEFF_OFF: u8 = 0x00;
    const BME680_FILTER_COEFF_1: u8 = 0x01;
    const BME680_FILTER_COEFF_3: u8 = 0x02;
    const BME680_FILTER_COEFF_7: u8 = 0x03;
    const BME680_FILTER_COEFF_15: u8 = 0x04;
    const BME680_FILTER_COEFF_31: u8 = 0x05;
    const BME680_FILTER_COEFF_63: u8 = 0x06;
    const BME680_FILTER_COEFF_127: u8 = 0x07;

    pub fn value(&self) -> u8 {
        match *self {
            Self::FilterOff => Self::BME680_FILTER_COEFF_OFF,
            Self::Coef1 => Self::BME680_FILTER_COEFF_1,
            Self::Coef3 => Self::BME680_FILTER_COEFF_3,
            Self::Coef7 => Self::BME680_FILTER_COEFF_7,
            Self::Coef15 => Self::BME680_FILTER_COEFF_15,
            Self::Coef31 => Self::BME680_FILTER_COEFF_31,
            Self::Coef63 => Self::BME680_FILTER_COEFF_63,
            Self::Coef127 => Self::BME680_FILTER_COEFF_127,
        }
    }
}

impl fmt::Display for Bme680IrrFilter {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::FilterOff => write!(f, "FilterOff/{:#04x}", self.value()),
            Self::Coef1 => write!(f, "Coefficient 1/{:#04x}", self.value()),
            Self::Coef3 => write!(f, "Coefficient 3/{:#04x}", self.value()),
            Self::Coef7 => write!(f, "Coefficient 7/{:#04x}", self.value()),
            Self::Coef15 => write!(f, "Coefficient 15/{:#04x}", self.value()),
            Self::Coef31 => write!(f, "Coefficient 31/{:#04x}", self.value()),
            Self::Coef63 => write!(f, "Coefficient 63/{:#04x}", self.value()),
            Self::Coef127 => write!(f, "Coefficient 127/{:#04x}", self.value()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Bme680HeaterProfile {
    SetPoint0, SetPoint1, SetPoint2, SetPoint3, SetPoint4,
    SetPoint5, SetPoint6, SetPoint7, SetPoint8, SetPoint9,
}

impl Bme680HeaterProfile {
    const BME680_SETPOINT_0: u8 = 0;
    const BME680_SETPOINT_1: u8 = 1;
    const BME680_SETPOINT_2: u8 = 2;
    const BME680_SETPOINT_3: u8 = 3;
    const BME680_SETPOINT_4: u8 = 4;
    const BME680_SETPOINT_5: u8 = 5;
    const BME680_SETPOINT_6: u8 = 6;
    const BME680_SETPOINT_7: u8 = 7;
    const BME680_SETPOINT_8: u8 = 8;
    const BME680_SETPOINT_9: u8 = 9;

    pub fn value(&self) -> u8 {
        match *self {
            Self::SetPoint0 => Self::BME680_SETPOINT_0,
            Self::SetPoint1 => Self::BME680_SETPOINT_1,
            Self::SetPoint2 => Self::BME680_SETPOINT_2,
            Self::SetPoint3 => Self::BME680_SETPOINT_3,
            Self::SetPoint4 => Self::BME680_SETPOINT_4,
            Self::SetPoint5 => Self::BME680_SETPOINT_5,
            Self::SetPoint6 => Self::BME680_SETPOINT_6,
            Self::SetPoint7 => Self::BME680_SETPOINT_7,
            Self::SetPoint8 => Self::BME680_SETPOINT_8,
            Self::SetPoint9 => Self::BME680_SETPOINT_9,
        }
    }
}
