//! Serial line settings.

use portframe_core::constants::{DEFAULT_BAUD_RATE, DEFAULT_DATA_BITS, DEFAULT_READ_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(stop_bits: StopBits) -> Self {
        match stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Settings used to open a serial port.
///
/// # Examples
///
/// ```
/// use portframe_serial::SerialSettings;
///
/// let settings: SerialSettings = serde_json::from_str(r#"{ "port": "/dev/ttyUSB0" }"#).unwrap();
/// assert_eq!(settings.baud_rate, 9600);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,

    pub baud_rate: u32,

    /// Bits per character, 5 to 8.
    pub data_bits: u8,

    pub parity: Parity,

    pub stop_bits: StopBits,

    /// Maximum time a single read may block.
    pub read_timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialSettings {
    /// Default settings for `port`.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Check the settings before opening a port.
    ///
    /// # Errors
    /// Returns a configuration error for an empty port name, a zero baud
    /// rate or a data bit count outside 5..=8.
    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(portframe_core::Error::config("Serial port name is empty").into());
        }
        if self.baud_rate == 0 {
            return Err(portframe_core::Error::config("Baud rate must be positive").into());
        }
        self.serial_data_bits()?;
        Ok(())
    }

    /// Builder for the `serialport` crate.
    ///
    /// # Errors
    /// Same as [`SerialSettings::validate`].
    pub fn builder(&self) -> Result<serialport::SerialPortBuilder> {
        self.validate()?;
        Ok(serialport::new(self.port.as_str(), self.baud_rate)
            .data_bits(self.serial_data_bits()?)
            .parity(self.parity.into())
            .stop_bits(self.stop_bits.into())
            .timeout(self.read_timeout()))
    }

    fn serial_data_bits(&self) -> Result<serialport::DataBits> {
        match self.data_bits {
            5 => Ok(serialport::DataBits::Five),
            6 => Ok(serialport::DataBits::Six),
            7 => Ok(serialport::DataBits::Seven),
            8 => Ok(serialport::DataBits::Eight),
            other => Err(portframe_core::Error::config(format!(
                "Data bits must be 5-8, got {other}"
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let settings = SerialSettings::new("COM3");
        assert_eq!(settings.baud_rate, 9600);
        assert_eq!(settings.data_bits, 8);
        assert_eq!(settings.parity, Parity::None);
        assert_eq!(settings.stop_bits, StopBits::One);
        assert_eq!(settings.read_timeout(), Duration::from_millis(10));
    }

    #[rstest]
    #[case(5, true)]
    #[case(8, true)]
    #[case(4, false)]
    #[case(9, false)]
    fn test_data_bits_validation(#[case] data_bits: u8, #[case] valid: bool) {
        let settings = SerialSettings {
            data_bits,
            ..SerialSettings::new("/dev/ttyS0")
        };
        assert_eq!(settings.validate().is_ok(), valid);
    }

    #[test]
    fn test_empty_port_rejected() {
        assert!(SerialSettings::default().validate().is_err());
    }

    #[test]
    fn test_zero_baud_rejected() {
        let settings = SerialSettings::new("/dev/ttyS0").with_baud_rate(0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "port": "/dev/ttyUSB1",
            "baud_rate": 115200,
            "data_bits": 7,
            "parity": "even",
            "stop_bits": "two"
        }"#;
        let settings: SerialSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.baud_rate, 115200);
        assert_eq!(settings.parity, Parity::Even);
        assert_eq!(settings.stop_bits, StopBits::Two);
        assert_eq!(settings.read_timeout_ms, 10);
    }

    #[test]
    fn test_parity_conversion() {
        assert_eq!(serialport::Parity::from(Parity::Odd), serialport::Parity::Odd);
        assert_eq!(serialport::StopBits::from(StopBits::Two), serialport::StopBits::Two);
    }
}
