//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PagerError, Result};
use crate::frequency::Frequency;
use crate::pocsag::protocol::{BatchPolicy, Polarity};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub pocsag: PocsagConfig,
}

/// Serial link to the radio modem
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// POCSAG encoding and transmission settings
#[derive(Debug, Deserialize, Clone)]
pub struct PocsagConfig {
    #[serde(default)]
    pub batch_policy: BatchPolicy,

    #[serde(default = "default_polarity")]
    pub polarity: Polarity,

    #[serde(default = "default_data_rate")]
    pub data_rate: u32,

    #[serde(default = "default_repeat_delay_ms")]
    pub repeat_delay_ms: u64,

    #[serde(default = "default_frequency_mhz")]
    pub frequency_mhz: f64,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 1000 }

fn default_polarity() -> Polarity { Polarity::Inverted }
fn default_data_rate() -> u32 { 1200 }
fn default_repeat_delay_ms() -> u64 { 3000 }
fn default_frequency_mhz() -> f64 { 433.92 }

/// Baud rates accepted for the modem link
const VALID_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];

/// POCSAG over-the-air data rates
const VALID_DATA_RATES: [u32; 3] = [512, 1200, 2400];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for PocsagConfig {
    fn default() -> Self {
        Self {
            batch_policy: BatchPolicy::default(),
            polarity: default_polarity(),
            data_rate: default_data_rate(),
            repeat_delay_ms: default_repeat_delay_ms(),
            frequency_mhz: default_frequency_mhz(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pocsag_tx::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(PagerError::Config(toml::de::Error::custom(
                "serial port cannot be empty",
            )));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(PagerError::Config(toml::de::Error::custom(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400",
            )));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(PagerError::Config(toml::de::Error::custom(
                "timeout_ms must be between 1 and 10000",
            )));
        }

        if !VALID_DATA_RATES.contains(&self.pocsag.data_rate) {
            return Err(PagerError::Config(toml::de::Error::custom(
                "data_rate must be one of: 512, 1200, 2400",
            )));
        }

        if self.pocsag.repeat_delay_ms > 60000 {
            return Err(PagerError::Config(toml::de::Error::custom(
                "repeat_delay_ms must be between 0 and 60000",
            )));
        }

        if let Err(e) = self.pocsag.frequency() {
            return Err(PagerError::Config(toml::de::Error::custom(format!(
                "frequency_mhz: {}",
                e
            ))));
        }

        Ok(())
    }
}

impl PocsagConfig {
    /// Configured start-up frequency
    pub fn frequency(&self) -> Result<Frequency> {
        Frequency::from_mhz(self.frequency_mhz)
    }
}
