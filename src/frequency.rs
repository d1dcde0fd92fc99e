//! # Transmit Frequency
//!
//! Carrier frequency with 100 Hz resolution, restricted to the bands the
//! radio modem can synthesize.
//!
//! The modem is tuned with a transceiver `SET_PROPERTY` frame writing the
//! four `FREQ_CONTROL` properties (integer divider + 20-bit fraction):
//!
//! ```text
//! 0x11 0x40 0x04 0x00 INTE FRAC2 FRAC1 FRAC0
//! ```
//!
//! with `fc = f * outdiv / (2 * 30 MHz)`, `INTE = floor(fc) - 1` and
//! `FRAC = (fc - INTE) * 2^19`.

use std::fmt;

use crate::error::{PagerError, Result};

/// Hundreds of Hz per MHz
const STEPS_PER_MHZ: u32 = 10_000;

/// Supported bands in 100 Hz steps (inclusive)
pub const VALID_BANDS: [(u32, u32); 3] = [
    (135 * STEPS_PER_MHZ, 175 * STEPS_PER_MHZ),
    (400 * STEPS_PER_MHZ, 470 * STEPS_PER_MHZ),
    (850 * STEPS_PER_MHZ, 930 * STEPS_PER_MHZ),
];

/// Default paging frequency (433.9200 MHz)
pub const DEFAULT_FREQUENCY: Frequency = Frequency(433 * STEPS_PER_MHZ + 9_200);

/// `SET_PROPERTY` command byte
const CMD_SET_PROPERTY: u8 = 0x11;

/// `FREQ_CONTROL` property group
const GROUP_FREQ_CONTROL: u8 = 0x40;

/// Properties written: INTE, FRAC2, FRAC1, FRAC0
const FREQ_CONTROL_PROPERTIES: u8 = 0x04;

/// Crystal reference of the modem's transceiver
const XTAL_HZ: u64 = 30_000_000;

/// Fixed prescaler of the synthesizer
const NPRESC: u64 = 2;

/// Fractional divider resolution
const FRAC_BITS: u32 = 19;

/// Length of the tuning frame
pub const TUNING_COMMAND_LEN: usize = 8;

/// Carrier frequency in 100 Hz steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Frequency(u32);

impl Frequency {
    /// Build a frequency from whole MHz plus 100 Hz steps
    ///
    /// # Errors
    ///
    /// Returns error if the result falls outside every supported band
    ///
    /// # Examples
    ///
    /// ```
    /// use pocsag_tx::frequency::Frequency;
    ///
    /// let freq = Frequency::new(433, 9200).unwrap();
    /// assert_eq!(freq.to_string(), "433.9200 MHz");
    /// ```
    pub fn new(mhz: u32, hundred_hz: u32) -> Result<Self> {
        let steps = mhz
            .checked_mul(STEPS_PER_MHZ)
            .and_then(|steps| steps.checked_add(hundred_hz))
            .ok_or_else(|| PagerError::Command("frequency out of range".to_string()))?;
        Self::from_steps(steps)
    }

    /// Build a frequency from MHz, rounded to the nearest 100 Hz
    pub fn from_mhz(mhz: f64) -> Result<Self> {
        if !mhz.is_finite() || mhz <= 0.0 {
            return Err(PagerError::Command(format!("invalid frequency: {} MHz", mhz)));
        }
        let steps = (mhz * STEPS_PER_MHZ as f64).round();
        if steps > u32::MAX as f64 {
            return Err(PagerError::Command(format!("invalid frequency: {} MHz", mhz)));
        }
        Self::from_steps(steps as u32)
    }

    fn from_steps(steps: u32) -> Result<Self> {
        if VALID_BANDS.iter().any(|&(low, high)| (low..=high).contains(&steps)) {
            Ok(Self(steps))
        } else {
            Err(PagerError::Command(format!(
                "invalid frequency {}: valid ranges are 135-175 MHz, 400-470 MHz, 850-930 MHz",
                Self(steps)
            )))
        }
    }

    /// Frequency in Hz
    pub fn hz(self) -> u64 {
        self.0 as u64 * 100
    }

    /// Synthesizer output divider for the band this frequency lies in
    fn output_divider(self) -> u64 {
        match self.hz() {
            hz if hz >= 760_000_000 => 4,
            hz if hz >= 546_000_000 => 6,
            hz if hz >= 385_000_000 => 8,
            hz if hz >= 273_000_000 => 12,
            hz if hz >= 194_000_000 => 16,
            _ => 24,
        }
    }

    /// Frame that tunes the modem's synthesizer to this frequency
    ///
    /// # Examples
    ///
    /// ```
    /// use pocsag_tx::frequency::DEFAULT_FREQUENCY;
    ///
    /// assert_eq!(
    ///     DEFAULT_FREQUENCY.tuning_command(),
    ///     [0x11, 0x40, 0x04, 0x00, 0x38, 0x0E, 0xD9, 0x16]
    /// );
    /// ```
    pub fn tuning_command(self) -> [u8; TUNING_COMMAND_LEN] {
        let fc = self.hz() * self.output_divider() * (1 << FRAC_BITS) / (NPRESC * XTAL_HZ);
        let inte = (fc >> FRAC_BITS) - 1;
        let frac = fc - (inte << FRAC_BITS);

        [
            CMD_SET_PROPERTY,
            GROUP_FREQ_CONTROL,
            FREQ_CONTROL_PROPERTIES,
            0x00, // first property: FREQ_CONTROL_INTE
            inte as u8,
            (frac >> 16) as u8,
            (frac >> 8) as u8,
            frac as u8,
        ]
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:04} MHz",
            self.0 / STEPS_PER_MHZ,
            self.0 % STEPS_PER_MHZ
        )
    }
}
