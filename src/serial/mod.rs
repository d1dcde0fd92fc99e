//! # Serial Communication Module
//!
//! Handles the serial link to the radio modem that keys the transmitter.
//!
//! This module handles:
//! - Opening the modem's serial port (configured path, then defaults)
//! - Tuning the modem's synthesizer
//! - Writing complete POCSAG messages with a write timeout
//! - Waiting out the on-air time of each transmission
//! - Repeating a transmission with a pause between sends

pub mod port_trait;

use std::time::Duration;

use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PagerError, Result};
use crate::frequency::Frequency;
use port_trait::{ModemPort, SerialPortIO};

/// Default modem device paths to try after the configured one
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Margin added to the computed on-air time before the next send
const KEY_UP_MARGIN: Duration = Duration::from_millis(100);

/// Time the modem needs to shift `len` octets out at `data_rate` bps
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pocsag_tx::serial::on_air_time;
///
/// assert_eq!(on_air_time(140, 1200), Duration::from_millis(1033));
/// ```
pub fn on_air_time(len: usize, data_rate: u32) -> Duration {
    let bits = len as u64 * 8;
    Duration::from_millis(bits * 1000 / data_rate.max(1) as u64) + KEY_UP_MARGIN
}

/// Timing of the radio link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTiming {
    /// POCSAG over-the-air bit rate
    pub data_rate: u32,
    /// Pause between repeated transmissions
    pub repeat_delay: Duration,
    /// Upper bound for writing one message to the port
    pub write_timeout: Duration,
}

impl Default for LinkTiming {
    fn default() -> Self {
        Self {
            data_rate: 1200,
            repeat_delay: Duration::from_millis(3000),
            write_timeout: Duration::from_millis(1000),
        }
    }
}

impl LinkTiming {
    pub fn from_config(config: &Config) -> Self {
        Self {
            data_rate: config.pocsag.data_rate,
            repeat_delay: Duration::from_millis(config.pocsag.repeat_delay_ms),
            write_timeout: Duration::from_millis(config.serial.timeout_ms),
        }
    }
}

/// Radio modem link
///
/// Owns the serial port; `&mut self` on every send keeps one
/// transmission in flight at a time.
pub struct PagerLink<P: SerialPortIO = ModemPort> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
    timing: LinkTiming,
}

impl<P: SerialPortIO> std::fmt::Debug for PagerLink<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerLink")
            .field("device_path", &self.device_path)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl PagerLink<ModemPort> {
    /// Open the modem port named in the configuration
    ///
    /// Falls back to the default device paths if the configured one fails.
    ///
    /// # Errors
    ///
    /// Returns error if no candidate device can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pocsag_tx::config::Config;
    /// use pocsag_tx::serial::PagerLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = PagerLink::open(&Config::default())?;
    ///     println!("Connected to: {}", link.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &Config) -> Result<Self> {
        let mut paths = vec![config.serial.port.as_str()];
        paths.extend(
            DEFAULT_DEVICE_PATHS
                .iter()
                .filter(|path| **path != config.serial.port),
        );

        Self::open_with_paths(&paths, config.serial.baud_rate, LinkTiming::from_config(config))
    }

    /// Open the first device in `paths` that succeeds
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timing: LinkTiming) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened radio modem at {}", path);
                    return Ok(Self::new(ModemPort::new(port), path.to_string(), timing));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(PagerError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port, 8N1 without flow control
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PagerError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> PagerLink<P> {
    pub fn new(port: P, device_path: String, timing: LinkTiming) -> Self {
        Self {
            port,
            device_path,
            timing,
        }
    }

    /// Write one frame and flush it, bounded by the write timeout
    async fn write_frame(&mut self, frame: &[u8], what: &str) -> Result<()> {
        let write_timeout = self.timing.write_timeout;
        let port = &mut self.port;

        let write = async move {
            port.write_all(frame)
                .await
                .map_err(|e| PagerError::Serial(format!("Failed to write {}: {}", what, e)))?;

            port.flush()
                .await
                .map_err(|e| PagerError::Serial(format!("Failed to flush serial port: {}", e)))
        };

        tokio::time::timeout(write_timeout, write)
            .await
            .map_err(|_| {
                PagerError::Serial(format!(
                    "Write timed out after {} ms",
                    write_timeout.as_millis()
                ))
            })?
    }

    /// Tune the modem's synthesizer to `frequency`
    ///
    /// # Errors
    ///
    /// Returns error if the tuning frame cannot be written
    pub async fn set_frequency(&mut self, frequency: Frequency) -> Result<()> {
        self.write_frame(&frequency.tuning_command(), "tuning command")
            .await?;
        info!("Modem at {} tuned to {}", self.device_path, frequency);
        Ok(())
    }

    /// Send one message and wait until it has gone out over the air
    ///
    /// # Errors
    ///
    /// Returns error if the write or flush fails or exceeds the write timeout
    pub async fn send_message(&mut self, message: &[u8]) -> Result<()> {
        self.write_frame(message, "message").await?;

        let on_air = on_air_time(message.len(), self.timing.data_rate);
        debug!("Sent POCSAG message ({} bytes), on air for {:?}", message.len(), on_air);
        tokio::time::sleep(on_air).await;

        Ok(())
    }

    /// Send a message `repeat + 1` times, pausing between sends
    ///
    /// # Returns
    ///
    /// * `Result<u32>` - Number of transmissions made
    ///
    /// # Errors
    ///
    /// Stops at the first failed send and returns its error
    pub async fn transmit(&mut self, message: &[u8], repeat: u32) -> Result<u32> {
        let total = repeat.saturating_add(1);

        for n in 1..=total {
            info!("POCSAG send {}/{} on {}", n, total, self.device_path);
            self.send_message(message).await?;

            if n < total {
                tokio::time::sleep(self.timing.repeat_delay).await;
            }
        }

        Ok(total)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn timing(&self) -> LinkTiming {
        self.timing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pocsag::protocol::{MAX_MESSAGE_SIZE, SINGLE_BATCH_MESSAGE_SIZE};
    use port_trait::mocks::RecordingPort;
    use port_trait::MockSerialPortIO;
    use std::io;
    use tokio::time::Instant;

    fn link(port: RecordingPort) -> PagerLink<RecordingPort> {
        PagerLink::new(port, "/dev/mock0".to_string(), LinkTiming::default())
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_DEVICE_PATHS.len(), 2);
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/ttyACM0");
        assert_eq!(DEFAULT_DEVICE_PATHS[1], "/dev/ttyUSB0");
        assert_eq!(KEY_UP_MARGIN, Duration::from_millis(100));
    }

    #[test]
    fn test_on_air_time() {
        assert_eq!(on_air_time(SINGLE_BATCH_MESSAGE_SIZE, 1200), Duration::from_millis(1033));
        assert_eq!(on_air_time(MAX_MESSAGE_SIZE, 1200), Duration::from_millis(1486));
        assert_eq!(on_air_time(MAX_MESSAGE_SIZE, 512), Duration::from_millis(3350));
        assert_eq!(on_air_time(0, 2400), KEY_UP_MARGIN);
    }

    #[test]
    fn test_timing_from_config() {
        let mut config = Config::default();
        config.pocsag.data_rate = 2400;
        config.pocsag.repeat_delay_ms = 500;
        config.serial.timeout_ms = 250;

        let timing = LinkTiming::from_config(&config);
        let link = PagerLink::new(RecordingPort::new(), "/dev/mock0".to_string(), timing);
        assert_eq!(link.timing(), timing);
        assert_eq!(timing.data_rate, 2400);
        assert_eq!(timing.repeat_delay, Duration::from_millis(500));
        assert_eq!(timing.write_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = PagerLink::open_with_paths(invalid_paths, 115200, LinkTiming::default());

        match result {
            Err(PagerError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = PagerLink::open_with_paths(empty_paths, 115200, LinkTiming::default());
        assert!(matches!(result, Err(PagerError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = PagerLink::open_port("/dev/nonexistent_serial_device_12345", 115200);

        match result {
            Err(PagerError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_message_writes_and_waits_on_air() {
        let port = RecordingPort::new();
        let mut link = link(port.clone());
        let message = vec![0xAAu8; SINGLE_BATCH_MESSAGE_SIZE];

        let start = Instant::now();
        link.send_message(&message).await.unwrap();

        assert_eq!(port.get_written_data(), vec![message]);
        assert_eq!(port.get_flush_count(), 1);
        assert!(start.elapsed() >= Duration::from_millis(1033));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_repeats_with_delay() {
        let port = RecordingPort::new();
        let mut link = link(port.clone());
        let message = vec![0x55u8; SINGLE_BATCH_MESSAGE_SIZE];

        let start = Instant::now();
        let sent = link.transmit(&message, 2).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(sent, 3);
        assert_eq!(port.get_written_data().len(), 3);
        // 3 x 1033 ms on air + 2 x 3000 ms between sends
        assert!(elapsed >= Duration::from_millis(9099));
        assert!(elapsed < Duration::from_millis(9199));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_without_repeat_sends_once() {
        let port = RecordingPort::new();
        let mut link = link(port.clone());

        let start = Instant::now();
        assert_eq!(link.transmit(&[0u8; MAX_MESSAGE_SIZE], 0).await.unwrap(), 1);

        assert_eq!(port.get_written_data().len(), 1);
        assert!(start.elapsed() < Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transmit_stops_on_write_error() {
        let port = RecordingPort::new();
        port.set_write_error(io::ErrorKind::BrokenPipe);
        let mut link = link(port.clone());

        let result = link.transmit(&[0u8; 4], 5).await;
        match result {
            Err(PagerError::Serial(msg)) => assert!(msg.contains("Failed to write message")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
        assert!(port.get_written_data().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_error_reported() {
        let mut port = MockSerialPortIO::new();
        port.expect_write_all()
            .withf(|data: &[u8]| data.len() == SINGLE_BATCH_MESSAGE_SIZE)
            .times(1)
            .returning(|_| Ok(()));
        port.expect_flush()
            .times(1)
            .returning(|| Err(io::Error::new(io::ErrorKind::Other, "modem gone")));

        let mut link = PagerLink::new(port, "/dev/mock1".to_string(), LinkTiming::default());
        let result = link.transmit(&[0u8; SINGLE_BATCH_MESSAGE_SIZE], 3).await;

        match result {
            Err(PagerError::Serial(msg)) => assert!(msg.contains("Failed to flush")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_repeat_writes_whole_message() {
        let mut port = MockSerialPortIO::new();
        port.expect_write_all()
            .withf(|data: &[u8]| data.len() == MAX_MESSAGE_SIZE && data[0] == 0xAA)
            .times(2)
            .returning(|_| Ok(()));
        port.expect_flush().times(2).returning(|| Ok(()));

        let mut link = PagerLink::new(port, "/dev/mock2".to_string(), LinkTiming::default());
        let mut message = [0u8; MAX_MESSAGE_SIZE];
        message[0] = 0xAA;

        assert_eq!(link.transmit(&message, 1).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_frequency_writes_tuning_frame() {
        let port = RecordingPort::new();
        let mut link = link(port.clone());
        let frequency = Frequency::new(145, 9875).unwrap();

        let start = Instant::now();
        link.set_frequency(frequency).await.unwrap();

        assert_eq!(port.get_written_data(), vec![frequency.tuning_command().to_vec()]);
        assert_eq!(port.get_flush_count(), 1);
        // no on-air wait for a tuning frame
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_frequency_write_error() {
        let port = RecordingPort::new();
        port.set_write_error(io::ErrorKind::BrokenPipe);
        let mut link = link(port);

        match link.set_frequency(crate::frequency::DEFAULT_FREQUENCY).await {
            Err(PagerError::Serial(msg)) => assert!(msg.contains("tuning command")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_port() {
        let link = link(RecordingPort::new());
        let debug = format!("{:?}", link);
        assert!(debug.contains("/dev/mock0"));
        assert!(debug.contains(".."));
    }

    // Integration test - only runs if a radio modem is connected
    #[tokio::test]
    #[ignore] // Run with: cargo test -- --ignored
    async fn test_open_with_real_hardware() {
        match PagerLink::open(&Config::default()) {
            Ok(link) => println!("Opened radio modem at: {}", link.device_path()),
            Err(_) => println!("No radio modem detected (this is OK for CI/CD)"),
        }
    }
}
