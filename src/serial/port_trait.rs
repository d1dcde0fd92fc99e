//! Byte sink for the radio modem link
//!
//! Everything the modem receives (tuning frames and POCSAG messages) goes
//! through [`SerialPortIO`], so the link can be driven by a test double.

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;

/// Write side of the modem link
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SerialPortIO: Send {
    /// Queue a complete frame for the modem
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Push queued octets out to the modem
    async fn flush(&mut self) -> io::Result<()>;
}

/// Radio modem attached over a native serial port
pub struct ModemPort {
    stream: tokio_serial::SerialStream,
}

impl ModemPort {
    pub fn new(stream: tokio_serial::SerialStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl SerialPortIO for ModemPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(&mut self.stream, data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        AsyncWriteExt::flush(&mut self.stream).await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Modem double that records every frame written
    #[derive(Clone, Default)]
    pub struct RecordingPort {
        pub written_data: Arc<Mutex<Vec<Vec<u8>>>>,
        pub flush_count: Arc<Mutex<usize>>,
        pub write_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl RecordingPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_written_data(&self) -> Vec<Vec<u8>> {
            self.written_data.lock().unwrap().clone()
        }

        pub fn get_flush_count(&self) -> usize {
            *self.flush_count.lock().unwrap()
        }

        pub fn set_write_error(&self, error: io::ErrorKind) {
            *self.write_error.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl SerialPortIO for RecordingPort {
        async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
            if let Some(error) = *self.write_error.lock().unwrap() {
                return Err(io::Error::new(error, "Mock write error"));
            }
            self.written_data.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            *self.flush_count.lock().unwrap() += 1;
            Ok(())
        }
    }
}
