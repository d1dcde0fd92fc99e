//! # Pager Session
//!
//! Executes operator commands: encodes pages with the configured options,
//! hands them to the radio link and retunes the modem.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::command::{parse_command, Command};
use crate::config::PocsagConfig;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::pocsag::{BatchPolicy, Encoder, Polarity};
use crate::serial::port_trait::SerialPortIO;
use crate::serial::PagerLink;

/// Result of a successfully executed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Page encoded and sent
    Transmitted {
        /// Message size in octets
        size: usize,
        /// Number of transmissions made (repeat + 1)
        transmissions: u32,
    },

    /// Carrier frequency changed
    FrequencyChanged(Frequency),
}

/// Operator session bound to one radio link
#[derive(Debug)]
pub struct Session<P: SerialPortIO> {
    encoder: Encoder,
    link: PagerLink<P>,
    batch_policy: BatchPolicy,
    polarity: Polarity,
    frequency: Frequency,
}

impl<P: SerialPortIO> Session<P> {
    /// Create a session using the encoding options and start-up frequency from `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configured frequency is outside the supported bands
    pub fn new(link: PagerLink<P>, config: &PocsagConfig) -> Result<Self> {
        Ok(Self {
            encoder: Encoder::new(),
            link,
            batch_policy: config.batch_policy,
            polarity: config.polarity,
            frequency: config.frequency()?,
        })
    }

    /// Tune the modem to the session's current frequency
    pub async fn tune(&mut self) -> Result<()> {
        self.link.set_frequency(self.frequency).await
    }

    /// Execute commands read from `input` until it ends or `shutdown` completes
    ///
    /// `shutdown` is raced against every command as well, so it cancels a
    /// transmission and its pending repeats. Command errors are logged and
    /// the loop continues; only input errors end it early.
    pub async fn run<R, S>(&mut self, input: R, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future,
    {
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    return Ok(());
                }
            };

            let Some(line) = line else {
                info!("End of input, shutting down...");
                return Ok(());
            };

            tokio::select! {
                result = self.handle_line(&line) => match result {
                    Ok(Some(Outcome::Transmitted { size, transmissions })) => {
                        info!("Sent {} bytes {} time(s)", size, transmissions);
                    }
                    Ok(Some(Outcome::FrequencyChanged(frequency))) => {
                        info!("Frequency set to {}", frequency);
                    }
                    Ok(None) => {}
                    Err(e) => error!("{}", e),
                },
                _ = &mut shutdown => {
                    warn!("Shutdown requested, transmission aborted");
                    return Ok(());
                }
            }
        }
    }

    /// Parse and execute one input line
    ///
    /// # Returns
    ///
    /// * `Result<Option<Outcome>>` - `None` for blank lines
    pub async fn handle_line(&mut self, line: &str) -> Result<Option<Outcome>> {
        match parse_command(line)? {
            Some(command) => self.execute(command).await.map(Some),
            None => Ok(None),
        }
    }

    /// Execute a parsed command
    ///
    /// # Errors
    ///
    /// Returns the encoder error for rejected pages (nothing is sent), or the
    /// link error if a transmission or retune fails
    pub async fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Page {
                address,
                source,
                repeat,
                text,
            } => {
                info!(address, source, repeat, text = %text, "Page requested");

                let message = match self.encoder.encode(
                    address,
                    source,
                    &text,
                    self.batch_policy,
                    self.polarity,
                ) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Page rejected by encoder: {}", e);
                        return Err(e.into());
                    }
                };

                info!(
                    "POCSAG message created: {} bytes, transmitting on {}",
                    message.len(),
                    self.frequency
                );

                let transmissions = self.link.transmit(message.as_bytes(), repeat).await?;
                info!("Transmission complete");

                Ok(Outcome::Transmitted {
                    size: message.len(),
                    transmissions,
                })
            }

            Command::SetFrequency(frequency) => {
                info!("Switching to new frequency: {}", frequency);
                self.link.set_frequency(frequency).await?;
                self.frequency = frequency;
                Ok(Outcome::FrequencyChanged(frequency))
            }
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn link(&self) -> &PagerLink<P> {
        &self.link
    }
}
