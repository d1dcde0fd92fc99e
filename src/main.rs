//! # POCSAG TX
//!
//! Operator console for sending POCSAG text pages.
//!
//! Reads commands from stdin, one per line:
//!
//! ```text
//! P <address> <source> <repeat> <message>
//! F <freqmhz> <freq100Hz>
//! ```
//!
//! # Examples
//!
//! ```bash
//! echo "P 123456 0 1 Hello World" | pocsag-tx --config config/default.toml
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};

use pocsag_tx::config::Config;
use pocsag_tx::serial::PagerLink;
use pocsag_tx::session::Session;

/// Send POCSAG text pages through a serial radio modem
#[derive(Parser, Debug)]
#[command(name = "pocsag-tx")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Serial device of the radio modem (overrides the config file)
    #[arg(short, long)]
    port: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(
                    cli.log_level
                        .parse::<tracing_subscriber::filter::Directive>()
                        .context("invalid --log-level")?,
                ),
        )
        .init();

    info!("POCSAG TX v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        warn!("Config file {} not found, using defaults", cli.config.display());
        Config::default()
    };
    if let Some(port) = cli.port {
        config.serial.port = port;
        config.validate()?;
    }

    let link = PagerLink::open(&config)?;
    info!("Radio modem opened at: {}", link.device_path());

    let mut session = Session::new(link, &config.pocsag)?;
    session.tune().await?;
    info!(
        "Ready on {} ({} bps, {:?}, {:?})",
        session.frequency(),
        config.pocsag.data_rate,
        config.pocsag.batch_policy,
        config.pocsag.polarity
    );
    info!("Format: P <address> <source> <repeat> <message> | F <freqmhz> <freq100Hz>");

    // Ctrl+C is raced against every command, so it also aborts a transmission
    session
        .run(BufReader::new(tokio::io::stdin()), tokio::signal::ctrl_c())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["pocsag-tx"]);
        assert_eq!(cli.config, PathBuf::from("config/default.toml"));
        assert_eq!(cli.port, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "pocsag-tx",
            "--config",
            "/etc/pocsag.toml",
            "--port",
            "/dev/ttyUSB3",
            "-l",
            "debug",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/pocsag.toml"));
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB3"));
        assert_eq!(cli.log_level, "debug");
    }
}
