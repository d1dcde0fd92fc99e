//! # Operator Commands
//!
//! Parses the line-oriented operator protocol:
//!
//! ```text
//! P <address> <source> <repeat> <message>    send a page
//! F <mhz> <hundred-hz>                       change frequency
//! ```
//!
//! The command letter is case-insensitive. The message is the rest of the
//! line and is cut at 40 characters; quotes are sent as typed.

use crate::error::{PagerError, Result};
use crate::frequency::Frequency;
use crate::pocsag::protocol::MAX_TEXT_LEN;

const PAGE_USAGE: &str =
    "Invalid P command format. Use: P <address> <source> <repeat> <message> (e.g. P 123456 0 1 Hello World)";

const FREQUENCY_USAGE: &str =
    "Invalid F command format. Use: F <freqmhz> <freq100Hz> (e.g. F 433 9200 for 433.9200 MHz)";

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Encode and transmit a page
    Page {
        /// Pager address, range-checked by the encoder
        address: i64,
        /// Source qualifier, range-checked by the encoder
        source: i64,
        /// Extra transmissions after the first one
        repeat: u32,
        /// Message text (at most 40 characters)
        text: String,
    },

    /// Switch the carrier frequency
    SetFrequency(Frequency),
}

/// Parse one input line
///
/// # Returns
///
/// * `Result<Option<Command>>` - `None` for blank lines
///
/// # Errors
///
/// Returns `PagerError::Command` for unknown commands, malformed arguments
/// and out-of-band frequencies
///
/// # Examples
///
/// ```
/// use pocsag_tx::command::{parse_command, Command};
///
/// let command = parse_command("P 123456 0 1 Hello World").unwrap();
/// assert_eq!(command, Some(Command::Page {
///     address: 123456,
///     source: 0,
///     repeat: 1,
///     text: "Hello World".to_string(),
/// }));
/// ```
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut chars = line.chars();

    let Some(letter) = chars.next() else {
        return Ok(None);
    };
    let args = chars.as_str();

    match letter.to_ascii_uppercase() {
        'P' => parse_page(args).map(Some),
        'F' => parse_frequency(args).map(Some),
        c if c.is_whitespace() && line.trim().is_empty() => Ok(None),
        _ => Err(PagerError::Command("Unknown command. Use P or F.".to_string())),
    }
}

fn parse_page(args: &str) -> Result<Command> {
    let usage = || PagerError::Command(PAGE_USAGE.to_string());

    let (address, rest) = next_token(args).ok_or_else(usage)?;
    let (source, rest) = next_token(rest).ok_or_else(usage)?;
    let (repeat, rest) = next_token(rest).ok_or_else(usage)?;

    let address: i64 = address.parse().map_err(|_| usage())?;
    let source: i64 = source.parse().map_err(|_| usage())?;
    let repeat: u32 = repeat.parse().map_err(|_| {
        PagerError::Command(format!("repeat must be a non-negative integer, got '{}'", repeat))
    })?;

    let text: String = rest.trim_start().chars().take(MAX_TEXT_LEN).collect();
    if text.is_empty() {
        return Err(usage());
    }

    Ok(Command::Page {
        address,
        source,
        repeat,
        text,
    })
}

fn parse_frequency(args: &str) -> Result<Command> {
    let usage = || PagerError::Command(FREQUENCY_USAGE.to_string());

    let (mhz, rest) = next_token(args).ok_or_else(usage)?;
    let (hundred_hz, _) = next_token(rest).ok_or_else(usage)?;

    let mhz: u32 = mhz.parse().map_err(|_| usage())?;
    let hundred_hz: u32 = hundred_hz.parse().map_err(|_| usage())?;

    Frequency::new(mhz, hundred_hz).map(Command::SetFrequency)
}

/// Split off the next whitespace-delimited token
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}
