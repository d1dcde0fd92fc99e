//! # POCSAG Message Encoder
//!
//! Builds a complete POCSAG transmission (preamble + one or two batches)
//! from a pager address, source qualifier and text.

use tracing::{debug, warn};

use super::bch::bch_encode;
use super::packer::pack_text;
use super::protocol::*;
use crate::error::EncodeError;

/// Encode a text page
///
/// # Arguments
///
/// * `address` - Pager address (1..=0x1FFFFF)
/// * `source` - Source qualifier (0..=3)
/// * `text` - Message text; only the first 40 octets are sent
/// * `policy` - What to do with the second batch when the text fits in one
/// * `polarity` - Normal or inverted bit polarity
///
/// # Returns
///
/// * `Result<PocsagMessage, EncodeError>` - 140 or 208 octet message
///
/// # Errors
///
/// Returns `InvalidAddress` or `InvalidSource` for out-of-range inputs,
/// checked in that order.
///
/// # Examples
///
/// ```
/// use pocsag_tx::pocsag::encoder::encode;
/// use pocsag_tx::pocsag::protocol::{BatchPolicy, Polarity};
///
/// let message = encode(123456, 0, "TEST", BatchPolicy::Truncate, Polarity::Normal).unwrap();
/// assert_eq!(message.len(), 140);
/// assert_eq!(&message.as_bytes()[72..76], &[0x7C, 0xD2, 0x15, 0xD8]);
/// ```
pub fn encode(
    address: u32,
    source: u8,
    text: &str,
    policy: BatchPolicy,
    polarity: Polarity,
) -> Result<PocsagMessage, EncodeError> {
    if address == 0 || address > MAX_ADDRESS {
        return Err(EncodeError::InvalidAddress(address as i64));
    }

    if source > MAX_SOURCE {
        return Err(EncodeError::InvalidSource(source as i64));
    }

    let text = text.as_bytes();
    if text.len() > MAX_TEXT_LEN {
        warn!(
            "Message text truncated to {} characters ({} dropped)",
            MAX_TEXT_LEN,
            text.len() - MAX_TEXT_LEN
        );
    }

    let mut slots = [IDLE_CODEWORD; TOTAL_SLOTS];

    // Address codeword goes in the first slot of the address's frame
    let mut frame = ((address & 0x7) << 1) as usize;
    let address_word = ((address >> 3) << 2) | source as u32;
    slots[frame] = bch_encode(address_word << 11);

    // Text codewords follow, spilling into the second batch if needed
    let packed = pack_text(text);
    for payload in packed.codeword_payloads() {
        frame += 1;
        slots[frame] = bch_encode(payload);
    }

    let single_batch = frame < CODEWORDS_PER_BATCH;
    if single_batch && policy == BatchPolicy::DuplicateToSecondBatch {
        slots.copy_within(..CODEWORDS_PER_BATCH, CODEWORDS_PER_BATCH);
    }

    let len = if single_batch && policy == BatchPolicy::Truncate {
        SINGLE_BATCH_MESSAGE_SIZE
    } else {
        MAX_MESSAGE_SIZE
    };

    debug!(
        "Encoded address {} source {}: {} text codewords, last slot {}, {} octets",
        address,
        source,
        packed.codeword_count(),
        frame,
        len
    );

    Ok(PocsagMessage::from_parts(serialize(&slots, polarity), len))
}

/// Encode a text page from integer options
///
/// Option values: batch `0` truncate, `1` duplicate, `2` idle;
/// polarity `0` normal, `1` inverted.
///
/// # Errors
///
/// Validates address, source, batch option and polarity option in that
/// order and returns the first violation.
pub fn encode_raw(
    address: i64,
    source: i64,
    text: &str,
    batch_option: i64,
    polarity_option: i64,
) -> Result<PocsagMessage, EncodeError> {
    let address = check_address(address)?;
    let source = check_source(source)?;
    let policy = BatchPolicy::try_from(batch_option)?;
    let polarity = Polarity::try_from(polarity_option)?;

    encode(address, source, text, policy, polarity)
}

fn check_address(address: i64) -> Result<u32, EncodeError> {
    u32::try_from(address)
        .ok()
        .filter(|a| (1..=MAX_ADDRESS).contains(a))
        .ok_or(EncodeError::InvalidAddress(address))
}

fn check_source(source: i64) -> Result<u8, EncodeError> {
    u8::try_from(source)
        .ok()
        .filter(|s| *s <= MAX_SOURCE)
        .ok_or(EncodeError::InvalidSource(source))
}

/// Lay out preamble, sync codewords and slots as big-endian octets
fn serialize(slots: &[u32; TOTAL_SLOTS], polarity: Polarity) -> [u8; MAX_MESSAGE_SIZE] {
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    buf[..PREAMBLE_LEN].fill(polarity.preamble_octet());

    let sync = polarity.apply(BATCH_SYNC).to_be_bytes();
    for (batch, words) in slots.chunks_exact(CODEWORDS_PER_BATCH).enumerate() {
        let start = PREAMBLE_LEN + batch * BATCH_SIZE;
        buf[start..start + CODEWORD_SIZE].copy_from_slice(&sync);

        let body = &mut buf[start + CODEWORD_SIZE..start + BATCH_SIZE];
        for (chunk, &word) in body.chunks_exact_mut(CODEWORD_SIZE).zip(words) {
            chunk.copy_from_slice(&polarity.apply(word).to_be_bytes());
        }
    }

    buf
}

/// Whether the encoder context currently holds a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncoderState {
    #[default]
    Empty,
    Message,
}

/// Reusable encoder context
///
/// Holds the last message together with its state, size and error.
/// Every call to [`Encoder::encode`] resets all of them first, so a failed
/// call never leaves a stale message behind.
#[derive(Debug, Clone)]
pub struct Encoder {
    message: Option<PocsagMessage>,
    state: EncoderState,
    size: usize,
    error: EncodeError,
}

impl Default for Encoder {
    fn default() -> Self {
        Self {
            message: None,
            state: EncoderState::Empty,
            size: 0,
            error: EncodeError::Undetermined,
        }
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode into this context
    ///
    /// Address and source are taken as signed integers so that operator
    /// input reaches validation unclamped.
    ///
    /// # Returns
    ///
    /// * `Result<&PocsagMessage, EncodeError>` - The stored message, or the stored error
    pub fn encode(
        &mut self,
        address: i64,
        source: i64,
        text: &str,
        policy: BatchPolicy,
        polarity: Polarity,
    ) -> Result<&PocsagMessage, EncodeError> {
        *self = Self::default();

        let outcome = check_address(address).and_then(|address| {
            let source = check_source(source)?;
            encode(address, source, text, policy, polarity)
        });

        match outcome {
            Ok(message) => {
                self.state = EncoderState::Message;
                self.size = message.len();
                Ok(self.message.insert(message))
            }
            Err(e) => {
                self.error = e;
                Err(e)
            }
        }
    }

    pub fn state(&self) -> EncoderState {
        self.state
    }

    /// Size in octets of the stored message (0 when empty)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Error of the last failed call; `Undetermined` otherwise
    pub fn error(&self) -> EncodeError {
        self.error
    }

    /// The stored message, only present after a successful call
    pub fn message(&self) -> Option<&PocsagMessage> {
        self.message.as_ref()
    }
}
