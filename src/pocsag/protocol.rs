//! # POCSAG Protocol Constants and Types
//!
//! Core protocol definitions for the POCSAG paging wire format.

use serde::Deserialize;

use crate::error::EncodeError;

/// Preamble octet for normal polarity (alternating 1010...)
pub const PREAMBLE_NORMAL: u8 = 0xAA;

/// Preamble octet for inverted polarity (bitwise complement of `PREAMBLE_NORMAL`)
pub const PREAMBLE_INVERTED: u8 = 0x55;

/// Preamble length in octets (576 bits of bit sync)
pub const PREAMBLE_LEN: usize = 72;

/// Batch synchronization codeword, sent at the head of every batch
pub const BATCH_SYNC: u32 = 0x7CD2_15D8;

/// Filler codeword for slots that carry no address or text
pub const IDLE_CODEWORD: u32 = 0x7A89_C197;

/// BCH(31,21) generator polynomial, aligned to the top of a 32-bit word
pub const BCH_GENERATOR: u32 = 0xED20_0000;

/// Function bit marking a text codeword (address codewords have it clear)
pub const TEXT_CODEWORD_FLAG: u32 = 0x8000_0000;

/// Size of one codeword on the wire
pub const CODEWORD_SIZE: usize = 4;

/// Codeword slots per batch
pub const CODEWORDS_PER_BATCH: usize = 16;

/// Frames per batch (each frame is two consecutive codeword slots)
pub const FRAMES_PER_BATCH: usize = 8;

/// Batches a message can span
pub const MAX_BATCHES: usize = 2;

/// Total codeword slots across both batches
pub const TOTAL_SLOTS: usize = CODEWORDS_PER_BATCH * MAX_BATCHES;

/// Batch size on the wire: sync codeword + 16 codewords (68 octets)
pub const BATCH_SIZE: usize = CODEWORD_SIZE + CODEWORDS_PER_BATCH * CODEWORD_SIZE;

/// Message size when only the first batch is sent (140 octets)
pub const SINGLE_BATCH_MESSAGE_SIZE: usize = PREAMBLE_LEN + BATCH_SIZE;

/// Message size when both batches are sent (208 octets)
pub const MAX_MESSAGE_SIZE: usize = PREAMBLE_LEN + MAX_BATCHES * BATCH_SIZE;

/// Highest valid pager address (21 bits)
pub const MAX_ADDRESS: u32 = 0x1F_FFFF;

/// Highest valid source qualifier (2 bits)
pub const MAX_SOURCE: u8 = 3;

/// Maximum number of text characters encoded before the EOT sentinel
pub const MAX_TEXT_LEN: usize = 40;

/// End-of-transmission sentinel appended to every text
pub const EOT: u8 = 0x04;

/// Scratch capacity for packed text octets
pub const PACKED_TEXT_CAPACITY: usize = 56;

/// What to do with the second batch when the text fits in the first one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum BatchPolicy {
    /// Emit only the first batch (140 octets)
    #[default]
    #[serde(rename = "truncate")]
    Truncate,

    /// Copy the first batch into the second one (208 octets)
    #[serde(rename = "duplicate")]
    DuplicateToSecondBatch,

    /// Emit the second batch filled with idle codewords (208 octets)
    #[serde(rename = "idle")]
    LeaveIdle,
}

impl TryFrom<i64> for BatchPolicy {
    type Error = EncodeError;

    fn try_from(option: i64) -> Result<Self, Self::Error> {
        match option {
            0 => Ok(Self::Truncate),
            1 => Ok(Self::DuplicateToSecondBatch),
            2 => Ok(Self::LeaveIdle),
            other => Err(EncodeError::InvalidBatchOption(other)),
        }
    }
}

/// Bit polarity of the transmitted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    Normal,
    Inverted,
}

impl Polarity {
    /// Apply this polarity to a 32-bit codeword
    pub fn apply(self, word: u32) -> u32 {
        match self {
            Self::Normal => word,
            Self::Inverted => !word,
        }
    }

    /// Preamble octet for this polarity
    pub fn preamble_octet(self) -> u8 {
        match self {
            Self::Normal => PREAMBLE_NORMAL,
            Self::Inverted => PREAMBLE_INVERTED,
        }
    }
}

impl TryFrom<i64> for Polarity {
    type Error = EncodeError;

    fn try_from(option: i64) -> Result<Self, Self::Error> {
        match option {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Inverted),
            other => Err(EncodeError::InvalidPolarityOption(other)),
        }
    }
}

/// Encoded POCSAG message ready for transmission
///
/// Layout: 72-octet preamble, then one or two batches of
/// `sync codeword + 16 codewords`, every codeword big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PocsagMessage {
    buf: [u8; MAX_MESSAGE_SIZE],
    len: usize,
}

impl PocsagMessage {
    pub(crate) fn from_parts(buf: [u8; MAX_MESSAGE_SIZE], len: usize) -> Self {
        debug_assert!(len == SINGLE_BATCH_MESSAGE_SIZE || len == MAX_MESSAGE_SIZE);
        Self { buf, len }
    }

    /// Octets to hand to the transmitter
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Message length in octets (140 or 208)
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a message holds at least the preamble and one batch
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of batches on the wire (1 or 2)
    pub fn batch_count(&self) -> usize {
        (self.len - PREAMBLE_LEN) / BATCH_SIZE
    }

    /// The preamble octets
    pub fn preamble(&self) -> &[u8] {
        &self.buf[..PREAMBLE_LEN]
    }

    /// Read back the batch sync codeword heading `batch`, as transmitted
    pub fn batch_sync(&self, batch: usize) -> Option<u32> {
        if batch >= self.batch_count() {
            return None;
        }
        Some(self.word_at(PREAMBLE_LEN + batch * BATCH_SIZE))
    }

    /// Read back the codeword in `slot` (0..32), as transmitted
    ///
    /// Slots 16..32 belong to the second batch and are `None` when
    /// only one batch is sent.
    pub fn codeword(&self, slot: usize) -> Option<u32> {
        if slot >= self.batch_count() * CODEWORDS_PER_BATCH {
            return None;
        }
        let batch = slot / CODEWORDS_PER_BATCH;
        let index = slot % CODEWORDS_PER_BATCH;
        Some(self.word_at(
            PREAMBLE_LEN + batch * BATCH_SIZE + CODEWORD_SIZE + index * CODEWORD_SIZE,
        ))
    }

    fn word_at(&self, offset: usize) -> u32 {
        u32::from_be_bytes([
            self.buf[offset],
            self.buf[offset + 1],
            self.buf[offset + 2],
            self.buf[offset + 3],
        ])
    }
}

impl AsRef<[u8]> for PocsagMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_constants() {
        assert_eq!(BATCH_SIZE, 68);
        assert_eq!(SINGLE_BATCH_MESSAGE_SIZE, 140);
        assert_eq!(MAX_MESSAGE_SIZE, 208);
        assert_eq!(TOTAL_SLOTS, 32);
        assert_eq!(FRAMES_PER_BATCH * 2, CODEWORDS_PER_BATCH);
    }

    #[test]
    fn test_preamble_patterns_are_complements() {
        assert_eq!(!PREAMBLE_NORMAL, PREAMBLE_INVERTED);
        assert_eq!(Polarity::Normal.preamble_octet(), 0xAA);
        assert_eq!(Polarity::Inverted.preamble_octet(), 0x55);
    }

    #[test]
    fn test_polarity_apply() {
        assert_eq!(Polarity::Normal.apply(IDLE_CODEWORD), IDLE_CODEWORD);
        assert_eq!(Polarity::Inverted.apply(IDLE_CODEWORD), 0x8576_3E68);
        assert_eq!(Polarity::Inverted.apply(BATCH_SYNC), 0x832D_EA27);
    }

    #[test]
    fn test_batch_policy_from_option() {
        assert_eq!(BatchPolicy::try_from(0), Ok(BatchPolicy::Truncate));
        assert_eq!(BatchPolicy::try_from(1), Ok(BatchPolicy::DuplicateToSecondBatch));
        assert_eq!(BatchPolicy::try_from(2), Ok(BatchPolicy::LeaveIdle));
        assert_eq!(BatchPolicy::try_from(3), Err(EncodeError::InvalidBatchOption(3)));
        assert_eq!(BatchPolicy::try_from(-1), Err(EncodeError::InvalidBatchOption(-1)));
    }

    #[test]
    fn test_polarity_from_option() {
        assert_eq!(Polarity::try_from(0), Ok(Polarity::Normal));
        assert_eq!(Polarity::try_from(1), Ok(Polarity::Inverted));
        assert_eq!(Polarity::try_from(2), Err(EncodeError::InvalidPolarityOption(2)));
    }

    #[test]
    fn test_options_deserialize_from_config_names() {
        #[derive(Deserialize)]
        struct Options {
            batch_policy: BatchPolicy,
            polarity: Polarity,
        }

        let options: Options =
            toml::from_str("batch_policy = \"duplicate\"\npolarity = \"inverted\"").unwrap();
        assert_eq!(options.batch_policy, BatchPolicy::DuplicateToSecondBatch);
        assert_eq!(options.polarity, Polarity::Inverted);

        let options: Options =
            toml::from_str("batch_policy = \"idle\"\npolarity = \"normal\"").unwrap();
        assert_eq!(options.batch_policy, BatchPolicy::LeaveIdle);
        assert_eq!(options.polarity, Polarity::Normal);
    }

    #[test]
    fn test_message_accessors() {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        buf[PREAMBLE_LEN..PREAMBLE_LEN + 4].copy_from_slice(&BATCH_SYNC.to_be_bytes());
        buf[PREAMBLE_LEN + 4..PREAMBLE_LEN + 8].copy_from_slice(&IDLE_CODEWORD.to_be_bytes());

        let message = PocsagMessage::from_parts(buf, SINGLE_BATCH_MESSAGE_SIZE);
        assert_eq!(message.len(), 140);
        assert!(!message.is_empty());
        assert_eq!(message.batch_count(), 1);
        assert_eq!(message.batch_sync(0), Some(BATCH_SYNC));
        assert_eq!(message.batch_sync(1), None);
        assert_eq!(message.codeword(0), Some(IDLE_CODEWORD));
        assert_eq!(message.codeword(15), Some(0));
        assert_eq!(message.codeword(16), None);
        assert_eq!(message.as_bytes().len(), 140);
    }
}
