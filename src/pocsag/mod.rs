//! # POCSAG Codec Module
//!
//! Encoder for the POCSAG paging protocol (512/1200/2400 bps text pages).
//!
//! This module handles:
//! - Address and source validation
//! - 7-bit text packing into 20-bit codeword payloads
//! - BCH(31,21) + even parity codeword finalization
//! - Batch assembly, batch-2 policy and polarity
//! - Big-endian serialization of the transmit buffer

pub mod protocol;
pub mod bch;
pub mod packer;
pub mod encoder;

pub use encoder::{encode, encode_raw, Encoder, EncoderState};
pub use protocol::{BatchPolicy, Polarity, PocsagMessage};
