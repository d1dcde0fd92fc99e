//! # Text Bit Packer
//!
//! Repacks 7-bit characters into the 20-bit payloads of POCSAG text codewords.
//!
//! Characters are sent least significant bit first, so each one is bit-reversed
//! over its low 7 bits before joining the bitstream. The stream is cut into
//! codewords of three scratch octets each:
//!
//! ```text
//! octet 0: 1xxxxxxx   marker bit (function bit = 1) + 7 payload bits
//! octet 1: xxxxxxxx   8 payload bits
//! octet 2: 000xxxxx   5 payload bits
//! ```
//!
//! which land at bits 31..24, 23..16 and 15..11 of the final codeword.

use super::protocol::{EOT, MAX_TEXT_LEN, PACKED_TEXT_CAPACITY, TEXT_CODEWORD_FLAG};

/// Bits taken from every character
const CHAR_BITS: u32 = 7;

/// Payload bits held by each scratch octet of a codeword, in order
const OCTET_WIDTHS: [u32; 3] = [7, 8, 5];

/// First octet of every text codeword starts with the function bit set
const TEXT_OCTET_MARKER: u8 = (TEXT_CODEWORD_FLAG >> 24) as u8;

/// Reverse the order of the low 7 bits of a character
///
/// Bit 7 of the input is dropped.
pub const fn reverse_char_bits(c: u8) -> u8 {
    let mut c_in = c;
    let mut c_out = 0u8;
    let mut bit = 0;

    while bit < CHAR_BITS {
        c_out = (c_out << 1) | (c_in & 0x01);
        c_in >>= 1;
        bit += 1;
    }

    c_out
}

/// Packed text octets, three per text codeword
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedText {
    octets: [u8; PACKED_TEXT_CAPACITY],
    len: usize,
}

impl PackedText {
    /// Packed octets in use
    pub fn as_octets(&self) -> &[u8] {
        &self.octets[..self.len]
    }

    /// Number of text codewords the packed octets fill
    pub fn codeword_count(&self) -> usize {
        self.len.div_ceil(3)
    }

    /// Text codewords without BCH/parity (low 11 bits zero)
    pub fn codeword_payloads(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).step_by(3).map(move |l| {
            (self.octets[l] as u32) << 24
                | (self.octets[l + 1] as u32) << 16
                | (self.octets[l + 2] as u32) << 11
        })
    }
}

/// Pack `text` plus the EOT sentinel into codeword octets
///
/// Only the first 40 octets of `text` are used. The sentinel is appended
/// to a private copy; the caller's text is never touched.
pub fn pack_text(text: &[u8]) -> PackedText {
    let kept = text.len().min(MAX_TEXT_LEN);
    let mut scratch = [0u8; MAX_TEXT_LEN + 1];
    scratch[..kept].copy_from_slice(&text[..kept]);
    scratch[kept] = EOT;
    let input = &scratch[..=kept];

    let mut octets = [0u8; PACKED_TEXT_CAPACITY];
    octets[0] = TEXT_OCTET_MARKER;

    // output cursor
    let mut out_index = 0usize;
    let mut out_phase = 0usize;
    let mut out_free = OCTET_WIDTHS[0];

    // input cursor
    let mut in_index = 0usize;
    let mut current = reverse_char_bits(input[0]);
    let mut in_left = CHAR_BITS;

    loop {
        let count = in_left.min(out_free);
        let mask = ((1u8 << count) - 1) << (in_left - count);
        let mut bits = current & mask;

        if in_left > out_free {
            bits >>= in_left - out_free;
        } else {
            bits <<= out_free - in_left;
        }
        octets[out_index] |= bits;

        in_left -= count;
        out_free -= count;

        if out_free == 0 {
            out_index += 1;
            out_phase = (out_phase + 1) % OCTET_WIDTHS.len();
            out_free = OCTET_WIDTHS[out_phase];
            octets[out_index] = if out_phase == 0 { TEXT_OCTET_MARKER } else { 0x00 };
        }

        if in_left == 0 {
            in_index += 1;
            match input.get(in_index) {
                Some(&c) => {
                    current = reverse_char_bits(c);
                    in_left = CHAR_BITS;
                }
                None => break,
            }
        }
    }

    PackedText {
        octets,
        len: out_index + 1,
    }
}
