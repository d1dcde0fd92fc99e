//! # BCH(31,21) + Even Parity
//!
//! Codeword finalization for POCSAG.
//!
//! **Generator**: x^10 + x^9 + x^8 + x^6 + x^5 + x^3 + 1 (`0xED200000` top-aligned)
//!
//! A codeword is laid out as:
//!
//! ```text
//! bit 31      : function bit (0 = address, 1 = text)
//! bits 30..11 : 20 payload bits
//! bits 10..1  : BCH remainder
//! bit 0       : even parity over the whole word
//! ```

use super::protocol::BCH_GENERATOR;

/// Bits covered by the BCH code (function bit + payload)
pub const DATA_MASK: u32 = 0xFFFF_F800;

/// Bits produced by finalization (remainder + parity)
pub const CHECK_MASK: u32 = !DATA_MASK;

/// Number of data bits the remainder is computed over
const DATA_BITS: u32 = 21;

/// Compute the 10-bit BCH remainder over the top 21 bits of `word`
///
/// The low 11 bits of `word` are ignored. The result is already shifted
/// into bits 10..1, leaving bit 0 free for parity.
pub const fn bch_remainder(word: u32) -> u32 {
    let mut cw = word & DATA_MASK;
    let mut bit = 0;

    while bit < DATA_BITS {
        if cw & 0x8000_0000 != 0 {
            cw ^= BCH_GENERATOR;
        }
        cw <<= 1;
        bit += 1;
    }

    cw >> DATA_BITS
}

/// Finalize a codeword: append the BCH remainder and set even parity
///
/// # Examples
///
/// ```
/// use pocsag_tx::pocsag::bch::bch_encode;
///
/// assert_eq!(bch_encode(0x8000_0000), 0x8000_0769);
/// ```
pub const fn bch_encode(word: u32) -> u32 {
    let cw = (word & DATA_MASK) | bch_remainder(word);

    // remainder leaves bit 0 clear, so +1 only touches the parity bit
    if cw.count_ones() % 2 == 1 {
        cw + 1
    } else {
        cw
    }
}

/// Check that a codeword's low 11 bits match its own top 21 bits
pub const fn is_valid_codeword(cw: u32) -> bool {
    bch_encode(cw) & CHECK_MASK == cw & CHECK_MASK
}
