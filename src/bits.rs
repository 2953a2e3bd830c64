//! Bits and fixed-width bit groups (nibbles and bytes)
//!
//! Protocol payloads are assembled bit by bit before encoding. The types here
//! convert between individual bits and 4-bit/8-bit groups, with bit-reversal
//! and complement operations that several appliance protocols need for
//! checksum fields.

use crate::error::{CodecError, Result};
use std::str::FromStr;

/// A single binary digit, normalized to 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bit(u8);

impl Bit {
    /// The zero bit
    pub const ZERO: Bit = Bit(0);
    /// The one bit
    pub const ONE: Bit = Bit(1);

    /// Get the bit value (0 or 1)
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether the bit is 1
    pub fn is_set(&self) -> bool {
        self.0 != 0
    }

    /// Return the complemented bit
    pub fn flipped(&self) -> Bit {
        Bit(self.0 ^ 1)
    }
}

impl From<bool> for Bit {
    fn from(value: bool) -> Self {
        Bit(if value { 1 } else { 0 })
    }
}

impl From<u8> for Bit {
    fn from(value: u8) -> Self {
        Bit(if value != 0 { 1 } else { 0 })
    }
}

impl From<&str> for Bit {
    /// `"1"` maps to 1; `"0"` and anything else map to 0
    fn from(value: &str) -> Self {
        Bit(if value == "1" { 1 } else { 0 })
    }
}

impl std::fmt::Display for Bit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 4-bit group (half byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Nibble(u8);

impl Nibble {
    /// Width of the group in bits
    pub const WIDTH: usize = 4;
    /// Maximum group value
    pub const MAX: u8 = 0x0F;

    /// Create a nibble from an integer value
    ///
    /// Values above 15 are masked to 4 bits; the excess high bits are
    /// discarded with a diagnostic. This truncation is intentional.
    pub fn new(value: u8) -> Self {
        if value > Self::MAX {
            log::warn!("nibble value {} exceeds 4 bits; stripping", value);
        }
        Nibble(value & Self::MAX)
    }

    /// Create a nibble from bits, most-significant first
    ///
    /// Fewer than 4 bits zero-extend the low positions; more than 4 is an
    /// error.
    pub fn from_bits(bits: &[Bit]) -> Result<Self> {
        if bits.len() > Self::WIDTH {
            return Err(CodecError::malformed_input(format!(
                "expected at most {} bits for a nibble, got {}",
                Self::WIDTH,
                bits.len()
            )));
        }
        let mut value = 0u8;
        for (i, bit) in bits.iter().enumerate() {
            value |= bit.value() << (Self::WIDTH - 1 - i);
        }
        Ok(Nibble(value))
    }

    /// Get the group value (0-15)
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Expand into constituent bits, most-significant first
    pub fn to_bits(&self) -> [Bit; 4] {
        [
            Bit::from(self.0 >> 3 & 1),
            Bit::from(self.0 >> 2 & 1),
            Bit::from(self.0 >> 1 & 1),
            Bit::from(self.0 & 1),
        ]
    }

    /// Return the nibble with bit significance reversed
    pub fn reversed(&self) -> Nibble {
        let mut n = self.0;
        let mut re = 0u8;
        for _ in 0..Self::WIDTH {
            re = (re << 1) | (n & 1);
            n >>= 1;
        }
        Nibble(re)
    }

    /// Return the bitwise complement within 4 bits
    pub fn flipped(&self) -> Nibble {
        Nibble(!self.0 & Self::MAX)
    }
}

impl FromStr for Nibble {
    type Err = CodecError;

    /// Parse a 4-character binary string, e.g. `"1101"`
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Self::WIDTH || !s.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(CodecError::malformed_input(format!(
                "expected a 4-character binary string, got {:?}",
                s
            )));
        }
        let value = u8::from_str_radix(s, 2)
            .map_err(|e| CodecError::malformed_input(format!("bad binary string {:?}: {}", s, e)))?;
        Ok(Nibble(value))
    }
}

impl std::fmt::Display for Nibble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04b}", self.0)
    }
}

/// An 8-bit group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Byte(u8);

impl Byte {
    /// Width of the group in bits
    pub const WIDTH: usize = 8;

    /// Create a byte from an integer value
    pub fn new(value: u8) -> Self {
        Byte(value)
    }

    /// Create a byte from bits, most-significant first
    ///
    /// Fewer than 8 bits zero-extend the low positions; more than 8 is an
    /// error.
    pub fn from_bits(bits: &[Bit]) -> Result<Self> {
        if bits.len() > Self::WIDTH {
            return Err(CodecError::malformed_input(format!(
                "expected at most {} bits for a byte, got {}",
                Self::WIDTH,
                bits.len()
            )));
        }
        let mut value = 0u8;
        for (i, bit) in bits.iter().enumerate() {
            value |= bit.value() << (Self::WIDTH - 1 - i);
        }
        Ok(Byte(value))
    }

    /// Create a byte from a single character's 8-bit character code
    pub fn from_char(c: char) -> Result<Self> {
        let code = c as u32;
        if code > 0xFF {
            return Err(CodecError::malformed_input(format!(
                "character {:?} does not fit in 8 bits",
                c
            )));
        }
        Ok(Byte(code as u8))
    }

    /// Assemble a byte from its high and low nibbles
    pub fn from_nibbles(high: Nibble, low: Nibble) -> Self {
        Byte((high.value() << 4) | low.value())
    }

    /// Get the group value (0-255)
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Expand into constituent bits, most-significant first
    pub fn to_bits(&self) -> [Bit; 8] {
        let mut bits = [Bit::ZERO; 8];
        for (i, slot) in bits.iter_mut().enumerate() {
            *slot = Bit::from(self.0 >> (Self::WIDTH - 1 - i) & 1);
        }
        bits
    }

    /// The most significant 4 bits
    pub fn high_nibble(&self) -> Nibble {
        Nibble::new((self.0 & 0xF0) >> 4)
    }

    /// The least significant 4 bits
    pub fn low_nibble(&self) -> Nibble {
        Nibble::new(self.0 & 0x0F)
    }

    /// The high and low nibbles, in that order
    pub fn to_nibbles(&self) -> [Nibble; 2] {
        [self.high_nibble(), self.low_nibble()]
    }

    /// The byte as a character
    pub fn to_char(&self) -> char {
        self.0 as char
    }

    /// Return the byte with bit significance reversed
    pub fn reversed(&self) -> Byte {
        Byte(self.0.reverse_bits())
    }

    /// Return the bitwise complement
    pub fn flipped(&self) -> Byte {
        Byte(!self.0)
    }
}

impl FromStr for Byte {
    type Err = CodecError;

    /// Parse an 8-character binary string (`"01100001"`) or a single
    /// character (`"a"`, taken as its character code)
    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Byte::from_char(c);
        }
        if s.len() != Self::WIDTH || !s.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(CodecError::malformed_input(format!(
                "expected an 8-character binary string or a single character, got {:?}",
                s
            )));
        }
        let value = u8::from_str_radix(s, 2)
            .map_err(|e| CodecError::malformed_input(format!("bad binary string {:?}: {}", s, e)))?;
        Ok(Byte(value))
    }
}

impl std::fmt::Display for Byte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

/// Group a flat bit slice into nibbles, most-significant bit first
///
/// The final group is zero-padded when the bit count is not a multiple of 4;
/// padding is reported as a diagnostic.
pub fn pack_nibbles(bits: &[Bit]) -> Vec<Nibble> {
    pack_groups(bits, Nibble::WIDTH, |chunk| {
        Nibble::from_bits(chunk).unwrap_or(Nibble(0))
    })
}

/// Group a flat bit slice into bytes, most-significant bit first
///
/// The final group is zero-padded when the bit count is not a multiple of 8;
/// padding is reported as a diagnostic.
pub fn pack_bytes(bits: &[Bit]) -> Vec<Byte> {
    pack_groups(bits, Byte::WIDTH, |chunk| {
        Byte::from_bits(chunk).unwrap_or(Byte(0))
    })
}

fn pack_groups<G>(bits: &[Bit], width: usize, make: impl Fn(&[Bit]) -> G) -> Vec<G> {
    if bits.len() % width != 0 {
        log::warn!(
            "bit count {} is not a multiple of {}; zero-padding the last group",
            bits.len(),
            width
        );
    }
    // from_bits zero-extends a short final chunk
    bits.chunks(width).map(make).collect()
}

/// Pack nibbles pairwise into raw bytes (high nibble first)
///
/// An odd nibble count is padded with a zero nibble, with a diagnostic.
pub fn nibbles_to_bytes(nibbles: &[Nibble]) -> Vec<u8> {
    if nibbles.len() % 2 != 0 {
        log::warn!("odd nibble count {}; padding with 0000", nibbles.len());
    }
    nibbles
        .chunks(2)
        .map(|pair| {
            let low = pair.get(1).copied().unwrap_or(Nibble(0));
            Byte::from_nibbles(pair[0], low).value()
        })
        .collect()
}

/// Convenience: build a bit vector from 0/1 integers
pub fn bits_from(values: &[u8]) -> Vec<Bit> {
    values.iter().map(|&v| Bit::from(v)).collect()
}
