//! Splitting bytes into coding symbols.
//!
//! A symbol is `bits` wide, where `bits` divides 8. Each byte yields
//! `8 / bits` symbols, most-significant first, so a nibble stream of
//! `0xAB` reads `0xA, 0xB`.

use crate::error::{Error, Result};

/// Width of one coding symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolWidth {
    /// Binary alphabet.
    One,
    /// Four symbols.
    Two,
    /// Nibbles (16 symbols).
    Four,
    /// Whole bytes (256 symbols).
    Eight,
}

impl SymbolWidth {
    /// Parse a width in bits.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameters` unless `bits` is 1, 2, 4 or 8.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            _ => Err(Error::InvalidParameters(
                "symbol width must be 1, 2, 4 or 8 bits",
            )),
        }
    }

    /// Bits per symbol.
    pub const fn bits(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Number of distinct symbol values.
    pub const fn alphabet_size(self) -> usize {
        1 << self.bits()
    }

    /// Symbols carried by one byte.
    pub const fn symbols_per_byte(self) -> usize {
        8 / self.bits() as usize
    }

    const fn mask(self) -> u8 {
        (self.alphabet_size() - 1) as u8
    }
}

/// Split bytes into symbols, most-significant symbol of each byte first.
pub fn split_symbols(data: &[u8], width: SymbolWidth) -> Vec<u8> {
    if width == SymbolWidth::Eight {
        return data.to_vec();
    }
    let bits = width.bits();
    let per_byte = width.symbols_per_byte();
    let mut symbols = Vec::with_capacity(data.len() * per_byte);
    for &byte in data {
        for j in (0..per_byte).rev() {
            symbols.push((byte >> (bits as usize * j)) & width.mask());
        }
    }
    symbols
}

/// Pack symbols back into bytes. Inverse of [`split_symbols`].
///
/// A trailing partial byte is padded with zero symbols.
pub fn join_symbols(symbols: &[u8], width: SymbolWidth) -> Vec<u8> {
    if width == SymbolWidth::Eight {
        return symbols.to_vec();
    }
    let bits = width.bits();
    let per_byte = width.symbols_per_byte();
    symbols
        .chunks(per_byte)
        .map(|group| {
            group.iter().enumerate().fold(0u8, |byte, (i, &s)| {
                byte | ((s & width.mask()) << (bits as usize * (per_byte - 1 - i)))
            })
        })
        .collect()
}
