//! Codec configuration.
//!
//! The stream carries no header, so a consumer must store these settings
//! next to the payload. `CodecConfig` is serde-serializable for that.

use serde::{Deserialize, Serialize};

use crate::adapt::AdaptationParams;
use crate::error::{Error, Result};
use crate::range::STATE_BITS;
use crate::symbol::SymbolWidth;

/// Default symbols per chunk.
pub const DEFAULT_CHUNK_SYMBOLS: usize = 64_800;
/// Largest accepted chunk.
pub const MAX_CHUNK_SYMBOLS: usize = 1 << 24;

/// Settings shared by encoder and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Bits per symbol: 1, 2, 4 or 8.
    pub symbol_bits: u32,
    /// Symbols per independently modelled chunk.
    pub chunk_symbols: usize,
    /// Renormalization and adaptation tuning.
    pub adaptation: AdaptationParams,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            symbol_bits: 8,
            chunk_symbols: DEFAULT_CHUNK_SYMBOLS,
            adaptation: AdaptationParams::default(),
        }
    }
}

impl CodecConfig {
    /// Set the symbol width in bits.
    pub fn with_symbol_bits(mut self, bits: u32) -> Self {
        self.symbol_bits = bits;
        self
    }

    /// Set the minimum range width before forced renormalization.
    pub fn with_adjustment_threshold(mut self, threshold: u32) -> Self {
        self.adaptation.adjustment_threshold = threshold;
        self
    }

    /// Set the chunk length in symbols.
    pub fn with_chunk_symbols(mut self, chunk_symbols: usize) -> Self {
        self.chunk_symbols = chunk_symbols;
        self
    }

    /// Replace the adaptation parameters.
    pub fn with_adaptation(mut self, adaptation: AdaptationParams) -> Self {
        self.adaptation = adaptation;
        self
    }

    /// Check every field, returning the parsed symbol width.
    ///
    /// # Errors
    /// `Error::InvalidParameters` naming the first offending field.
    pub fn validate(&self) -> Result<SymbolWidth> {
        let width = SymbolWidth::from_bits(self.symbol_bits)?;
        let threshold = u64::from(self.adaptation.adjustment_threshold);
        if threshold == 0 {
            return Err(Error::InvalidParameters(
                "adjustment threshold must be positive",
            ));
        }
        if threshold * width.alphabet_size() as u64 > 1u64 << STATE_BITS {
            return Err(Error::InvalidParameters(
                "adjustment threshold too large for the alphabet",
            ));
        }
        if self.chunk_symbols == 0 || self.chunk_symbols > MAX_CHUNK_SYMBOLS {
            return Err(Error::InvalidParameters("chunk size out of range"));
        }
        if self.adaptation.adaptation_interval == 0 {
            return Err(Error::InvalidParameters(
                "adaptation interval must be positive",
            ));
        }
        if self.adaptation.reduction_percent > 100 {
            return Err(Error::InvalidParameters(
                "reduction percent must not exceed 100",
            ));
        }
        Ok(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(CodecConfig::default().validate(), Ok(SymbolWidth::Eight));
    }

    #[test]
    fn test_rejects_bad_fields() {
        let base = CodecConfig::default();
        assert!(base.with_symbol_bits(3).validate().is_err());
        assert!(base.with_adjustment_threshold(0).validate().is_err());
        assert!(base.with_adjustment_threshold((1 << 24) + 1).validate().is_err());
        assert!(base.with_chunk_symbols(0).validate().is_err());
        assert!(base.with_chunk_symbols(MAX_CHUNK_SYMBOLS + 1).validate().is_err());

        let mut adaptation = AdaptationParams::default();
        adaptation.adaptation_interval = 0;
        assert!(base.with_adaptation(adaptation).validate().is_err());

        let mut adaptation = AdaptationParams::default();
        adaptation.reduction_percent = 101;
        assert!(base.with_adaptation(adaptation).validate().is_err());
    }

    #[test]
    fn test_threshold_limit_scales_with_width() {
        let nibbles = CodecConfig::default().with_symbol_bits(4);
        assert!(nibbles.with_adjustment_threshold(1 << 28).validate().is_ok());
        assert!(nibbles.with_adjustment_threshold((1 << 28) + 1).validate().is_err());
        assert!(CodecConfig::default()
            .with_adjustment_threshold(1 << 24)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_serde_roundtrip_with_defaults() {
        let config = CodecConfig::default()
            .with_symbol_bits(4)
            .with_adjustment_threshold(32_768);
        let json = serde_json::to_string(&config).unwrap();
        let back: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: CodecConfig = serde_json::from_str(r#"{"symbol_bits": 2}"#).unwrap();
        assert_eq!(partial.symbol_bits, 2);
        assert_eq!(partial.chunk_symbols, DEFAULT_CHUNK_SYMBOLS);
        assert_eq!(partial.adaptation, AdaptationParams::default());
    }
}
