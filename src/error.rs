//! Error types for range coding.

use thiserror::Error;

/// Error variants for encode and decode operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The interval could not represent the probability split for a symbol.
    ///
    /// Retry with a larger `adjustment_threshold` or a narrower alphabet.
    /// The codec also reports it, at symbol 0, for a chunk whose symbol
    /// count exceeds the threshold.
    #[error("resolution exhausted at chunk {chunk}, symbol {symbol}")]
    ResolutionExhausted {
        /// Index of the chunk being coded.
        chunk: usize,
        /// Chunk-relative index of the symbol being coded.
        symbol: usize,
    },

    /// Parameters were rejected before any coding started.
    #[error("invalid parameters: {0}")]
    InvalidParameters(&'static str),

    /// The code value fell outside the range of the symbol it selected.
    #[error("decoder desync at chunk {chunk}, symbol {symbol}")]
    DesyncDetected {
        /// Index of the chunk being decoded.
        chunk: usize,
        /// Chunk-relative index of the symbol being decoded.
        symbol: usize,
    },

    /// A chunk's model header could not be read or does not match its length.
    #[error("corrupt model header in chunk {chunk}")]
    CorruptModel {
        /// Index of the chunk being decoded.
        chunk: usize,
    },
}

impl Error {
    /// Attach a stream location to errors raised by the engine.
    pub(crate) fn at(self, chunk: usize, symbol: usize) -> Self {
        match self {
            Self::ResolutionExhausted { .. } => Self::ResolutionExhausted { chunk, symbol },
            Self::DesyncDetected { .. } => Self::DesyncDetected { chunk, symbol },
            Self::CorruptModel { .. } => Self::CorruptModel { chunk },
            other => other,
        }
    }

    pub(crate) const fn exhausted() -> Self {
        Self::ResolutionExhausted {
            chunk: 0,
            symbol: 0,
        }
    }

    pub(crate) const fn desync() -> Self {
        Self::DesyncDetected {
            chunk: 0,
            symbol: 0,
        }
    }
}

/// A specialized Result type for range coding operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_relocates_engine_errors() {
        assert_eq!(
            Error::exhausted().at(3, 17),
            Error::ResolutionExhausted {
                chunk: 3,
                symbol: 17
            }
        );
        assert_eq!(
            Error::desync().at(1, 2),
            Error::DesyncDetected {
                chunk: 1,
                symbol: 2
            }
        );
        let invalid = Error::InvalidParameters("empty input");
        assert_eq!(invalid.clone().at(5, 5), invalid);
    }
}
