//! Chunked encode/decode driver.
//!
//! Input bytes are split into symbols and cut into chunks of at most
//! `chunk_symbols`. Each chunk is coded on its own:
//!
//! ```text
//! [model header][range-coded digits][flush prefix]
//! ```
//!
//! The model header lists `count + 1` for every symbol value as an
//! Elias-gamma code. The decoder rebuilds the exact same base table
//! from it. During coding, the working model is re-derived from the base
//! table after every `adaptation_interval` symbols and biased toward the
//! symbol just coded. Chunks are concatenated bit-exactly. The decoder
//! finds each chunk's end from its own final interval.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bits::{BitReader, BitWriter};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::model::FrequencyTable;
use crate::range::{RangeDecoder, RangeEncoder};
use crate::symbol::{join_symbols, split_symbols, SymbolWidth};

/// A coded stream: bytes plus the number of meaningful bits in them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoded {
    /// Coded bits, most-significant first; the last byte is zero-padded.
    pub bytes: Vec<u8>,
    /// Exact length of the stream in bits.
    pub bit_count: u64,
}

/// Adaptive range codec with validated settings.
#[derive(Debug, Clone)]
pub struct Codec {
    config: CodecConfig,
    width: SymbolWidth,
}

impl Codec {
    /// Validate `config` and build a codec.
    ///
    /// # Errors
    /// `Error::InvalidParameters` if any setting is out of range.
    pub fn new(config: CodecConfig) -> Result<Self> {
        let width = config.validate()?;
        Ok(Self { config, width })
    }

    /// Settings in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode `data`.
    ///
    /// # Errors
    /// `InvalidParameters` for empty input; `ResolutionExhausted` if any
    /// chunk runs out of precision, in which case no output is returned.
    pub fn encode(&self, data: &[u8]) -> Result<Encoded> {
        if data.is_empty() {
            return Err(Error::InvalidParameters("empty input"));
        }
        let symbols = split_symbols(data, self.width);

        #[cfg(feature = "parallel")]
        let chunks = symbols
            .par_chunks(self.config.chunk_symbols)
            .enumerate()
            .map(|(index, chunk)| self.encode_chunk(index, chunk))
            .collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "parallel"))]
        let chunks = symbols
            .chunks(self.config.chunk_symbols)
            .enumerate()
            .map(|(index, chunk)| self.encode_chunk(index, chunk))
            .collect::<Result<Vec<_>>>()?;

        let mut out = BitWriter::new();
        for chunk in &chunks {
            out.append(chunk);
        }
        let (bytes, bit_count) = out.into_parts();
        debug!(
            bytes = data.len(),
            chunks = chunks.len(),
            bits = bit_count,
            "encoded stream"
        );
        Ok(Encoded { bytes, bit_count })
    }

    fn encode_chunk(&self, index: usize, symbols: &[u8]) -> Result<BitWriter> {
        let adaptation = &self.config.adaptation;
        let base = FrequencyTable::build(symbols, self.width.alphabet_size());
        if base.is_empty() {
            return Err(Error::InvalidParameters("empty chunk"));
        }
        // After renormalization the range is at least the threshold, so a
        // threshold below the model total lets shares truncate to nothing.
        if adaptation.adjustment_threshold < base.total() {
            debug!(
                chunk = index,
                threshold = adaptation.adjustment_threshold,
                total = base.total(),
                "threshold below model total"
            );
            return Err(Error::ResolutionExhausted {
                chunk: index,
                symbol: 0,
            });
        }

        let mut out = BitWriter::new();
        write_model(&mut out, &base);
        let mut encoder = RangeEncoder::new(
            out,
            self.width.bits(),
            adaptation.adjustment_threshold,
        );

        let mut model = base.clone();
        for (i, &symbol) in symbols.iter().enumerate() {
            if let Err(e) = encoder.encode(&model, symbol as usize) {
                debug!(chunk = index, symbol = i, "resolution exhausted");
                return Err(e.at(index, i));
            }
            if adaptation.adapts_after(i) {
                model.clone_from(&base);
                adaptation.adjust(&mut model, symbol as usize);
            }
        }

        let out = encoder.finish();
        debug!(
            chunk = index,
            symbols = symbols.len(),
            bits = out.bit_len(),
            "encoded chunk"
        );
        Ok(out)
    }

    /// Decode `original_length` bytes from the first `bit_count` bits of
    /// `bytes`.
    ///
    /// # Errors
    /// `InvalidParameters` for a zero length or a bit count larger than the
    /// buffer; `CorruptModel` or `DesyncDetected` when the stream does not
    /// match these settings.
    pub fn decode(&self, bytes: &[u8], bit_count: u64, original_length: usize) -> Result<Vec<u8>> {
        if original_length == 0 {
            return Err(Error::InvalidParameters("empty output"));
        }
        if bit_count > bytes.len() as u64 * 8 {
            return Err(Error::InvalidParameters("bit count exceeds buffer"));
        }
        let total = original_length
            .checked_mul(self.width.symbols_per_byte())
            .ok_or(Error::InvalidParameters("output length too large"))?;

        let mut reader = BitReader::new(bytes, bit_count);
        let mut symbols = Vec::with_capacity(total.min(self.config.chunk_symbols));
        let mut index = 0;
        while symbols.len() < total {
            let len = (total - symbols.len()).min(self.config.chunk_symbols);
            self.decode_chunk(index, len, &mut reader, &mut symbols)?;
            index += 1;
        }
        debug!(
            bytes = original_length,
            chunks = index,
            bits = reader.position().min(bit_count),
            "decoded stream"
        );
        Ok(join_symbols(&symbols, self.width))
    }

    fn decode_chunk(
        &self,
        index: usize,
        len: usize,
        reader: &mut BitReader<'_>,
        symbols: &mut Vec<u8>,
    ) -> Result<()> {
        let adaptation = &self.config.adaptation;
        let start = reader.position();
        let base = read_model(reader, self.width.alphabet_size(), len)
            .ok_or(Error::CorruptModel { chunk: index })?;

        let mut decoder = RangeDecoder::new(
            reader,
            self.width.bits(),
            adaptation.adjustment_threshold,
        );
        let mut model = base.clone();
        for i in 0..len {
            let symbol = decoder.decode(&model).map_err(|e| e.at(index, i))?;
            symbols.push(symbol as u8);
            if adaptation.adapts_after(i) {
                model.clone_from(&base);
                adaptation.adjust(&mut model, symbol);
            }
        }
        decoder.finish();
        debug!(
            chunk = index,
            symbols = len,
            bits = reader.position() - start,
            "decoded chunk"
        );
        Ok(())
    }
}

/// Write `count + 1` for each symbol as an Elias-gamma code.
fn write_model(out: &mut BitWriter, table: &FrequencyTable) {
    for &count in table.counts() {
        out.write_gamma(count + 1);
    }
}

/// Read a model header; `None` unless it is well formed and sums to `len`.
fn read_model(reader: &mut BitReader<'_>, alphabet_size: usize, len: usize) -> Option<FrequencyTable> {
    let mut counts = Vec::with_capacity(alphabet_size);
    let mut sum = 0u64;
    for _ in 0..alphabet_size {
        let count = reader.read_gamma()? - 1;
        sum += u64::from(count);
        if sum > len as u64 {
            return None;
        }
        counts.push(count);
    }
    (sum == len as u64).then(|| FrequencyTable::from_counts(counts))
}

/// Encode `data` with `alphabet_width`-bit symbols and default adaptation.
///
/// Returns the coded bytes and exact bit count. The caller must keep
/// `bit_count`, `data.len()`, `alphabet_width` and `adjustment_threshold`
/// to decode.
///
/// # Errors
/// See [`Codec::encode`]; also `InvalidParameters` for a bad width or
/// threshold.
pub fn encode(data: &[u8], alphabet_width: u32, adjustment_threshold: u32) -> Result<Encoded> {
    let config = CodecConfig::default()
        .with_symbol_bits(alphabet_width)
        .with_adjustment_threshold(adjustment_threshold);
    Codec::new(config)?.encode(data)
}

/// Inverse of [`encode`].
///
/// # Errors
/// See [`Codec::decode`].
pub fn decode(
    bits: &[u8],
    bit_count: u64,
    alphabet_width: u32,
    adjustment_threshold: u32,
    original_length: usize,
) -> Result<Vec<u8>> {
    let config = CodecConfig::default()
        .with_symbol_bits(alphabet_width)
        .with_adjustment_threshold(adjustment_threshold);
    Codec::new(config)?.decode(bits, bit_count, original_length)
}
