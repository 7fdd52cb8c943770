//! Finite-precision range coding engine.
//!
//! The coder tracks a 32-bit closed interval `[low, high]` that stands in
//! for an infinite-precision probability interval. Each symbol narrows it
//! in proportion to the model. When the top digit (`bits_per_symbol`
//! bits) of `low` and `high` agrees, that digit is final: it is emitted
//! and both bounds are shifted left, `low` refilled with zeros and `high`
//! with ones.
//!
//! If the interval straddles a digit boundary while being narrower than
//! `adjustment_threshold`, it would keep shrinking without ever settling a
//! digit. The coder then pulls `high` down to the last value sharing
//! `low`'s top digit. It gives up some precision but always makes
//! progress, and no carry can ever reach digits already emitted.
//!
//! Encoder and decoder share [`Interval`], so narrowing and
//! renormalization are identical on both sides by construction.

use tracing::trace;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::model::FrequencyTable;

/// Width of the interval registers.
pub const STATE_BITS: u32 = 32;

/// Closed coding interval `[low, high]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    /// Lower bound, inclusive.
    pub low: u32,
    /// Upper bound, inclusive.
    pub high: u32,
}

impl Default for Interval {
    fn default() -> Self {
        Self::FULL
    }
}

impl Interval {
    /// The whole register range.
    pub const FULL: Self = Self {
        low: 0,
        high: u32::MAX,
    };

    /// `high - low + 1`.
    #[inline]
    pub fn range_size(&self) -> u64 {
        u64::from(self.high - self.low) + 1
    }

    /// Sub-interval a symbol occupies, as `(start, width)`.
    #[inline]
    fn span(&self, count: u32, cumulative: u32, total: u32) -> (u64, u64) {
        let range = self.range_size();
        let total = u64::from(total);
        let start = u64::from(self.low) + u64::from(cumulative) * range / total;
        let width = u64::from(count) * range / total;
        (start, width)
    }

    /// Narrow to the sub-interval of a symbol.
    ///
    /// # Errors
    /// `ResolutionExhausted` when the symbol's share of the current range
    /// truncates to nothing.
    #[inline]
    pub fn narrow(&mut self, count: u32, cumulative: u32, total: u32) -> Result<()> {
        let (start, width) = self.span(count, cumulative, total);
        if width == 0 {
            return Err(Error::exhausted());
        }
        self.low = start as u32;
        self.high = (start + width - 1) as u32;
        Ok(())
    }

    /// Shift out settled digits, forcing convergence when the range gets
    /// too narrow. Each settled digit is passed to `emit` in order.
    ///
    /// On return the top digits of `low` and `high` differ and the range
    /// is at least `threshold`, so `low < high`.
    #[inline]
    pub fn renormalize<F: FnMut(u32)>(&mut self, digit_bits: u32, threshold: u64, mut emit: F) {
        let shift = STATE_BITS - digit_bits;
        let fill = (1u32 << digit_bits) - 1;
        loop {
            let digit = self.low >> shift;
            if digit == self.high >> shift {
                emit(digit);
                self.low <<= digit_bits;
                self.high = (self.high << digit_bits) | fill;
            } else if self.range_size() < threshold {
                let high = self.low | ((1u32 << shift) - 1);
                trace!(low = self.low, high = self.high, clamped = high, "underflow clamp");
                self.high = high;
            } else {
                break;
            }
        }
    }

    /// Shortest prefix that pins down a value inside the interval.
    ///
    /// Returns `(prefix, len)`: every 32-bit value whose top `len` bits
    /// equal `prefix` lies in `[low, high]`, so whatever follows the prefix
    /// in the stream cannot move the decoder out of the interval.
    pub fn flush_prefix(&self) -> (u32, u32) {
        for len in 0..STATE_BITS {
            let unit = 1u64 << (STATE_BITS - len);
            let prefix = u64::from(self.low).div_ceil(unit);
            let last = (prefix + 1) * unit - 1;
            if last <= u64::from(self.high) {
                return (prefix as u32, len);
            }
        }
        (self.low, STATE_BITS)
    }
}

/// Encoder half of the engine.
///
/// Lifecycle: created per chunk, fed symbols with [`encode`](Self::encode),
/// then consumed by [`finish`](Self::finish). An error leaves the encoder
/// unusable; the chunk's output must be discarded.
#[derive(Debug)]
pub struct RangeEncoder {
    interval: Interval,
    digit_bits: u32,
    threshold: u64,
    out: BitWriter,
}

impl RangeEncoder {
    /// Create an encoder that appends to `out`.
    pub fn new(out: BitWriter, digit_bits: u32, threshold: u32) -> Self {
        Self {
            interval: Interval::FULL,
            digit_bits,
            threshold: u64::from(threshold),
            out,
        }
    }

    /// Encode one symbol of `table`.
    ///
    /// # Errors
    /// `ResolutionExhausted` if the symbol cannot be represented at the
    /// current precision.
    pub fn encode(&mut self, table: &FrequencyTable, symbol: usize) -> Result<()> {
        let (count, cumulative, total) = table.get(symbol);
        self.encode_raw(count, cumulative, total)
    }

    /// Encode a symbol given its frequency triple directly.
    pub fn encode_raw(&mut self, count: u32, cumulative: u32, total: u32) -> Result<()> {
        self.interval.narrow(count, cumulative, total)?;
        let digit_bits = self.digit_bits;
        let out = &mut self.out;
        self.interval
            .renormalize(digit_bits, self.threshold, |digit| out.write_bits(digit, digit_bits));
        Ok(())
    }

    /// Current interval.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Bits written so far, including anything `out` held on creation.
    pub fn bit_len(&self) -> u64 {
        self.out.bit_len()
    }

    /// Emit the flush prefix and return the output.
    pub fn finish(mut self) -> BitWriter {
        let (prefix, len) = self.interval.flush_prefix();
        self.out.write_bits(prefix, len);
        self.out
    }
}

/// Decoder half of the engine.
///
/// Mirrors [`RangeEncoder`]: the code register holds the next 32 bits of
/// the stream, aligned with `low` and `high`, and shifts whenever the
/// encoder emitted a digit.
#[derive(Debug)]
pub struct RangeDecoder<'a, 'r> {
    interval: Interval,
    code: u32,
    digit_bits: u32,
    threshold: u64,
    reader: &'r mut BitReader<'a>,
    start: u64,
    consumed: u64,
}

impl<'a, 'r> RangeDecoder<'a, 'r> {
    /// Start decoding at the reader's current position.
    pub fn new(reader: &'r mut BitReader<'a>, digit_bits: u32, threshold: u32) -> Self {
        let start = reader.position();
        let code = reader.read_bits(STATE_BITS);
        Self {
            interval: Interval::FULL,
            code,
            digit_bits,
            threshold: u64::from(threshold),
            reader,
            start,
            consumed: 0,
        }
    }

    /// Decode one symbol of `table`.
    ///
    /// # Errors
    /// `DesyncDetected` when the code value is not bracketed by the
    /// selected symbol's sub-interval, and `ResolutionExhausted` when the
    /// narrowing itself fails (both mean the stream does not match the
    /// model and parameters).
    pub fn decode(&mut self, table: &FrequencyTable) -> Result<usize> {
        let Interval { low, high } = self.interval;
        if self.code < low || self.code > high {
            return Err(Error::desync());
        }
        let range = self.interval.range_size();
        let total = u64::from(table.total());
        let offset = u64::from(self.code - low);
        // Largest cumulative value c with floor(c * range / total) <= offset.
        let target = ((offset + 1) * total - 1) / range;
        let symbol = table.symbol_for(target as u32);

        let (count, cumulative, total) = table.get(symbol);
        let (start, width) = self.interval.span(count, cumulative, total);
        let code = u64::from(self.code);
        if width == 0 || code < start || code >= start + width {
            return Err(Error::desync());
        }

        self.interval.narrow(count, cumulative, total)?;
        let Self {
            interval,
            code,
            digit_bits,
            threshold,
            reader,
            consumed,
            ..
        } = self;
        let bits = *digit_bits;
        interval.renormalize(bits, *threshold, |_| {
            *code = (*code << bits) | reader.read_bits(bits);
            *consumed += u64::from(bits);
        });
        Ok(symbol)
    }

    /// Current interval.
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Position the reader just past the encoder's flush prefix, where the
    /// next chunk begins.
    pub fn finish(self) {
        let (_, len) = self.interval.flush_prefix();
        self.reader
            .seek(self.start + self.consumed + u64::from(len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode_all(table: &FrequencyTable, symbols: &[usize], bits: u32, threshold: u32) -> Result<BitWriter> {
        let mut enc = RangeEncoder::new(BitWriter::new(), bits, threshold);
        for &s in symbols {
            enc.encode(table, s)?;
        }
        Ok(enc.finish())
    }

    fn decode_all(table: &FrequencyTable, out: &BitWriter, n: usize, bits: u32, threshold: u32) -> Result<Vec<usize>> {
        let mut reader = BitReader::new(out.as_bytes(), out.bit_len());
        let mut dec = RangeDecoder::new(&mut reader, bits, threshold);
        let mut symbols = Vec::with_capacity(n);
        for _ in 0..n {
            symbols.push(dec.decode(table)?);
        }
        dec.finish();
        assert_eq!(reader.position(), out.bit_len());
        Ok(symbols)
    }

    #[test]
    fn test_narrow_proportional() {
        let mut iv = Interval::FULL;
        iv.narrow(1, 1, 4).unwrap();
        assert_eq!(iv, Interval { low: 0x4000_0000, high: 0x7FFF_FFFF });
    }

    #[test]
    fn test_narrow_last_symbol_stays_inside() {
        let mut iv = Interval { low: 10, high: 20 };
        iv.narrow(2, 1, 3).unwrap();
        assert!(iv.low >= 10 && iv.high <= 20 && iv.low <= iv.high);
    }

    #[test]
    fn test_narrow_exhausted() {
        let mut iv = Interval { low: 100, high: 101 };
        assert_eq!(iv.narrow(1, 0, 10), Err(Error::exhausted()));
    }

    #[test]
    fn test_renormalize_emits_settled_digits() {
        let mut iv = Interval { low: 0x1234_0000, high: 0x1234_FFFF };
        let mut digits = Vec::new();
        iv.renormalize(8, 1 << 16, |d| digits.push(d));
        assert_eq!(digits, vec![0x12, 0x34]);
        assert_eq!(iv, Interval { low: 0x0000_0000, high: 0xFFFF_FFFF });
    }

    #[test]
    fn test_renormalize_clamps_straddling_interval() {
        let mut iv = Interval { low: 0x12FF_FFF0, high: 0x1300_0010 };
        let mut digits = Vec::new();
        iv.renormalize(8, 1 << 16, |d| digits.push(d));
        // high pulled down to 0x12FF_FFFF, then 0x12, 0xFF, 0xFF settle.
        assert_eq!(digits, vec![0x12, 0xFF, 0xFF]);
        assert_eq!(iv.low, 0xF000_0000);
        assert_eq!(iv.high, 0xFFFF_FFFF);
    }

    #[test]
    fn test_renormalize_leaves_wide_straddle() {
        let mut iv = Interval { low: 0x12FF_0000, high: 0x1301_0000 };
        let mut digits = Vec::new();
        iv.renormalize(8, 1 << 16, |d| digits.push(d));
        assert!(digits.is_empty());
    }

    #[test]
    fn test_flush_prefix_full_interval_is_empty() {
        assert_eq!(Interval::FULL.flush_prefix(), (0, 0));
    }

    #[test]
    fn test_flush_prefix_minimal() {
        let iv = Interval { low: 0x4000_0001, high: 0xFFFF_FFFF };
        // [0x8000_0000, 0xFFFF_FFFF] is the first aligned block inside.
        assert_eq!(iv.flush_prefix(), (1, 1));

        let iv = Interval { low: 0x1234_5678, high: 0x1234_5678 };
        assert_eq!(iv.flush_prefix(), (0x1234_5678, 32));
    }

    #[test]
    fn test_roundtrip_bytes() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let symbols: Vec<usize> = data.iter().map(|&b| b as usize).collect();
        let table = FrequencyTable::build(data, 256);
        let out = encode_all(&table, &symbols, 8, 1 << 16).unwrap();
        assert_eq!(decode_all(&table, &out, symbols.len(), 8, 1 << 16).unwrap(), symbols);
    }

    #[test]
    fn test_roundtrip_single_bit_digits() {
        let data: Vec<u8> = (0..500u32).map(|i| (i * i % 7 == 0) as u8).collect();
        let symbols: Vec<usize> = data.iter().map(|&b| b as usize).collect();
        let table = FrequencyTable::build(&data, 2);
        let out = encode_all(&table, &symbols, 1, 1 << 16).unwrap();
        assert_eq!(decode_all(&table, &out, symbols.len(), 1, 1 << 16).unwrap(), symbols);
    }

    #[test]
    fn test_single_symbol_model_emits_nothing() {
        let table = FrequencyTable::build(&[9; 50], 256);
        let out = encode_all(&table, &[9; 50], 8, 1 << 16).unwrap();
        assert_eq!(out.bit_len(), 0);
        assert_eq!(decode_all(&table, &out, 50, 8, 1 << 16).unwrap(), vec![9; 50]);
    }

    #[test]
    fn test_encoder_and_decoder_intervals_in_lockstep() {
        let data: Vec<u8> = (0..2_000u32).map(|i| ((i * 7 + i / 13) % 11) as u8).collect();
        let table = FrequencyTable::build(&data, 16);

        let mut enc = RangeEncoder::new(BitWriter::new(), 4, 1 << 12);
        let mut intervals = Vec::with_capacity(data.len());
        let mut emitted = enc.bit_len();
        for &s in &data {
            enc.encode(&table, s as usize).unwrap();
            assert!(enc.bit_len() >= emitted);
            assert_eq!(enc.bit_len() % 4, 0);
            emitted = enc.bit_len();
            intervals.push(enc.interval());
        }
        let out = enc.finish();
        assert!(out.bit_len() >= emitted);

        let mut reader = BitReader::new(out.as_bytes(), out.bit_len());
        let mut dec = RangeDecoder::new(&mut reader, 4, 1 << 12);
        assert_eq!(dec.interval(), Interval::FULL);
        for (&s, expected) in data.iter().zip(&intervals) {
            assert_eq!(dec.decode(&table).unwrap(), s as usize);
            assert_eq!(dec.interval(), *expected);
        }
    }

    #[test]
    fn test_decoder_tolerates_trailing_bits() {
        let data = b"abracadabra";
        let symbols: Vec<usize> = data.iter().map(|&b| b as usize).collect();
        let table = FrequencyTable::build(data, 256);
        let mut out = encode_all(&table, &symbols, 8, 1 << 16).unwrap();
        let coded_len = out.bit_len();
        out.write_bits(0xDEAD_BEEF, 32);

        let mut reader = BitReader::new(out.as_bytes(), out.bit_len());
        let mut dec = RangeDecoder::new(&mut reader, 8, 1 << 16);
        for &s in &symbols {
            assert_eq!(dec.decode(&table).unwrap(), s);
        }
        dec.finish();
        assert_eq!(reader.position(), coded_len);
        assert_eq!(reader.read_bits(32), 0xDEAD_BEEF);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_engine_roundtrip(
            data in prop::collection::vec(0u8..16, 1..400),
            bits in prop::sample::select(vec![1u32, 2, 4, 8]),
        ) {
            let table = FrequencyTable::build(&data, 16);
            let symbols: Vec<usize> = data.iter().map(|&b| b as usize).collect();
            let out = encode_all(&table, &symbols, bits, 1 << 16).unwrap();
            let decoded = decode_all(&table, &out, symbols.len(), bits, 1 << 16).unwrap();
            prop_assert_eq!(decoded, symbols);
        }
    }
}
