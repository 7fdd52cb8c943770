//! MSB-first bit packing with exact bit counts.
//!
//! The coded stream is not byte aligned: its length is carried as a bit
//! count, and the final byte is zero-padded. Readers treat every bit at
//! or past the bit count as zero.

/// Appends bits most-significant first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl BitWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits written.
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Bytes written so far; the last one may be partially filled.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append one bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        let offset = (self.bit_len % 8) as u32;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.bit_len += 1;
    }

    /// Append the low `n` bits of `value`, most-significant first.
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32);
        if n == 8 && self.bit_len % 8 == 0 {
            self.bytes.push(value as u8);
            self.bit_len += 8;
            return;
        }
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1 == 1);
        }
    }

    /// Append an Elias-gamma code for `value` (which must be nonzero).
    pub fn write_gamma(&mut self, value: u32) {
        debug_assert!(value > 0);
        let width = 32 - value.leading_zeros();
        for _ in 1..width {
            self.write_bit(false);
        }
        self.write_bits(value, width);
    }

    /// Append every bit of `other`.
    pub fn append(&mut self, other: &BitWriter) {
        if self.bit_len % 8 == 0 {
            self.bytes.extend_from_slice(&other.bytes);
            self.bit_len += other.bit_len;
            return;
        }
        let mut reader = BitReader::new(&other.bytes, other.bit_len);
        for _ in 0..other.bit_len {
            self.write_bit(reader.read_bit());
        }
    }

    /// Consume the writer, returning the bytes and the exact bit count.
    pub fn into_parts(self) -> (Vec<u8>, u64) {
        (self.bytes, self.bit_len)
    }
}

/// Reads bits most-significant first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_len: u64,
    pos: u64,
}

impl<'a> BitReader<'a> {
    /// Read the first `bit_len` bits of `data`.
    ///
    /// `bit_len` is clamped to the bits actually present.
    pub fn new(data: &'a [u8], bit_len: u64) -> Self {
        Self {
            data,
            bit_len: bit_len.min(data.len() as u64 * 8),
            pos: 0,
        }
    }

    /// Position of the next bit to read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Move to an absolute bit position.
    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// Bits left before the end of the stream.
    pub fn remaining(&self) -> u64 {
        self.bit_len.saturating_sub(self.pos)
    }

    /// Read one bit; zero past the end.
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        let pos = self.pos;
        self.pos += 1;
        if pos >= self.bit_len {
            return false;
        }
        let byte = self.data[(pos / 8) as usize];
        (byte >> (7 - pos % 8)) & 1 == 1
    }

    /// Read `n` bits as an unsigned value, most-significant first.
    pub fn read_bits(&mut self, n: u32) -> u32 {
        debug_assert!(n <= 32);
        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | u64::from(self.read_bit());
        }
        value as u32
    }

    /// Read an Elias-gamma code.
    ///
    /// Returns `None` when the prefix is longer than a `u32` allows or runs
    /// past the end of the stream.
    pub fn read_gamma(&mut self) -> Option<u32> {
        let mut zeros = 0u32;
        while !self.read_bit() {
            zeros += 1;
            if zeros > 31 || self.pos > self.bit_len {
                return None;
            }
        }
        let tail = self.read_bits(zeros);
        Some((1u32 << zeros) | tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msb_first_packing() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(0b1, 1);
        w.write_bits(0xF, 4);
        w.write_bits(0b11, 2);
        let (bytes, bits) = w.into_parts();
        assert_eq!(bits, 10);
        assert_eq!(bytes, vec![0b1011_1111, 0b1100_0000]);
    }

    #[test]
    fn test_aligned_byte_fast_path() {
        let mut w = BitWriter::new();
        w.write_bits(0xAB, 8);
        w.write_bits(0x1, 4);
        w.write_bits(0xCD, 8);
        assert_eq!(w.as_bytes(), &[0xAB, 0x1C, 0xD0]);
        assert_eq!(w.bit_len(), 20);
    }

    #[test]
    fn test_reader_zero_past_bit_len() {
        // Padding bits are set but must read as zero.
        let data = [0xFF, 0xFF];
        let mut r = BitReader::new(&data, 12);
        assert_eq!(r.read_bits(12), 0xFFF);
        assert_eq!(r.remaining(), 0);
        assert_eq!(r.read_bits(8), 0);
    }

    #[test]
    fn test_gamma_codes() {
        let mut w = BitWriter::new();
        for v in [1u32, 2, 3, 4, 17, 64_801, u32::MAX] {
            w.write_gamma(v);
        }
        let (bytes, bits) = w.into_parts();
        let mut r = BitReader::new(&bytes, bits);
        for v in [1u32, 2, 3, 4, 17, 64_801, u32::MAX] {
            assert_eq!(r.read_gamma(), Some(v));
        }
        assert_eq!(r.position(), bits);
    }

    #[test]
    fn test_gamma_one_is_one_bit() {
        let mut w = BitWriter::new();
        w.write_gamma(1);
        assert_eq!(w.bit_len(), 1);
        w.write_gamma(5);
        assert_eq!(w.bit_len(), 6);
    }

    #[test]
    fn test_gamma_rejects_endless_prefix() {
        let data = [0u8; 2];
        let mut r = BitReader::new(&data, 16);
        assert_eq!(r.read_gamma(), None);
    }

    #[test]
    fn test_append_unaligned() {
        let mut a = BitWriter::new();
        a.write_bits(0b101, 3);
        let mut b = BitWriter::new();
        b.write_bits(0b1100_1010_1, 9);
        a.append(&b);
        assert_eq!(a.bit_len(), 12);
        let mut r = BitReader::new(a.as_bytes(), a.bit_len());
        assert_eq!(r.read_bits(3), 0b101);
        assert_eq!(r.read_bits(9), 0b1100_1010_1);
    }

    #[test]
    fn test_seek() {
        let data = [0b0101_0000];
        let mut r = BitReader::new(&data, 8);
        r.seek(3);
        assert!(r.read_bit());
        assert_eq!(r.position(), 4);
    }
}
