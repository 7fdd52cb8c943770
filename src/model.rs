//! Value-indexed symbol frequency model.
//!
//! Counts are stored in symbol-value order and never re-sorted, so the
//! encoder reaches a symbol's `(count, cumulative_before)` pair by index.
//! The decoder's inverse lookup is a binary search over the cumulative
//! sums.

/// Occurrence counts and cumulative counts over an alphabet.
///
/// Invariant: `cumulative[s + 1] == cumulative[s] + counts[s]` and
/// `total == cumulative[last] + counts[last]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u32>,
    cumulative: Vec<u32>,
    total: u32,
}

impl FrequencyTable {
    /// Count every symbol of a chunk in one pass.
    ///
    /// Symbols must be below `alphabet_size`.
    pub fn build(symbols: &[u8], alphabet_size: usize) -> Self {
        let mut counts = vec![0u32; alphabet_size];
        for &s in symbols {
            counts[s as usize] += 1;
        }
        Self::from_counts(counts)
    }

    /// Wrap explicit counts and compute cumulative sums.
    pub fn from_counts(counts: Vec<u32>) -> Self {
        let mut table = Self {
            cumulative: vec![0; counts.len()],
            counts,
            total: 0,
        };
        table.recompute_cumulative();
        table
    }

    /// Rebuild `cumulative` and `total` after counts changed.
    pub fn recompute_cumulative(&mut self) {
        let mut running = 0u32;
        for (cum, &count) in self.cumulative.iter_mut().zip(&self.counts) {
            *cum = running;
            running += count;
        }
        self.total = running;
    }

    /// Number of symbol values.
    pub fn alphabet_size(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// A table with no counts cannot code anything.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Count of one symbol.
    pub fn count(&self, symbol: usize) -> u32 {
        self.counts[symbol]
    }

    /// Sum of counts of all strictly smaller symbols.
    pub fn cumulative_before(&self, symbol: usize) -> u32 {
        self.cumulative[symbol]
    }

    /// `(count, cumulative_before, total)` for a symbol.
    #[inline]
    pub fn get(&self, symbol: usize) -> (u32, u32, u32) {
        (self.counts[symbol], self.cumulative[symbol], self.total)
    }

    /// All counts in symbol order.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub(crate) fn counts_mut(&mut self) -> &mut [u32] {
        &mut self.counts
    }

    /// Largest symbol whose `cumulative_before` is at most `target`.
    ///
    /// For `target < total` this is the unique symbol with a nonzero count
    /// whose `[cumulative_before, cumulative_before + count)` contains it.
    pub fn symbol_for(&self, target: u32) -> usize {
        self.cumulative
            .partition_point(|&c| c <= target)
            .saturating_sub(1)
    }

    /// Shannon entropy of the distribution in bits per symbol.
    ///
    /// Returns 0.0 for an empty table.
    pub fn entropy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let total = self.total as f64;
        self.counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}
