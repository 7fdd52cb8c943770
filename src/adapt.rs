//! Locality-biased probability adaptation.
//!
//! Pixel intensities cluster: a value is usually close to the one before
//! it. Every `adaptation_interval` symbols the adapter takes a fixed
//! share of probability mass from symbols far from the last value and
//! hands it to the values within `locality_radius` of it. This acts as a
//! cheap order-1 predictor without per-context tables.
//!
//! The adjustment is a pure function of the table and the last symbol,
//! so encoder and decoder stay in lockstep.

use serde::{Deserialize, Serialize};

use crate::model::FrequencyTable;

/// Default half-width of the boosted neighbourhood.
pub const DEFAULT_LOCALITY_RADIUS: u32 = 8;
/// Default share of the chunk size moved per adaptation, in percent.
pub const DEFAULT_REDUCTION_PERCENT: u32 = 10;
/// Default number of symbols between adaptations.
pub const DEFAULT_ADAPTATION_INTERVAL: usize = 128;
/// Default minimum range width before forced renormalization.
pub const DEFAULT_ADJUSTMENT_THRESHOLD: u32 = 1 << 16;

/// Tuning for renormalization and model adaptation.
///
/// Encoder and decoder must agree on every field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationParams {
    /// Minimum tolerable range width before the coder forces the leading
    /// digits of `low` and `high` to agree.
    pub adjustment_threshold: u32,
    /// Symbols within this distance of the last symbol are boosted.
    pub locality_radius: u32,
    /// How much of the chunk size is taken from distant symbols per step.
    pub reduction_percent: u32,
    /// Symbols coded between adaptations.
    pub adaptation_interval: usize,
}

impl Default for AdaptationParams {
    fn default() -> Self {
        Self {
            adjustment_threshold: DEFAULT_ADJUSTMENT_THRESHOLD,
            locality_radius: DEFAULT_LOCALITY_RADIUS,
            reduction_percent: DEFAULT_REDUCTION_PERCENT,
            adaptation_interval: DEFAULT_ADAPTATION_INTERVAL,
        }
    }
}

impl AdaptationParams {
    /// Whether the model is re-adapted after the symbol at chunk index `index`.
    #[inline]
    pub fn adapts_after(&self, index: usize) -> bool {
        index % self.adaptation_interval == 0
    }

    /// Reshape `table` around `last_symbol`, using the table total as size.
    pub fn adjust(&self, table: &mut FrequencyTable, last_symbol: usize) {
        let size = table.total();
        adjust_probabilities(
            table,
            size,
            last_symbol,
            self.locality_radius,
            self.reduction_percent,
        );
    }
}

/// Move probability mass toward the neighbourhood of `last_symbol`.
///
/// Every symbol farther than `locality_radius` from `last_symbol` loses
/// `size * reduction_percent / 100`, split evenly among the distant
/// symbols, but never drops below `max(size / 10000, 1)`. Symbols already
/// at or below that floor are untouched, so absent symbols stay absent
/// and present ones stay encodable. The total removed is spread evenly
/// over the neighbourhood (clamped to the alphabet), with the remainder
/// going to `last_symbol`. The table total is unchanged.
pub fn adjust_probabilities(
    table: &mut FrequencyTable,
    size: u32,
    last_symbol: usize,
    locality_radius: u32,
    reduction_percent: u32,
) {
    let alphabet = table.alphabet_size();
    let radius = locality_radius as usize;
    let first = last_symbol.saturating_sub(radius);
    let last = last_symbol.saturating_add(radius).min(alphabet - 1);
    let neighbours = last - first + 1;
    let distant = alphabet - neighbours;
    if distant == 0 {
        return;
    }

    let size = u64::from(size);
    let step = size * u64::from(reduction_percent) / 100 / distant as u64;
    let floor = (size / 10_000).max(1);
    if step == 0 {
        return;
    }

    let counts = table.counts_mut();
    let mut reduction = 0u64;
    for s in (0..first).chain(last + 1..alphabet) {
        let count = u64::from(counts[s]);
        if count <= floor {
            continue;
        }
        let reduced = count.saturating_sub(step).max(floor);
        reduction += count - reduced;
        counts[s] = reduced as u32;
    }
    if reduction == 0 {
        return;
    }

    let share = (reduction / neighbours as u64) as u32;
    let extra = (reduction % neighbours as u64) as u32;
    for count in &mut counts[first..=last] {
        *count += share;
    }
    counts[last_symbol] += extra;

    table.recompute_cumulative();
}
