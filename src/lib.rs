//! # Adaptive Range Coding
//!
//! *Entropy coding of raw sensor intensities with a locality-biased model.*
//!
//! ## Intuition First
//!
//! Picture the number line between 0 and 1. Give each possible pixel value a
//! slice of it, sized by how often that value shows up. To encode a value,
//! zoom into its slice; to encode the next one, zoom again inside that slice.
//! After the whole image, any single point inside the final tiny slice
//! identifies the entire sequence, and frequent values cost little zoom.
//!
//! Range coding does this with integers. A 32-bit window `[low, high]`
//! stands in for the slice, and leading digits are shifted out as soon as
//! they can no longer change.
//!
//! ## The Problem
//!
//! Finite precision is the hard part:
//! - **Carries**: A digit emitted too early could be invalidated later.
//!   We only emit digits on which `low` and `high` already agree.
//! - **Underflow**: The window can shrink around a digit boundary without
//!   ever agreeing on a digit. Below `adjustment_threshold` we force
//!   agreement by clamping `high`.
//! - **Starvation**: A symbol whose count rounds to zero width cannot be
//!   encoded. This is detected and reported as `ResolutionExhausted`,
//!   never emitted as a corrupt stream.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon     Entropy as the fundamental limit
//! 1976  Rissanen    Arithmetic coding: optimal rate with infinite precision
//! 1979  Martin      Range encoding: the same idea over byte-sized digits
//! 1979  Pasco       Finite-precision arithmetic coding with renormalization
//! 1987  Witten      Witten-Neal-Cleary: the reference integer implementation
//! 1998  Subbotin    Carryless range coder with range clamping
//! ```
//!
//! ## Mathematical Formulation
//!
//! For a symbol $s$ with count $c_s$, cumulative count $C_s$ and total $T$,
//! and the current window size $R = high - low + 1$:
//!
//! ```text
//! low'  = low + floor(C_s * R / T)
//! high' = low' + floor(c_s * R / T) - 1
//! ```
//!
//! A symbol of probability $p_s$ costs about $-\log_2 p_s$ bits.
//!
//! ## Adaptation
//!
//! Neighbouring pixels have similar intensities. Every
//! `adaptation_interval` symbols the model moves a share of probability
//! mass from values far from the last symbol to values within
//! `locality_radius` of it. This works like a crude order-1 model with no
//! per-context state. The adjustment depends only on already-coded
//! symbols, so the decoder repeats it exactly.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(1)$ per encoded symbol, $O(\log A)$ per decoded symbol,
//!   plus $O(A)$ per adaptation for alphabet size $A$.
//! - **Space**: $O(A)$ per chunk.
//!
//! ## Failure Modes
//!
//! 1. **Precision**: `adjustment_threshold` below the chunk's symbol count
//!    lets rare symbols round to zero width. Raise the threshold or shrink
//!    the alphabet.
//! 2. **Parameter drift**: The stream has no header. Decoding with a
//!    different width, threshold or adaptation setting yields
//!    `DesyncDetected`, `CorruptModel`, or wrong bytes.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - **[`FrequencyTable`]**: value-indexed counts and cumulative counts.
//! - **[`adjust_probabilities`]**: the locality-biased adapter.
//! - **[`RangeEncoder`] / [`RangeDecoder`]**: the 32-bit engine.
//! - **[`Codec`]**, **[`encode`]**, **[`decode`]**: chunked streams with
//!   in-band model headers.
//!
//! ## References
//!
//! - Martin, G. N. N. (1979). "Range encoding: an algorithm for removing redundancy from a digitised message."
//! - Witten, I. H., Neal, R. M., & Cleary, J. G. (1987). "Arithmetic coding for data compression."
//! - Moffat, A., Neal, R. M., & Witten, I. H. (1998). "Arithmetic coding revisited."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapt;
pub mod bits;
pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod range;
pub mod symbol;

pub use adapt::{adjust_probabilities, AdaptationParams};
pub use codec::{decode, encode, Codec, Encoded};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use model::FrequencyTable;
pub use range::{Interval, RangeDecoder, RangeEncoder};
pub use symbol::SymbolWidth;
