//! Discrete weighted choice.
//!
//! Weights are relative selection frequencies, not strict ratios: each draw
//! is independent. Zero-weight entries are kept for introspection but never
//! drawn.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// A list of `(item, weight)` pairs sampled with weighted random choice.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> WeightedTable<T> {
    /// Build a table. Fails if there is no entry with a positive weight.
    pub fn new(entries: Vec<(T, u32)>) -> Result<Self, WeightedError> {
        if entries.is_empty() {
            return Err(WeightedError::Empty);
        }
        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight))
            .map_err(|_| WeightedError::AllZero)?;
        Ok(Self { entries, index })
    }

    /// Draw one item.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.entries[self.index.sample(rng)].0
    }

    pub fn entries(&self) -> &[(T, u32)] {
        &self.entries
    }

    pub fn total_weight(&self) -> u64 {
        self.entries.iter().map(|(_, weight)| *weight as u64).sum()
    }
}

impl<T: Copy + PartialEq> WeightedTable<T> {
    /// Weight of `item`, or 0 if it is not in the table.
    pub fn weight_of(&self, item: T) -> u32 {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == item)
            .map(|(_, weight)| *weight)
            .unwrap_or(0)
    }
}

/// Errors building a weighted table.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WeightedError {
    #[error("Weighted table has no entries")]
    Empty,
    #[error("Weighted table has no entry with a positive weight")]
    AllZero,
}
