//! Seeded operation generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::index::Record;

/// Payload stored by the engines during simulation.
///
/// `stamp` is the index of the operation that inserted the record, so a
/// record that was silently overwritten is told apart from the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimRecord {
    pub key: u32,
    pub stamp: u64,
}

impl Record for SimRecord {
    type Key = u32;

    fn key(&self) -> &u32 {
        &self.key
    }
}

/// One step of a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert(SimRecord),
    Remove(u32),
    Search(u32),
}

/// Configuration for operation generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpGenConfig {
    /// Keys are drawn from `0..key_pool_size`.
    pub key_pool_size: u32,
    /// Probability of an insert.
    pub insert_rate: f64,
    /// Probability of a remove. Whatever is left over is a search.
    pub remove_rate: f64,
}

impl Default for OpGenConfig {
    fn default() -> Self {
        Self {
            key_pool_size: 128,
            insert_rate: 0.5,
            remove_rate: 0.35,
        }
    }
}

/// Generator for reproducible operation sequences.
pub struct OperationGenerator {
    rng: StdRng,
    config: OpGenConfig,
    generated: u64,
}

impl OperationGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, OpGenConfig::default())
    }

    #[must_use]
    pub fn with_config(seed: u64, config: OpGenConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            generated: 0,
        }
    }

    /// Produce the next operation.
    pub fn next_operation(&mut self) -> Operation {
        let key = self.rng.random_range(0..self.config.key_pool_size.max(1));
        let roll: f64 = self.rng.random();
        let stamp = self.generated;
        self.generated += 1;

        if roll < self.config.insert_rate {
            Operation::Insert(SimRecord { key, stamp })
        } else if roll < self.config.insert_rate + self.config.remove_rate {
            Operation::Remove(key)
        } else {
            Operation::Search(key)
        }
    }

    /// Number of operations produced so far.
    #[must_use]
    pub const fn generated(&self) -> u64 {
        self.generated
    }
}

impl Iterator for OperationGenerator {
    type Item = Operation;

    fn next(&mut self) -> Option<Operation> {
        Some(self.next_operation())
    }
}
