//! Simulation harness driving all engines in lockstep.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::invariants::InvariantChecker;
use super::op_gen::{OpGenConfig, Operation, OperationGenerator, SimRecord};
use super::Violation;
use crate::index::{AvlTree, BTree, BinarySearchTree, OrderedIndex};

/// Configuration for the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Operation generation configuration.
    pub op_config: OpGenConfig,
    /// Stop the run once this many violations have been recorded.
    pub max_violations: usize,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            op_config: OpGenConfig::default(),
            max_violations: 16,
        }
    }

    #[must_use]
    pub const fn with_op_config(mut self, config: OpGenConfig) -> Self {
        self.op_config = config;
        self
    }

    /// Draw keys from `0..size`. Smaller pools mean more collisions.
    #[must_use]
    pub const fn with_key_pool_size(mut self, size: u32) -> Self {
        self.op_config.key_pool_size = size;
        self
    }

    #[must_use]
    pub const fn with_max_violations(mut self, max: usize) -> Self {
        self.max_violations = max;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations applied.
    pub operations_processed: usize,
    /// Inserts of a fresh key.
    pub inserts: usize,
    /// Inserts rejected as duplicates.
    pub duplicate_inserts: usize,
    /// Removes of a present key.
    pub removes: usize,
    /// Removes of an absent key.
    pub absent_removes: usize,
    /// Searches that found a record.
    pub search_hits: usize,
    /// Keys held by the reference model at the end of the run.
    pub final_keys: Vec<u32>,
    /// Violations detected, across all engines.
    pub violations: Vec<Violation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Applies one operation stream to every engine and to a reference model.
pub struct Simulator {
    config: SimulatorConfig,
    generator: OperationGenerator,
    engines: Vec<(&'static str, Box<dyn OrderedIndex<SimRecord>>)>,
    model: BTreeMap<u32, SimRecord>,
    checker: InvariantChecker,
}

impl Simulator {
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let engines: Vec<(&'static str, Box<dyn OrderedIndex<SimRecord>>)> = vec![
            ("bst", Box::new(BinarySearchTree::new())),
            ("avl", Box::new(AvlTree::new())),
            ("btree", Box::new(BTree::new())),
        ];

        Self {
            config,
            generator: OperationGenerator::with_config(config.seed, config.op_config),
            engines,
            model: BTreeMap::new(),
            checker: InvariantChecker::new(),
        }
    }

    /// Apply `operation_count` further operations and report the outcome.
    pub fn run(&mut self, operation_count: usize) -> SimulationResult {
        let mut result = SimulationResult {
            seed: self.config.seed,
            operations_processed: 0,
            inserts: 0,
            duplicate_inserts: 0,
            removes: 0,
            absent_removes: 0,
            search_hits: 0,
            final_keys: Vec::new(),
            violations: Vec::new(),
        };

        for operation_index in 0..operation_count {
            let operation = self.generator.next_operation();
            self.apply(operation, operation_index, &mut result);
            result.operations_processed += 1;

            for &(name, ref engine) in &self.engines {
                self.checker
                    .check_engine(name, &**engine, &self.model, operation_index);
            }

            if self.checker.violations().len() >= self.config.max_violations {
                warn!(
                    "seed {}: stopping after {} violations",
                    self.config.seed,
                    self.checker.violations().len()
                );
                break;
            }
        }

        result.final_keys = self.model.keys().copied().collect();
        result.violations = self.checker.violations().to_vec();
        debug!(
            "seed {}: {} operations, {} keys left, {} violations",
            result.seed,
            result.operations_processed,
            result.final_keys.len(),
            result.violations.len()
        );
        result
    }

    fn apply(&mut self, operation: Operation, operation_index: usize, result: &mut SimulationResult) {
        match operation {
            Operation::Insert(record) => {
                let fresh = !self.model.contains_key(&record.key);
                if fresh {
                    self.model.insert(record.key, record);
                    result.inserts += 1;
                } else {
                    result.duplicate_inserts += 1;
                }
                for (name, engine) in &mut self.engines {
                    let name = *name;
                    let inserted = engine.insert(record);
                    self.checker
                        .check_answer(name, operation_index, "insert", &inserted, &fresh);
                }
            }
            Operation::Remove(key) => {
                let expected = self.model.remove(&key);
                if expected.is_some() {
                    result.removes += 1;
                } else {
                    result.absent_removes += 1;
                }
                for (name, engine) in &mut self.engines {
                    let name = *name;
                    let removed = engine.remove(&key);
                    self.checker
                        .check_answer(name, operation_index, "remove", &removed, &expected);
                }
            }
            Operation::Search(key) => {
                let expected = self.model.get(&key);
                if expected.is_some() {
                    result.search_hits += 1;
                }
                for &(name, ref engine) in &self.engines {
                    let found = engine.search(&key);
                    self.checker
                        .check_answer(name, operation_index, "search", &found, &expected);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InvariantViolation;

    /// Accepts every insert and stores nothing.
    struct Forgetful;

    impl OrderedIndex<SimRecord> for Forgetful {
        fn insert(&mut self, _record: SimRecord) -> bool {
            true
        }

        fn search(&self, _key: &u32) -> Option<&SimRecord> {
            None
        }

        fn remove(&mut self, _key: &u32) -> Option<SimRecord> {
            None
        }

        fn to_ordered_sequence(&self) -> Vec<&SimRecord> {
            Vec::new()
        }

        fn len(&self) -> usize {
            0
        }

        fn check_invariants(&self) -> Result<(), InvariantViolation> {
            Ok(())
        }
    }

    #[test]
    fn test_simulator_basic() {
        let mut simulator = Simulator::new(SimulatorConfig::new(12345));
        let result = simulator.run(500);

        assert!(result.passed(), "{:?}", result.violations);
        assert_eq!(result.operations_processed, 500);
        assert!(result.inserts > 0);
        assert!(result.removes > 0);
    }

    #[test]
    fn test_simulator_several_seeds() {
        for seed in [1, 2, 3, 42, 2024, 99_999] {
            let config = SimulatorConfig::new(seed).with_key_pool_size(48);
            let result = Simulator::new(config).run(2000);
            assert!(result.passed(), "seed {seed}: {:?}", result.violations);
            assert!(result.duplicate_inserts > 0, "seed {seed}");
            assert!(result.absent_removes > 0, "seed {seed}");
        }
    }

    #[test]
    fn test_simulator_deterministic() {
        let first = Simulator::new(SimulatorConfig::new(777)).run(1000);
        let second = Simulator::new(SimulatorConfig::new(777)).run(1000);
        assert_eq!(first, second);

        let other = Simulator::new(SimulatorConfig::new(778)).run(1000);
        assert_ne!(first.final_keys, other.final_keys);
    }

    #[test]
    fn test_insert_heavy_run_grows_deep_trees() {
        let config = SimulatorConfig::new(31337).with_op_config(OpGenConfig {
            key_pool_size: 4096,
            insert_rate: 0.8,
            remove_rate: 0.15,
        });
        let result = Simulator::new(config).run(3000);
        assert!(result.passed(), "{:?}", result.violations);
        assert!(result.final_keys.len() > 1000);
    }

    #[test]
    fn test_drain_run_empties_engines() {
        let fill = OpGenConfig {
            key_pool_size: 200,
            insert_rate: 1.0,
            remove_rate: 0.0,
        };
        let drain = OpGenConfig {
            key_pool_size: 200,
            insert_rate: 0.0,
            remove_rate: 1.0,
        };

        let filled = Simulator::new(SimulatorConfig::new(5).with_op_config(fill)).run(2000);
        assert!(filled.passed(), "{:?}", filled.violations);

        let mut simulator = Simulator::new(SimulatorConfig::new(5).with_op_config(fill));
        simulator.run(2000);
        simulator.generator = OperationGenerator::with_config(6, drain);
        let drained = simulator.run(4000);
        assert!(drained.passed(), "{:?}", drained.violations);
        assert!(drained.final_keys.is_empty());
        for (_, engine) in &simulator.engines {
            assert!(engine.is_empty());
        }
    }

    #[test]
    fn test_run_stops_at_max_violations() {
        let inserts_only = OpGenConfig {
            key_pool_size: 64,
            insert_rate: 1.0,
            remove_rate: 0.0,
        };
        let config = SimulatorConfig::new(9)
            .with_op_config(inserts_only)
            .with_max_violations(2);
        let mut simulator = Simulator::new(config);
        simulator.engines.push(("forgetful", Box::new(Forgetful)));

        // The first insert is fresh, so the answer agrees but length and
        // contents do not: two violations, which is the limit.
        let result = simulator.run(100);
        assert!(!result.passed());
        assert_eq!(result.operations_processed, 1);
        assert_eq!(result.violations.len(), 2);
        assert!(result.violations.iter().all(|v| v.engine == "forgetful"));
        assert!(result.violations.iter().all(|v| v.operation_index == 0));
    }

    #[test]
    #[ignore] // Long running test
    fn test_simulator_stress() {
        for seed in 0..20 {
            let config = SimulatorConfig::new(seed).with_key_pool_size(1024);
            let result = Simulator::new(config).run(20_000);
            assert!(result.passed(), "seed {seed}: {:?}", result.violations);
        }
    }
}
