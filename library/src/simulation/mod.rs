//! Deterministic simulation of the tree engines.
//!
//! A seeded generator produces insert/remove/search operations over a small
//! key pool so that keys collide often. Every operation is applied to all
//! three engines and to a `BTreeMap` reference model, then each engine is
//! checked against the model and against its own structural invariants.
//!
//! Given the same seed and operation count, a run is identical.
//!
//! # Usage
//!
//! ```
//! use library::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_key_pool_size(32);
//! let mut simulator = Simulator::new(config);
//! let result = simulator.run(500);
//!
//! assert!(result.passed(), "{:?}", result.violations);
//! ```

mod invariants;
mod op_gen;
mod simulator;

pub use invariants::{InvariantChecker, Violation};
pub use op_gen::{OpGenConfig, Operation, OperationGenerator, SimRecord};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
