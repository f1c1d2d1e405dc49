// Tests may panic on broken expectations; production code propagates errors.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Layout:
//  - index: three tree engines behind one ordered-index contract
//  - types / validation: the records the engines hold, and their checks
//  - library: the service tying catalog, directory and ledger together
//  - console / config: the interactive front end and its settings
//  - simulation: seeded differential testing of the engines

pub mod config;
pub mod console;
pub mod index;
pub mod library;
pub mod simulation;
pub mod types;
pub mod validation;

pub use config::{AppConfig, ConfigError};
pub use console::Console;
pub use index::{AvlTree, BTree, BinarySearchTree, InvariantViolation, OrderedIndex, Record};
pub use library::{Library, LibraryError};
pub use types::{Book, BookCatalog, Loan, LoanDate, LoanLedger, User, UserDirectory};
pub use validation::ValidationError;
