//! Checks applied to every engine after every simulated operation.

use std::collections::BTreeMap;
use std::fmt;

use super::op_gen::SimRecord;
use crate::index::OrderedIndex;

/// An engine disagreed with the reference model or broke its own structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Engine that misbehaved.
    pub engine: &'static str,
    /// Description of the violation.
    pub description: String,
    /// Operation index where it was detected.
    pub operation_index: usize,
    /// Additional context.
    pub context: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] op {}: {} ({})",
            self.engine, self.operation_index, self.description, self.context
        )
    }
}

/// Collects violations across a run.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<Violation>,
}

impl InvariantChecker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub const fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Record a violation when `engine_answer` differs from `model_answer`.
    pub fn check_answer<T: PartialEq + fmt::Debug>(
        &mut self,
        engine: &'static str,
        operation_index: usize,
        what: &str,
        engine_answer: &T,
        model_answer: &T,
    ) {
        if engine_answer != model_answer {
            self.add_violation(Violation {
                engine,
                description: format!("{what} disagrees with reference model"),
                operation_index,
                context: format!("engine {engine_answer:?}, model {model_answer:?}"),
            });
        }
    }

    /// Check structure, length and full contents of `index` against `model`.
    pub fn check_engine(
        &mut self,
        engine: &'static str,
        index: &dyn OrderedIndex<SimRecord>,
        model: &BTreeMap<u32, SimRecord>,
        operation_index: usize,
    ) {
        if let Err(e) = index.check_invariants() {
            self.add_violation(Violation {
                engine,
                description: e.description,
                operation_index,
                context: e.context,
            });
        }

        self.check_answer(engine, operation_index, "len", &index.len(), &model.len());

        let contents: Vec<SimRecord> = index.to_ordered_sequence().into_iter().copied().collect();
        let expected: Vec<SimRecord> = model.values().copied().collect();
        if contents != expected {
            let first_difference = contents
                .iter()
                .zip(&expected)
                .position(|(a, b)| a != b)
                .unwrap_or_else(|| contents.len().min(expected.len()));
            self.add_violation(Violation {
                engine,
                description: "ordered contents disagree with reference model".to_string(),
                operation_index,
                context: format!(
                    "first difference at position {first_difference}: engine {:?}, model {:?}",
                    contents.get(first_difference),
                    expected.get(first_difference)
                ),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AvlTree, BTree, BinarySearchTree};

    fn record(key: u32) -> SimRecord {
        SimRecord { key, stamp: 0 }
    }

    #[test]
    fn test_agreeing_engine_has_no_violations() {
        let mut model = BTreeMap::new();
        let mut tree = BTree::new();
        for key in [5, 1, 9] {
            tree.insert(record(key));
            model.insert(key, record(key));
        }

        let mut checker = InvariantChecker::new();
        checker.check_engine("btree", &tree, &model, 0);
        assert!(!checker.has_violations(), "{:?}", checker.violations());
    }

    #[test]
    fn test_content_mismatch_is_reported() {
        let mut model = BTreeMap::new();
        model.insert(1, record(1));
        model.insert(2, record(2));
        let mut tree = AvlTree::new();
        tree.insert(record(1));
        tree.insert(SimRecord { key: 2, stamp: 9 });

        let mut checker = InvariantChecker::new();
        checker.check_engine("avl", &tree, &model, 4);

        let violations = checker.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].engine, "avl");
        assert_eq!(violations[0].operation_index, 4);
        assert!(violations[0].context.contains("position 1"));
    }

    #[test]
    fn test_length_mismatch_is_reported() {
        let mut model = BTreeMap::new();
        model.insert(1, record(1));
        let tree: BinarySearchTree<SimRecord> = BinarySearchTree::new();

        let mut checker = InvariantChecker::new();
        checker.check_engine("bst", &tree, &model, 0);
        assert_eq!(checker.violations().len(), 2);
    }

    #[test]
    fn test_check_answer() {
        let mut checker = InvariantChecker::new();
        checker.check_answer("bst", 3, "insert", &true, &true);
        assert!(!checker.has_violations());

        checker.check_answer("bst", 3, "search", &Some(1), &None);
        assert_eq!(
            checker.violations()[0].to_string(),
            "[bst] op 3: search disagrees with reference model (engine Some(1), model None)"
        );
    }
}
