//! Records held by the library indexes, and the index types that hold them.

mod book;
mod date;
mod loan;
mod user;

pub use book::Book;
pub use date::LoanDate;
pub use loan::Loan;
pub use user::User;

use crate::index::{AvlTree, BTree, BinarySearchTree};

/// Books keyed by ISBN, in an unbalanced binary search tree.
pub type BookCatalog = BinarySearchTree<Book>;

/// Users keyed by user ID, in an AVL tree.
pub type UserDirectory = AvlTree<User>;

/// Active loans keyed by ISBN, in a B-tree.
pub type LoanLedger = BTree<Loan>;
