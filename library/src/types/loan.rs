use crate::index::Record;
use crate::types::LoanDate;

/// An active loan. A book has at most one, so loans are keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub isbn: String,
    pub user_id: String,
    pub loan_date: LoanDate,
    pub due_date: LoanDate,
}

impl Loan {
    pub fn new(
        isbn: impl Into<String>,
        user_id: impl Into<String>,
        loan_date: LoanDate,
        due_date: LoanDate,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            user_id: user_id.into(),
            loan_date,
            due_date,
        }
    }
}

impl Record for Loan {
    type Key = String;

    fn key(&self) -> &String {
        &self.isbn
    }
}
