//! Input validation for library records.
//!
//! Every check returns a [`ValidationError`] naming the offending input, so
//! callers can either re-prompt (the console) or propagate it with `?`
//! (the library service).

use crate::types::LoanDate;

/// A field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The book identifier is empty.
    EmptyIsbn,
    /// The book identifier contains something other than ASCII digits.
    NonNumericIsbn(String),
    /// The user identifier is empty or blank.
    EmptyUserId,
    /// The display name is empty or blank.
    EmptyName,
    /// The display name contains a decimal digit.
    NameContainsDigit(String),
    /// The page count is zero or negative.
    NonPositivePageCount,
    /// The page count does not fit in a `u32`.
    PageCountTooLarge(i64),
    /// The date is not written as `dd-mm-yyyy`.
    MalformedDate(String),
    /// The date has the right shape but names no real calendar day.
    InvalidCalendarDate(String),
    /// The due date is on or before the loan date.
    DueDateNotAfterLoanDate { loan: LoanDate, due: LoanDate },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIsbn => write!(f, "ISBN must not be empty"),
            Self::NonNumericIsbn(isbn) => write!(f, "ISBN '{isbn}' must contain only digits"),
            Self::EmptyUserId => write!(f, "user ID must not be empty"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameContainsDigit(name) => write!(f, "name '{name}' must not contain digits"),
            Self::NonPositivePageCount => write!(f, "page count must be positive"),
            Self::PageCountTooLarge(count) => write!(f, "page count {count} is too large"),
            Self::MalformedDate(date) => {
                write!(f, "date '{date}' is not in the dd-mm-yyyy format")
            }
            Self::InvalidCalendarDate(date) => write!(f, "date '{date}' does not exist"),
            Self::DueDateNotAfterLoanDate { loan, due } => {
                write!(f, "due date {due} must be after loan date {loan}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// A book identifier is a non-empty run of ASCII digits.
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    if isbn.is_empty() {
        return Err(ValidationError::EmptyIsbn);
    }
    if !isbn.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NonNumericIsbn(isbn.to_string()));
    }
    Ok(())
}

/// A user identifier is any non-blank string.
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::EmptyUserId);
    }
    Ok(())
}

/// A display name is non-blank and contains no decimal digit.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NameContainsDigit(name.to_string()));
    }
    Ok(())
}

/// Accept a strictly positive page count, narrowed to `u32`.
pub fn validate_page_count(count: i64) -> Result<u32, ValidationError> {
    if count <= 0 {
        return Err(ValidationError::NonPositivePageCount);
    }
    u32::try_from(count).map_err(|_| ValidationError::PageCountTooLarge(count))
}

/// The due date must fall strictly after the loan date.
pub fn validate_loan_period(loan: LoanDate, due: LoanDate) -> Result<(), ValidationError> {
    if due <= loan {
        return Err(ValidationError::DueDateNotAfterLoanDate { loan, due });
    }
    Ok(())
}
