//! The library service: one catalog, one directory and one ledger.
//!
//! The three indexes know nothing about each other. Everything that spans
//! them, such as "a loan must name a registered book and user", is checked
//! here before any index is touched.

use tracing::debug;

use crate::types::{Book, BookCatalog, Loan, LoanDate, LoanLedger, User, UserDirectory};
use crate::validation::{self, ValidationError};

/// Error returned by [`Library`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// An input field failed validation.
    Validation(ValidationError),
    /// A book with this ISBN is already catalogued.
    DuplicateBook(String),
    /// A user with this ID is already registered.
    DuplicateUser(String),
    /// No book with this ISBN is catalogued.
    BookNotFound(String),
    /// No user with this ID is registered.
    UserNotFound(String),
    /// The book already has an active loan.
    BookAlreadyOnLoan(String),
    /// The book has no active loan to return.
    NoActiveLoan(String),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "invalid input: {e}"),
            Self::DuplicateBook(isbn) => write!(f, "book {isbn} is already registered"),
            Self::DuplicateUser(id) => write!(f, "user {id} is already registered"),
            Self::BookNotFound(isbn) => write!(f, "book {isbn} not found"),
            Self::UserNotFound(id) => write!(f, "user {id} not found"),
            Self::BookAlreadyOnLoan(isbn) => write!(f, "book {isbn} is already on loan"),
            Self::NoActiveLoan(isbn) => write!(f, "book {isbn} is not on loan"),
        }
    }
}

impl std::error::Error for LibraryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for LibraryError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

/// Books, users and loans, with the rules that tie them together.
#[derive(Default)]
pub struct Library {
    books: BookCatalog,
    users: UserDirectory,
    loans: LoanLedger,
}

impl Library {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            books: BookCatalog::new(),
            users: UserDirectory::new(),
            loans: LoanLedger::new(),
        }
    }

    /// Catalog a book after validating its ISBN and page count.
    pub fn register_book(&mut self, book: Book) -> Result<(), LibraryError> {
        validation::validate_isbn(&book.isbn)?;
        if book.page_count == 0 {
            return Err(ValidationError::NonPositivePageCount.into());
        }

        let isbn = book.isbn.clone();
        if !self.books.insert(book) {
            return Err(LibraryError::DuplicateBook(isbn));
        }
        debug!("registered book {isbn}");
        Ok(())
    }

    /// Remove a book from the catalog. Any loan on it is left in the ledger.
    pub fn remove_book(&mut self, isbn: &str) -> Result<Book, LibraryError> {
        let book = self
            .books
            .remove(isbn)
            .ok_or_else(|| LibraryError::BookNotFound(isbn.to_string()))?;
        debug!("removed book {isbn}");
        Ok(book)
    }

    #[must_use]
    pub fn find_book(&self, isbn: &str) -> Option<&Book> {
        self.books.search(isbn)
    }

    /// Register a user after validating the ID and name.
    pub fn register_user(&mut self, user: User) -> Result<(), LibraryError> {
        validation::validate_user_id(&user.id)?;
        validation::validate_name(&user.name)?;

        let id = user.id.clone();
        if !self.users.insert(user) {
            return Err(LibraryError::DuplicateUser(id));
        }
        debug!("registered user {id}");
        Ok(())
    }

    /// Remove a user. Loans held by the user are left in the ledger.
    pub fn remove_user(&mut self, id: &str) -> Result<User, LibraryError> {
        let user = self
            .users
            .remove(id)
            .ok_or_else(|| LibraryError::UserNotFound(id.to_string()))?;
        debug!("removed user {id}");
        Ok(user)
    }

    #[must_use]
    pub fn find_user(&self, id: &str) -> Option<&User> {
        self.users.search(id)
    }

    /// Lend a catalogued book to a registered user.
    ///
    /// # Pre-conditions
    ///
    /// - `loan_date` and `due_date` are already parsed calendar dates
    ///
    /// # Post-conditions
    ///
    /// - On `Ok`, the ledger holds exactly one loan for `isbn`
    /// - On `Err`, no index is modified
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `Validation` if the ISBN is empty or not all digits
    /// - `BookNotFound` if no book has this ISBN
    /// - `UserNotFound` if no user has this ID
    /// - `Validation` if the due date is not after the loan date
    /// - `BookAlreadyOnLoan` if the book is already lent
    pub fn register_loan(
        &mut self,
        isbn: &str,
        user_id: &str,
        loan_date: LoanDate,
        due_date: LoanDate,
    ) -> Result<(), LibraryError> {
        validation::validate_isbn(isbn)?;
        if self.find_book(isbn).is_none() {
            return Err(LibraryError::BookNotFound(isbn.to_string()));
        }
        if self.find_user(user_id).is_none() {
            return Err(LibraryError::UserNotFound(user_id.to_string()));
        }
        validation::validate_loan_period(loan_date, due_date)?;

        if !self.loans.insert(Loan::new(isbn, user_id, loan_date, due_date)) {
            return Err(LibraryError::BookAlreadyOnLoan(isbn.to_string()));
        }
        debug!("registered loan of {isbn} to {user_id} from {loan_date} until {due_date}");
        Ok(())
    }

    /// Close the active loan on a catalogued book.
    pub fn return_book(&mut self, isbn: &str) -> Result<Loan, LibraryError> {
        if self.find_book(isbn).is_none() {
            return Err(LibraryError::BookNotFound(isbn.to_string()));
        }
        let loan = self
            .loans
            .remove(isbn)
            .ok_or_else(|| LibraryError::NoActiveLoan(isbn.to_string()))?;
        debug!("book {isbn} returned by {}", loan.user_id);
        Ok(loan)
    }

    #[must_use]
    pub fn find_loan(&self, isbn: &str) -> Option<&Loan> {
        self.loans.search(isbn)
    }

    #[must_use]
    pub fn is_on_loan(&self, isbn: &str) -> bool {
        self.find_loan(isbn).is_some()
    }

    /// Catalogued books with no active loan, in ascending ISBN order.
    #[must_use]
    pub fn available_books(&self) -> Vec<&Book> {
        self.books
            .iter()
            .filter(|book| self.loans.search(&book.isbn).is_none())
            .collect()
    }

    #[must_use]
    pub const fn books(&self) -> &BookCatalog {
        &self.books
    }

    #[must_use]
    pub const fn users(&self) -> &UserDirectory {
        &self.users
    }

    #[must_use]
    pub const fn loans(&self) -> &LoanLedger {
        &self.loans
    }
}
