//! Menu-driven text front end over a [`Library`].
//!
//! The console reads one line per prompt from any `BufRead` and writes to
//! any `Write`, so a session can be scripted from a byte slice. End of input
//! at any prompt ends the session.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::library::{Library, LibraryError};
use crate::types::{Book, LoanDate, User};
use crate::validation::{self, ValidationError};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const MENU: &str = "\
Menu:
1. Register book
2. Remove book
3. Find book
4. Register user
5. Remove user
6. Find user
7. Register loan
8. Return book
9. List available books
0. Exit
";

/// Whether the session goes on after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Read the next answer, or end the action when input runs out.
macro_rules! answer {
    ($console:expr, $prompt:expr) => {
        match $console.prompt($prompt)? {
            Some(line) => line,
            None => return Ok(Flow::Exit),
        }
    };
}

/// Interactive session over a library.
pub struct Console<R, W> {
    library: Library,
    input: R,
    output: W,
    config: AppConfig,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub const fn new(library: Library, input: R, output: W, config: AppConfig) -> Self {
        Self {
            library,
            input,
            output,
            config,
        }
    }

    #[must_use]
    pub const fn library(&self) -> &Library {
        &self.library
    }

    /// End the session and hand back the library.
    #[must_use]
    pub fn into_library(self) -> Library {
        self.library
    }

    /// Show the menu and dispatch choices until `0` or end of input.
    ///
    /// # Invariants
    ///
    /// - Every prompt flushes the output before reading, so a scripted
    ///   writer sees each prompt ahead of its answer
    /// - Registration fields and loan dates are asked for again until valid
    ///
    /// # Post-conditions
    ///
    /// - Output is flushed
    /// - Returns `Ok` on `0` and on end of input at any prompt
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from reading input or writing output.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            if self.config.clear_screen {
                write!(self.output, "{CLEAR_SCREEN}")?;
            }
            write!(self.output, "{MENU}")?;

            let Some(choice) = self.prompt("Choose an option: ")? else {
                break;
            };
            debug!("menu choice {choice:?}");

            let flow = match choice.as_str() {
                "1" => self.register_book()?,
                "2" => self.remove_book()?,
                "3" => self.find_book()?,
                "4" => self.register_user()?,
                "5" => self.remove_user()?,
                "6" => self.find_user()?,
                "7" => self.register_loan()?,
                "8" => self.return_book()?,
                "9" => self.list_available_books()?,
                "0" => {
                    writeln!(self.output, "Exiting...")?;
                    Flow::Exit
                }
                _ => {
                    writeln!(self.output, "Invalid option!")?;
                    self.pause()?
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.output.flush()?;
        debug!("console session ended");
        Ok(())
    }

    /// Write `prompt`, then read one line without its line ending.
    ///
    /// Returns `None` at end of input.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn pause(&mut self) -> io::Result<Flow> {
        if !self.config.pause_after_action {
            return Ok(Flow::Continue);
        }
        Ok(match self.prompt("Press Enter to continue...")? {
            Some(_) => Flow::Continue,
            None => Flow::Exit,
        })
    }

    /// Print a message, then pause.
    fn report(&mut self, message: &str) -> io::Result<Flow> {
        writeln!(self.output, "{message}")?;
        self.pause()
    }

    fn register_book(&mut self) -> io::Result<Flow> {
        let isbn = loop {
            let isbn = answer!(self, "ISBN: ");
            if validation::validate_isbn(&isbn).is_ok() {
                break isbn;
            }
            writeln!(self.output, "Invalid ISBN. Use digits only. Try again.")?;
        };
        let title = answer!(self, "Title: ");
        let author = answer!(self, "Author: ");

        let mut page_prompt = "Pages: ";
        let page_count = loop {
            let text = answer!(self, page_prompt);
            let parsed = text.parse::<i64>().ok().map(validation::validate_page_count);
            if let Some(Ok(count)) = parsed {
                break count;
            }
            page_prompt = "Invalid input. Enter a positive page count: ";
        };

        match self.library.register_book(Book::new(isbn, title, author, page_count)) {
            Ok(()) => self.report("Book registered successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn remove_book(&mut self) -> io::Result<Flow> {
        let isbn = answer!(self, "ISBN of the book to remove: ");
        match self.library.remove_book(&isbn) {
            Ok(_) => self.report("Book removed successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn find_book(&mut self) -> io::Result<Flow> {
        let isbn = answer!(self, "ISBN of the book: ");
        if let Some(book) = self.library.find_book(&isbn) {
            writeln!(self.output, "Title: {}", book.title)?;
            writeln!(self.output, "Author: {}", book.author)?;
            writeln!(self.output, "Pages: {}", book.page_count)?;
            self.pause()
        } else {
            self.report("Book not found!")
        }
    }

    fn register_user(&mut self) -> io::Result<Flow> {
        let id = loop {
            let id = answer!(self, "ID: ");
            if validation::validate_user_id(&id).is_ok() {
                break id;
            }
            writeln!(self.output, "Invalid ID. The ID cannot be empty. Try again.")?;
        };
        let name = loop {
            let name = answer!(self, "Name: ");
            match validation::validate_name(&name) {
                Ok(()) => break name,
                Err(ValidationError::EmptyName) => {
                    writeln!(self.output, "Invalid name. The name cannot be empty. Try again.")?;
                }
                Err(_) => {
                    writeln!(
                        self.output,
                        "Invalid name. The name cannot contain digits. Try again."
                    )?;
                }
            }
        };
        let contact = answer!(self, "Contact: ");

        match self.library.register_user(User::new(id, name, contact)) {
            Ok(()) => self.report("User registered successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn remove_user(&mut self) -> io::Result<Flow> {
        let id = answer!(self, "ID of the user to remove: ");
        match self.library.remove_user(&id) {
            Ok(_) => self.report("User removed successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn find_user(&mut self) -> io::Result<Flow> {
        let id = answer!(self, "ID of the user: ");
        if let Some(user) = self.library.find_user(&id) {
            writeln!(self.output, "Name: {}", user.name)?;
            writeln!(self.output, "Contact: {}", user.contact)?;
            self.pause()
        } else {
            self.report("User not found!")
        }
    }

    fn register_loan(&mut self) -> io::Result<Flow> {
        let isbn = answer!(self, "Book ISBN: ");
        if self.library.find_book(&isbn).is_none() {
            return self.report("Book not found!");
        }
        let user_id = answer!(self, "User ID: ");
        if self.library.find_user(&user_id).is_none() {
            return self.report("User not found!");
        }
        if self.library.is_on_loan(&isbn) {
            return self.report("This book is already on loan!");
        }

        let loan_date = loop {
            let text = answer!(self, "Loan date (dd-mm-yyyy): ");
            if let Ok(date) = LoanDate::parse(&text) {
                break date;
            }
            writeln!(self.output, "Invalid date. Use the dd-mm-yyyy format. Try again.")?;
        };
        let due_date = loop {
            let text = answer!(self, "Due date (dd-mm-yyyy): ");
            let valid = LoanDate::parse(&text)
                .and_then(|due| validation::validate_loan_period(loan_date, due).map(|()| due));
            if let Ok(date) = valid {
                break date;
            }
            writeln!(
                self.output,
                "Invalid due date. It must be after the loan date and in the dd-mm-yyyy format. Try again."
            )?;
        };

        match self.library.register_loan(&isbn, &user_id, loan_date, due_date) {
            Ok(()) => self.report("Loan registered successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn return_book(&mut self) -> io::Result<Flow> {
        let isbn = answer!(self, "Book ISBN: ");
        match self.library.return_book(&isbn) {
            Ok(_) => self.report("Book returned successfully!"),
            Err(e) => self.report_error(&e),
        }
    }

    fn list_available_books(&mut self) -> io::Result<Flow> {
        let lines: Vec<String> = self
            .library
            .available_books()
            .into_iter()
            .map(Book::to_string)
            .collect();

        if lines.is_empty() {
            writeln!(self.output, "No books available at the moment.")?;
        }
        for line in &lines {
            writeln!(self.output, "{line}")?;
        }
        self.pause()
    }

    fn report_error(&mut self, error: &LibraryError) -> io::Result<Flow> {
        let message = match error {
            LibraryError::BookNotFound(_) => "Book not found!".to_string(),
            LibraryError::UserNotFound(_) => "User not found!".to_string(),
            LibraryError::NoActiveLoan(_) => "This book is not on loan.".to_string(),
            LibraryError::BookAlreadyOnLoan(_) => "This book is already on loan!".to_string(),
            LibraryError::DuplicateBook(isbn) => {
                format!("A book with ISBN {isbn} is already registered.")
            }
            LibraryError::DuplicateUser(id) => {
                format!("A user with ID {id} is already registered.")
            }
            LibraryError::Validation(e) => {
                warn!("input passed console checks but failed validation: {e}");
                format!("Invalid input: {e}")
            }
        };
        self.report(&message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a scripted session and return the library and everything printed.
    fn session(library: Library, script: &str, config: AppConfig) -> (Library, String) {
        let mut output = Vec::new();
        let mut console = Console::new(library, script.as_bytes(), &mut output, config);
        console.run().expect("session should not fail on in-memory io");
        let library = console.into_library();
        (library, String::from_utf8(output).expect("output should be utf-8"))
    }

    fn scripted(library: Library, script: &str) -> (Library, String) {
        session(library, script, AppConfig::non_interactive())
    }

    fn library_with_book_and_user() -> Library {
        let mut library = Library::new();
        library
            .register_book(Book::new("111", "Dom Casmurro", "Machado de Assis", 256))
            .expect("book should register");
        library
            .register_user(User::new("u1", "Clarice", "clarice@example.com"))
            .expect("user should register");
        library
    }

    #[test]
    fn test_exit_option() {
        let (_, output) = scripted(Library::new(), "0\n1\n");
        assert!(output.starts_with(MENU));
        assert!(output.ends_with("Exiting...\n"));
    }

    #[test]
    fn test_end_of_input_ends_session() {
        let (_, output) = scripted(Library::new(), "");
        assert!(output.ends_with("Choose an option: "));

        // Input ends in the middle of registering a book.
        let (library, _) = scripted(Library::new(), "1\n123\nTitle\n");
        assert!(library.books().is_empty());
    }

    #[test]
    fn test_invalid_option() {
        let (_, output) = scripted(Library::new(), "42\nabc\n0\n");
        assert_eq!(output.matches("Invalid option!").count(), 2);
    }

    #[test]
    fn test_register_book_reprompts_until_valid() {
        let script = "1\n12-ab\n978\nThe Hour of the Star\nClarice Lispector\n-3\nmany\n96\n0\n";
        let (library, output) = scripted(Library::new(), script);

        assert!(output.contains("Invalid ISBN. Use digits only. Try again."));
        assert_eq!(
            output
                .matches("Invalid input. Enter a positive page count: ")
                .count(),
            2
        );
        assert!(output.contains("Book registered successfully!"));

        let book = library.find_book("978").expect("book should exist");
        assert_eq!(book.title, "The Hour of the Star");
        assert_eq!(book.author, "Clarice Lispector");
        assert_eq!(book.page_count, 96);
    }

    #[test]
    fn test_register_duplicate_book() {
        let script = "1\n111\nOther\nOther\n10\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);
        assert!(output.contains("A book with ISBN 111 is already registered."));
        assert_eq!(
            library.find_book("111").map(|b| b.title.as_str()),
            Some("Dom Casmurro")
        );
    }

    #[test]
    fn test_find_and_remove_book() {
        let script = "3\n111\n2\n111\n3\n111\n2\n111\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);

        assert!(output.contains("Title: Dom Casmurro\nAuthor: Machado de Assis\nPages: 256\n"));
        assert!(output.contains("Book removed successfully!"));
        assert_eq!(output.matches("Book not found!").count(), 2);
        assert!(library.books().is_empty());
    }

    #[test]
    fn test_register_user_rejects_digits_in_name() {
        let script = "4\nu2\nJo4o\nJoao\n+55 11 5555-0000\n6\nu2\n0\n";
        let (library, output) = scripted(Library::new(), script);

        assert!(output.contains("Invalid name. The name cannot contain digits. Try again."));
        assert!(output.contains("User registered successfully!"));
        assert!(output.contains("Name: Joao\nContact: +55 11 5555-0000\n"));
        assert_eq!(library.find_user("u2").map(|u| u.name.as_str()), Some("Joao"));
    }

    #[test]
    fn test_remove_user() {
        let script = "5\nu1\n5\nu1\n6\nu1\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);
        assert!(output.contains("User removed successfully!"));
        assert_eq!(output.matches("User not found!").count(), 2);
        assert!(library.users().is_empty());
    }

    #[test]
    fn test_register_loan_reprompts_dates() {
        let script = "7\n111\nu1\n2024-01-10\n10-01-2024\n09-01-2024\n31-02-2024\n24-01-2024\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);

        assert_eq!(
            output
                .matches("Invalid date. Use the dd-mm-yyyy format. Try again.")
                .count(),
            1
        );
        assert_eq!(output.matches("Invalid due date.").count(), 2);
        assert!(output.contains("Loan registered successfully!"));

        let loan = library.find_loan("111").expect("loan should exist");
        assert_eq!(loan.user_id, "u1");
        assert_eq!(loan.loan_date.to_string(), "10-01-2024");
        assert_eq!(loan.due_date.to_string(), "24-01-2024");
    }

    #[test]
    fn test_register_loan_unknown_book_or_user() {
        let script = "7\n999\n7\n111\nnobody\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);
        assert!(output.contains("Book not found!"));
        assert!(output.contains("User not found!"));
        assert!(library.loans().is_empty());
    }

    #[test]
    fn test_loan_return_and_listing() {
        let script = "9\n7\n111\nu1\n01-03-2024\n15-03-2024\n9\n7\n111\nu1\n8\n111\n8\n111\n9\n0\n";
        let (library, output) = scripted(library_with_book_and_user(), script);

        let listing = "ISBN: 111, Title: Dom Casmurro, Author: Machado de Assis, Pages: 256\n";
        assert_eq!(output.matches(listing).count(), 2);
        assert_eq!(output.matches("No books available at the moment.").count(), 1);
        assert!(output.contains("This book is already on loan!"));
        assert!(output.contains("Book returned successfully!"));
        assert!(output.contains("This book is not on loan."));
        assert!(library.loans().is_empty());
    }

    #[test]
    fn test_interactive_config_clears_and_pauses() {
        let config = AppConfig::default();
        let (_, output) = session(Library::new(), "42\n\n0\n", config);

        assert_eq!(output.matches(CLEAR_SCREEN).count(), 2);
        assert_eq!(output.matches("Press Enter to continue...").count(), 1);
        assert!(output.ends_with("Exiting...\n"));
    }

    #[test]
    fn test_end_of_input_during_pause() {
        let (_, output) = session(Library::new(), "42\n", AppConfig::default());
        assert!(output.ends_with("Press Enter to continue..."));
    }
}
