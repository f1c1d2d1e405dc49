use std::fmt;

use crate::index::Record;

/// A catalogued book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Numeric identifier, unique within the catalog.
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub page_count: u32,
}

impl Book {
    pub fn new(
        isbn: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        page_count: u32,
    ) -> Self {
        Self {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
            page_count,
        }
    }
}

impl Record for Book {
    type Key = String;

    fn key(&self) -> &String {
        &self.isbn
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ISBN: {}, Title: {}, Author: {}, Pages: {}",
            self.isbn, self.title, self.author, self.page_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookCatalog;

    #[test]
    fn test_book_display() {
        let book = Book::new("42", "Dune", "Frank Herbert", 412);
        assert_eq!(
            book.to_string(),
            "ISBN: 42, Title: Dune, Author: Frank Herbert, Pages: 412"
        );
        assert_eq!(book.key(), "42");
    }

    #[test]
    fn test_catalog_promotes_right_minimum() {
        let mut catalog = BookCatalog::new();
        for isbn in ["50", "20", "80", "10", "30"] {
            assert!(catalog.insert(Book::new(isbn, "Title", "Author", 1)));
        }

        assert!(catalog.remove("20").is_some());
        assert!(catalog.search("30").is_some());
        let isbns: Vec<&str> = catalog.iter().map(|book| book.isbn.as_str()).collect();
        assert_eq!(isbns, ["10", "30", "50", "80"]);
        assert_eq!(catalog.height(), 3);
    }
}
