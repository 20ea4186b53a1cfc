//! Catalog Model
//!
//! Book and Member records as stored and as returned by the API.

use serde::{Deserialize, Serialize};

/// A book title held by the library.
///
/// `stock` counts available copies; individual copies have no identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
}

impl Book {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        stock: u32,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            author: author.into(),
            stock,
        }
    }

    /// Check if at least one copy can be lent out
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// A library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub code: String,
    pub name: String,
    /// Book codes currently held, oldest loan first
    pub borrowed_books: Vec<String>,
    /// True while the member is barred from borrowing
    pub penalty: bool,
}

impl Member {
    /// Create a member with no loans and no penalty
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            borrowed_books: Vec::new(),
            penalty: false,
        }
    }

    pub fn borrowed_count(&self) -> usize {
        self.borrowed_books.len()
    }

    /// Check if the member currently holds a copy of `book_code`
    pub fn holds(&self, book_code: &str) -> bool {
        self.borrowed_books.iter().any(|code| code == book_code)
    }

    /// Remove the oldest loan of `book_code`. Returns false if there was none.
    pub fn release(&mut self, book_code: &str) -> bool {
        match self.borrowed_books.iter().position(|code| code == book_code) {
            Some(index) => {
                self.borrowed_books.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_serializes_camel_case() {
        let mut member = Member::new("M001", "Angga");
        member.borrowed_books.push("JK-45".to_string());

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["code"], "M001");
        assert_eq!(json["borrowedBooks"], serde_json::json!(["JK-45"]));
        assert_eq!(json["penalty"], false);
        assert!(json.get("borrowed_books").is_none());
    }

    #[test]
    fn test_book_serialization_shape() {
        let book = Book::new("JK-45", "Harry Potter", "J.K Rowling", 1);
        let json = serde_json::to_value(&book).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "code": "JK-45",
                "title": "Harry Potter",
                "author": "J.K Rowling",
                "stock": 1
            })
        );
    }

    #[test]
    fn test_release_removes_single_occurrence() {
        let mut member = Member::new("M001", "Angga");
        member.borrowed_books = vec!["A".into(), "B".into(), "A".into()];

        assert!(member.release("A"));
        assert_eq!(member.borrowed_books, vec!["B".to_string(), "A".to_string()]);
        assert!(!member.release("C"));
        assert_eq!(member.borrowed_count(), 2);
    }

    #[test]
    fn test_book_availability() {
        let mut book = Book::new("TW-11", "Twilight", "Stephenie Meyer", 1);
        assert!(book.is_available());
        book.stock = 0;
        assert!(!book.is_available());
    }
}
