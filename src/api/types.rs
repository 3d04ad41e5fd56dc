// Library API wire types.
// Defines the response envelope and the book/borrow records it carries.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

/// Book genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genre {
    #[default]
    Science,
    Fiction,
    History,
    NonFiction,
    Biography,
    Fantasy,
    Romance,
    #[serde(other)]
    Unknown,
}

impl Genre {
    /// Genres offered when creating or editing a book.
    pub const SELECTABLE: [Genre; 7] = [
        Genre::Science,
        Genre::Fiction,
        Genre::History,
        Genre::NonFiction,
        Genre::Biography,
        Genre::Fantasy,
        Genre::Romance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Science => "Science",
            Genre::Fiction => "Fiction",
            Genre::History => "History",
            Genre::NonFiction => "Non-Fiction",
            Genre::Biography => "Biography",
            Genre::Fantasy => "Fantasy",
            Genre::Romance => "Romance",
            Genre::Unknown => "Unknown",
        }
    }

    /// Next selectable genre, wrapping around.
    pub fn next(&self) -> Self {
        let index = Self::SELECTABLE
            .iter()
            .position(|g| g == self)
            .map_or(0, |i| (i + 1) % Self::SELECTABLE.len());
        Self::SELECTABLE[index]
    }

    /// Previous selectable genre, wrapping around.
    pub fn prev(&self) -> Self {
        let len = Self::SELECTABLE.len();
        let index = Self::SELECTABLE
            .iter()
            .position(|g| g == self)
            .map_or(0, |i| (i + len - 1) % len);
        Self::SELECTABLE[index]
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A book record as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub genre: Genre,
    pub isbn: String,
    #[serde(default)]
    pub description: String,
    pub copies: u32,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Book {
    /// Availability as displayed: a book with no copies left is never available,
    /// whatever the stored flag says.
    pub fn is_available(&self) -> bool {
        self.copies > 0
    }

    /// Editable fields of this book.
    pub fn to_input(&self) -> BookInput {
        BookInput {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre,
            isbn: self.isbn.clone(),
            description: self.description.clone(),
            copies: self.copies,
            available: self.available,
        }
    }
}

/// Body for creating or replacing a book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: String,
    pub copies: u32,
    pub available: bool,
}

/// Body for borrowing copies of a book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    /// Id of the borrowed book.
    pub book: String,
    pub quantity: u32,
    pub due_date: NaiveDate,
}

/// Title and ISBN of a borrowed book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedBook {
    pub title: String,
    pub isbn: String,
}

/// Aggregated borrow count for one book, computed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSummaryItem {
    pub book: BorrowedBook,
    pub total_quantity: u32,
}

/// One page of the book list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total_pages: u32,
}

impl BookPage {
    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Wrapper every API response uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Present on paginated responses only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            total_pages: None,
        }
    }

    /// Successful envelope with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            total_pages: None,
        }
    }

    /// Turn `success: false` into an API error carrying the server message.
    pub fn ensure_success(self) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ShelfError::api(None, self.message))
        }
    }

    /// Take the data out, failing if the server sent none.
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or(ShelfError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_book_from_server_json() {
        let value = json!({
            "_id": "665f1c2e9b1d",
            "title": "Cosmos",
            "author": "Carl Sagan",
            "genre": "SCIENCE",
            "isbn": "9780345539434",
            "description": "Personal voyage",
            "copies": 0,
            "available": true,
            "createdAt": "2025-06-04T10:15:00.000Z",
            "updatedAt": "2025-06-05T08:00:00.000Z"
        });

        let book: Book = serde_json::from_value(value).unwrap();
        assert_eq!(book.id, "665f1c2e9b1d");
        assert_eq!(book.genre, Genre::Science);
        assert!(book.created_at.is_some());
        // Stored flag says available, but no copies are left.
        assert!(book.available);
        assert!(!book.is_available());
    }

    #[test]
    fn test_unknown_genre_and_missing_optionals() {
        let value = json!({
            "id": "b7",
            "title": "Odd",
            "author": "Someone",
            "genre": "POETRY",
            "isbn": "1234567890",
            "copies": 2
        });

        let book: Book = serde_json::from_value(value).unwrap();
        assert_eq!(book.id, "b7");
        assert_eq!(book.genre, Genre::Unknown);
        assert_eq!(book.description, "");
        assert!(book.is_available());
    }

    #[test]
    fn test_input_serializes_camel_case() {
        let input = BookInput {
            title: "A".to_string(),
            author: "B".to_string(),
            genre: Genre::NonFiction,
            isbn: "1234567890".to_string(),
            description: "C".to_string(),
            copies: 3,
            available: true,
        };

        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["genre"], "NON_FICTION");
        assert_eq!(value["copies"], 3);
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_borrow_request_due_date_format() {
        let request = BorrowRequest {
            book: "b1".to_string(),
            quantity: 2,
            due_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"book": "b1", "quantity": 2, "dueDate": "2026-11-01"})
        );
    }

    #[test]
    fn test_envelope_with_pages() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "success": true,
            "message": "Books retrieved",
            "data": [],
            "totalPages": 4
        }))
        .unwrap();

        assert_eq!(envelope.total_pages, Some(4));
        assert!(envelope.ensure_success().is_ok());
    }

    #[test]
    fn test_envelope_failure_becomes_api_error() {
        let envelope: Envelope<Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Book not found"
        }))
        .unwrap();

        match envelope.ensure_success() {
            Err(ShelfError::Api { status, message }) => {
                assert_eq!(status, None);
                assert_eq!(message, "Book not found");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_item() {
        let item: BorrowSummaryItem = serde_json::from_value(json!({
            "totalQuantity": 5,
            "book": {"title": "Cosmos", "isbn": "9780345539434"}
        }))
        .unwrap();

        assert_eq!(item.total_quantity, 5);
        assert_eq!(item.book.isbn, "9780345539434");
    }

    #[test]
    fn test_genre_cycle() {
        assert_eq!(Genre::Science.next(), Genre::Fiction);
        assert_eq!(Genre::Romance.next(), Genre::Science);
        assert_eq!(Genre::Science.prev(), Genre::Romance);
        assert_eq!(Genre::Unknown.next(), Genre::Science);
    }
}
