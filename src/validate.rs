// Client-side validation for book and borrow forms.
// Everything here runs before a request is issued; a failure never touches the cache.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::api::{Book, BookInput};

static ISBN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10,30}$").expect("ISBN pattern is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill out the {0} field.")]
    MissingField(&'static str),

    #[error("Please enter a number between 10 and 30 digits")]
    InvalidIsbn,

    #[error("{0} must be a whole number")]
    NotANumber(&'static str),

    #[error("Quantity must be between 1 and {max}")]
    QuantityOutOfRange { max: u32 },

    #[error("Please select a due date.")]
    MissingDueDate,

    #[error("Due date must look like YYYY-MM-DD")]
    InvalidDueDate,
}

/// Check an ISBN against the 10 to 30 digit pattern.
pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_PATTERN.is_match(isbn)
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Fields shared by create and update: text fields present, ISBN well-formed.
fn validate_book_fields(input: &BookInput) -> Result<(), ValidationError> {
    require(&input.title, "title")?;
    require(&input.author, "author")?;
    require(&input.isbn, "isbn")?;
    require(&input.description, "description")?;

    if !is_valid_isbn(input.isbn.trim()) {
        return Err(ValidationError::InvalidIsbn);
    }
    Ok(())
}

/// Validate a book about to be created. A new book needs at least one copy.
pub fn validate_new_book(input: &BookInput) -> Result<(), ValidationError> {
    validate_book_fields(input)?;
    if input.copies == 0 {
        return Err(ValidationError::MissingField("copies"));
    }
    Ok(())
}

/// Validate an edit. Zero copies is allowed (everything may be on loan).
pub fn validate_book_update(input: &BookInput) -> Result<(), ValidationError> {
    validate_book_fields(input)
}

/// Validate a borrow against the remaining copies shown to the user.
pub fn validate_borrow(
    book: &Book,
    quantity: u32,
    due_date: Option<NaiveDate>,
) -> Result<NaiveDate, ValidationError> {
    if quantity < 1 || quantity > book.copies {
        return Err(ValidationError::QuantityOutOfRange { max: book.copies });
    }
    due_date.ok_or(ValidationError::MissingDueDate)
}

/// Parse a numeric form field. Blank input is reported as missing.
pub fn parse_count(value: &str, field: &'static str) -> Result<u32, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    value
        .parse::<u32>()
        .map_err(|_| ValidationError::NotANumber(field))
}

/// Parse a due date typed as `YYYY-MM-DD`. Blank input means no date was picked.
pub fn parse_due_date(value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| ValidationError::InvalidDueDate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Genre;

    fn input() -> BookInput {
        BookInput {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            genre: Genre::Fiction,
            isbn: "9780441013593".to_string(),
            description: "Desert planet".to_string(),
            copies: 2,
            available: true,
        }
    }

    fn book(copies: u32) -> Book {
        Book {
            id: "b1".to_string(),
            title: "A".to_string(),
            author: "Anon".to_string(),
            genre: Genre::Science,
            isbn: "1234567890".to_string(),
            description: String::new(),
            copies,
            available: copies > 0,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_isbn_pattern() {
        assert!(is_valid_isbn("1234567890"));
        assert!(is_valid_isbn(&"9".repeat(30)));
        assert!(!is_valid_isbn("123456789"));
        assert!(!is_valid_isbn(&"9".repeat(31)));
        assert!(!is_valid_isbn("978-0441013593"));
        assert!(!is_valid_isbn(""));
    }

    #[test]
    fn test_new_book_requires_fields() {
        assert!(validate_new_book(&input()).is_ok());

        let mut missing = input();
        missing.author = "   ".to_string();
        assert_eq!(
            validate_new_book(&missing),
            Err(ValidationError::MissingField("author"))
        );
        assert_eq!(
            ValidationError::MissingField("author").to_string(),
            "Please fill out the author field."
        );

        let mut bad_isbn = input();
        bad_isbn.isbn = "12345".to_string();
        assert_eq!(
            validate_new_book(&bad_isbn),
            Err(ValidationError::InvalidIsbn)
        );
    }

    #[test]
    fn test_copies_only_required_on_create() {
        let mut empty = input();
        empty.copies = 0;
        assert_eq!(
            validate_new_book(&empty),
            Err(ValidationError::MissingField("copies"))
        );
        assert!(validate_book_update(&empty).is_ok());
    }

    #[test]
    fn test_borrow_quantity_bounds() {
        let due = NaiveDate::from_ymd_opt(2026, 11, 1);
        let book = book(3);

        assert_eq!(validate_borrow(&book, 1, due), Ok(due.unwrap()));
        assert_eq!(validate_borrow(&book, 3, due), Ok(due.unwrap()));

        let err = validate_borrow(&book, 5, due).unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be between 1 and 3");
        assert_eq!(
            validate_borrow(&book, 0, due),
            Err(ValidationError::QuantityOutOfRange { max: 3 })
        );
    }

    #[test]
    fn test_borrow_requires_due_date() {
        let err = validate_borrow(&book(3), 1, None).unwrap_err();
        assert_eq!(err.to_string(), "Please select a due date.");
    }

    #[test]
    fn test_borrow_from_empty_shelf() {
        // Every quantity is out of range when nothing is left.
        let due = NaiveDate::from_ymd_opt(2026, 11, 1);
        assert_eq!(
            validate_borrow(&book(0), 1, due),
            Err(ValidationError::QuantityOutOfRange { max: 0 })
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_count(" 4 ", "copies"), Ok(4));
        assert_eq!(
            parse_count("", "copies"),
            Err(ValidationError::MissingField("copies"))
        );
        assert_eq!(
            parse_count("four", "copies"),
            Err(ValidationError::NotANumber("copies"))
        );

        assert_eq!(parse_due_date(""), Ok(None));
        assert_eq!(
            parse_due_date("2026-11-01"),
            Ok(NaiveDate::from_ymd_opt(2026, 11, 1))
        );
        assert_eq!(
            parse_due_date("11/01/2026"),
            Err(ValidationError::InvalidDueDate)
        );
    }
}
