// Library API endpoint declarations.
// Each query and mutation names its request, how to decode the reply, and its cache tags.

use std::fmt;

use serde_json::Value;

use crate::cache::Tag;
use crate::error::Result;

use super::transport::ApiRequest;
use super::types::{Book, BookInput, BookPage, BorrowRequest, BorrowSummaryItem, Envelope};

/// A cacheable read. The value itself (operation plus arguments) is the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// One page of the book list.
    Books { page: u32, limit: u32 },
    /// A single book by id.
    Book { id: String },
    /// Borrow totals per book.
    BorrowSummary,
}

impl Query {
    /// Operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Query::Books { .. } => "getBooks",
            Query::Book { .. } => "getBook",
            Query::BorrowSummary => "getBorrowSummary",
        }
    }

    /// Tags attached to this query's cached result.
    pub fn provides(&self) -> &'static [Tag] {
        match self {
            Query::Books { .. } => &[Tag::Books],
            Query::Book { .. } => &[],
            Query::BorrowSummary => &[Tag::Borrow],
        }
    }

    pub fn request(&self) -> ApiRequest {
        match self {
            Query::Books { page, limit } => ApiRequest::get("books")
                .with_param("page", page)
                .with_param("limit", limit),
            Query::Book { id } => ApiRequest::get(format!("books/{}", id)),
            Query::BorrowSummary => ApiRequest::get("borrow"),
        }
    }

    /// Decode a successful envelope into this query's data.
    pub fn decode(&self, envelope: Envelope<Value>) -> Result<QueryData> {
        match self {
            Query::Books { .. } => {
                let total_pages = envelope.total_pages.unwrap_or(1);
                let books: Vec<Book> = serde_json::from_value(envelope.into_data()?)?;
                Ok(QueryData::Books(BookPage { books, total_pages }))
            }
            Query::Book { .. } => {
                let book: Book = serde_json::from_value(envelope.into_data()?)?;
                Ok(QueryData::Book(book))
            }
            Query::BorrowSummary => {
                let items: Vec<BorrowSummaryItem> =
                    serde_json::from_value(envelope.into_data()?)?;
                Ok(QueryData::BorrowSummary(items))
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Books { page, limit } => {
                write!(f, "{}(page={}, limit={})", self.name(), page, limit)
            }
            Query::Book { id } => write!(f, "{}({})", self.name(), id),
            Query::BorrowSummary => write!(f, "{}()", self.name()),
        }
    }
}

/// Decoded result of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Books(BookPage),
    Book(Book),
    BorrowSummary(Vec<BorrowSummaryItem>),
}

impl QueryData {
    pub fn as_books(&self) -> Option<&BookPage> {
        match self {
            QueryData::Books(page) => Some(page),
            _ => None,
        }
    }

    pub fn as_book(&self) -> Option<&Book> {
        match self {
            QueryData::Book(book) => Some(book),
            _ => None,
        }
    }

    pub fn as_borrow_summary(&self) -> Option<&[BorrowSummaryItem]> {
        match self {
            QueryData::BorrowSummary(items) => Some(items),
            _ => None,
        }
    }
}

/// A write against the API. Mutations are never cached.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddBook(BookInput),
    UpdateBook { id: String, book: BookInput },
    DeleteBook { id: String },
    BorrowBook(BorrowRequest),
}

impl Mutation {
    /// Operation name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddBook(_) => "addBook",
            Mutation::UpdateBook { .. } => "updateBook",
            Mutation::DeleteBook { .. } => "deleteBook",
            Mutation::BorrowBook(_) => "borrowBook",
        }
    }

    /// Tags whose cached queries become stale once this mutation succeeds.
    pub fn invalidates(&self) -> &'static [Tag] {
        match self {
            Mutation::AddBook(_) | Mutation::UpdateBook { .. } | Mutation::DeleteBook { .. } => {
                &[Tag::Books]
            }
            Mutation::BorrowBook(_) => &[Tag::Books, Tag::Borrow],
        }
    }

    pub fn request(&self) -> Result<ApiRequest> {
        let request = match self {
            Mutation::AddBook(book) => ApiRequest::post("books", serde_json::to_value(book)?),
            Mutation::UpdateBook { id, book } => {
                ApiRequest::put(format!("books/{}", id), serde_json::to_value(book)?)
            }
            Mutation::DeleteBook { id } => ApiRequest::delete(format!("books/{}", id)),
            Mutation::BorrowBook(borrow) => {
                ApiRequest::post("borrow", serde_json::to_value(borrow)?)
            }
        };
        Ok(request)
    }
}
