// Library operations on top of the query cache.
// Validates user input locally, then reads through the cache or issues mutations.

use chrono::NaiveDate;
use tracing::debug;

use crate::api::{Book, BookInput, BorrowRequest, Mutation, Query};
use crate::cache::{CacheEntry, QueryCache};
use crate::error::Result;
use crate::validate;

/// Typed entry point for the views. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Library {
    cache: QueryCache,
}

impl Library {
    pub fn new(cache: QueryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// One page of books.
    pub async fn books(&self, page: u32, limit: u32) -> CacheEntry {
        self.cache.query(Query::Books { page, limit }).await
    }

    /// A single book. Not refreshed by mutations; use [`QueryCache::refetch`].
    pub async fn book(&self, id: &str) -> CacheEntry {
        self.cache.query(Query::Book { id: id.to_string() }).await
    }

    pub async fn borrow_summary(&self) -> CacheEntry {
        self.cache.query(Query::BorrowSummary).await
    }

    /// Create a book. Returns the server's message.
    pub async fn add_book(&self, input: BookInput) -> Result<String> {
        validate::validate_new_book(&input)?;
        self.cache.mutate(Mutation::AddBook(normalize(input))).await
    }

    /// Replace a book's fields.
    pub async fn update_book(&self, id: &str, input: BookInput) -> Result<String> {
        validate::validate_book_update(&input)?;
        self.cache
            .mutate(Mutation::UpdateBook {
                id: id.to_string(),
                book: normalize(input),
            })
            .await
    }

    /// Delete a book. Its by-id entry is dropped since nothing would refresh it.
    pub async fn delete_book(&self, id: &str) -> Result<String> {
        let message = self
            .cache
            .mutate(Mutation::DeleteBook { id: id.to_string() })
            .await?;
        self.cache.evict(&Query::Book { id: id.to_string() });
        Ok(message)
    }

    /// Borrow `quantity` copies of `book`, checked against the copies the user was shown.
    pub async fn borrow_book(
        &self,
        book: &Book,
        quantity: u32,
        due_date: Option<NaiveDate>,
    ) -> Result<String> {
        let due_date = validate::validate_borrow(book, quantity, due_date)?;
        debug!(book = %book.id, quantity, %due_date, "borrow validated");

        self.cache
            .mutate(Mutation::BorrowBook(BorrowRequest {
                book: book.id.clone(),
                quantity,
                due_date,
            }))
            .await
    }
}

/// Trim text fields before sending.
fn normalize(mut input: BookInput) -> BookInput {
    input.title = input.title.trim().to_string();
    input.author = input.author.trim().to_string();
    input.isbn = input.isbn.trim().to_string();
    input.description = input.description.trim().to_string();
    input
}
