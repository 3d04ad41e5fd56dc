// Cache entry state.
// Tracks one query's status, last data, last error, and the tags it carries.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{Book, BookPage, BorrowSummaryItem, Query, QueryData};
use crate::error::ShelfError;

use super::tags::Tag;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryStatus {
    #[default]
    Uninitialized,
    Loading,
    Success,
    Error,
}

/// Snapshot of a cached query.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub query: Query,
    pub status: EntryStatus,
    /// Last successfully fetched data. Kept while refetching and after a failed refetch.
    pub data: Option<QueryData>,
    pub error: Option<Arc<ShelfError>>,
    /// Always a subset of `query.provides()`.
    pub tags: Vec<Tag>,
    /// Set when a mutation may have changed the underlying data.
    pub stale: bool,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            status: EntryStatus::Uninitialized,
            data: None,
            error: None,
            tags: Vec::new(),
            stale: false,
            fulfilled_at: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == EntryStatus::Loading
    }

    /// Success or error.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, EntryStatus::Success | EntryStatus::Error)
    }

    /// Settled and not stale: a query can be answered from this entry.
    pub fn is_fresh(&self) -> bool {
        self.is_settled() && !self.stale
    }

    pub fn is_error(&self) -> bool {
        self.status == EntryStatus::Error
    }

    pub fn carries(&self, tags: &[Tag]) -> bool {
        super::tags::intersects(&self.tags, tags)
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    pub fn books(&self) -> Option<&BookPage> {
        self.data.as_ref().and_then(QueryData::as_books)
    }

    pub fn book(&self) -> Option<&Book> {
        self.data.as_ref().and_then(QueryData::as_book)
    }

    pub fn borrow_summary(&self) -> Option<&[BorrowSummaryItem]> {
        self.data.as_ref().and_then(QueryData::as_borrow_summary)
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.status = EntryStatus::Loading;
    }

    pub(crate) fn fulfill(&mut self, data: QueryData) {
        self.status = EntryStatus::Success;
        self.data = Some(data);
        self.error = None;
        self.tags = self.query.provides().to_vec();
        self.stale = false;
        self.fulfilled_at = Some(Utc::now());
    }

    /// Record a failure. The declared tags still apply so a later mutation
    /// retries the query.
    pub(crate) fn reject(&mut self, error: ShelfError) {
        self.status = EntryStatus::Error;
        self.error = Some(Arc::new(error));
        self.tags = self.query.provides().to_vec();
        self.stale = false;
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_lifecycle() {
        let mut entry = CacheEntry::new(Query::BorrowSummary);
        assert_eq!(entry.status, EntryStatus::Uninitialized);
        assert!(!entry.is_fresh());
        assert!(entry.tags.is_empty());

        entry.begin_fetch();
        assert!(entry.is_loading());

        entry.fulfill(QueryData::BorrowSummary(Vec::new()));
        assert!(entry.is_fresh());
        assert_eq!(entry.tags, vec![Tag::Borrow]);
        assert!(entry.carries(&[Tag::Books, Tag::Borrow]));
        assert!(entry.fulfilled_at.is_some());

        entry.mark_stale();
        assert!(!entry.is_fresh());

        entry.begin_fetch();
        entry.reject(ShelfError::api(Some(500), "boom"));
        assert!(entry.is_error());
        assert!(!entry.stale);
        assert_eq!(entry.error_message().as_deref(), Some("boom"));
        // Earlier data survives a failed refetch.
        assert_eq!(entry.borrow_summary(), Some(&[][..]));
    }

    #[test]
    fn test_untagged_query_never_carries_tags() {
        let mut entry = CacheEntry::new(Query::Book { id: "b1".into() });
        entry.reject(ShelfError::api(Some(404), "Book not found"));
        assert!(entry.tags.is_empty());
        assert!(!entry.carries(&Tag::ALL));
    }
}
