// Books tab state management.
// Tracks the current page, list selection, and the cache subscriptions the tab holds.

use ratatui::widgets::ListState;

use crate::api::Query;
use crate::cache::Subscription;

use super::navigation::{NavigationStack, ViewLevel};

/// Complete state for the Books tab.
#[derive(Debug)]
pub struct BooksTabState {
    pub nav: NavigationStack,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
    pub list_state: ListState,
    /// Held while the list page is on screen.
    pub list_subscription: Option<Subscription>,
    /// Held while a details view is on screen.
    pub detail_subscription: Option<Subscription>,
}

impl BooksTabState {
    pub fn new(limit: u32) -> Self {
        Self {
            nav: NavigationStack::default(),
            page: 1,
            limit: limit.max(1),
            list_state: ListState::default(),
            list_subscription: None,
            detail_subscription: None,
        }
    }

    /// Query backing the current list page.
    pub fn list_query(&self) -> Query {
        Query::Books {
            page: self.page,
            limit: self.limit,
        }
    }

    /// Query backing the open details view, if any.
    pub fn detail_query(&self) -> Option<Query> {
        self.nav
            .current()
            .book_id()
            .map(|id| Query::Book { id: id.to_string() })
    }

    pub fn in_details(&self) -> bool {
        matches!(self.nav.current(), ViewLevel::Details { .. })
    }

    /// Advance a page if one exists. Returns true if the page changed.
    pub fn next_page(&mut self, total_pages: u32) -> bool {
        if self.page < total_pages {
            self.page += 1;
            self.list_state.select(Some(0));
            true
        } else {
            false
        }
    }

    /// Go back a page. Returns true if the page changed.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            self.list_state.select(Some(0));
            true
        } else {
            false
        }
    }

    /// Get the currently selected index.
    pub fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Select the next item in a list of `len` items.
    pub fn select_next(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i >= len - 1 => i, // Stay at end
            Some(i) => i + 1,
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous item in a list of `len` items.
    pub fn select_prev(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Keep the selection inside a list that may have shrunk after a refetch.
    pub fn clamp_selection(&mut self, len: usize) {
        match (len, self.list_state.selected()) {
            (0, _) => self.list_state.select(None),
            (_, None) => self.list_state.select(Some(0)),
            (len, Some(i)) if i >= len => self.list_state.select(Some(len - 1)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_bounds() {
        let mut state = BooksTabState::new(10);
        assert_eq!(state.list_query(), Query::Books { page: 1, limit: 10 });

        assert!(!state.prev_page());
        assert!(state.next_page(2));
        assert_eq!(state.page, 2);
        assert!(!state.next_page(2));
        assert!(state.prev_page());
        assert_eq!(state.list_query(), Query::Books { page: 1, limit: 10 });
    }

    #[test]
    fn test_selection() {
        let mut state = BooksTabState::new(10);
        state.select_next(3);
        assert_eq!(state.selected(), Some(0));
        state.select_next(3);
        state.select_next(3);
        state.select_next(3);
        assert_eq!(state.selected(), Some(2));
        state.select_prev(3);
        assert_eq!(state.selected(), Some(1));

        // A deletion shrank the page.
        state.list_state.select(Some(2));
        state.clamp_selection(2);
        assert_eq!(state.selected(), Some(1));
        state.clamp_selection(0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn test_detail_query() {
        let mut state = BooksTabState::new(5);
        assert!(state.detail_query().is_none());

        state.nav.push(ViewLevel::Details {
            id: "b9".to_string(),
            title: "Dune".to_string(),
        });
        assert!(state.in_details());
        assert_eq!(
            state.detail_query(),
            Some(Query::Book {
                id: "b9".to_string()
            })
        );
    }
}
