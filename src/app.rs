// App state and main event loop.
// Manages tabs, modals, cache subscriptions, and keyboard input handling.

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::prelude::*;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{Book, Query};
use crate::cache::{CacheEntry, EntryStatus, Subscription};
use crate::error::{Result, ShelfError};
use crate::library::Library;
use crate::state::{
    BookForm, BooksTabState, BorrowForm, ConsoleLog, FormMode, Toast, ViewLevel,
};
use crate::ui;

/// How often unused cache entries are swept.
const GC_INTERVAL: Duration = Duration::from_secs(30);

/// Active tab in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Books,
    Summary,
    Console,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Books, Tab::Summary, Tab::Console];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Books => "Books",
            Tab::Summary => "Borrow Summary",
            Tab::Console => "Console",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Books => Tab::Summary,
            Tab::Summary => Tab::Console,
            Tab::Console => Tab::Books,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Books => Tab::Console,
            Tab::Summary => Tab::Books,
            Tab::Console => Tab::Summary,
        }
    }
}

/// A write the user started from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationAction {
    Add,
    Update { id: String },
    Delete { id: String },
    Borrow { id: String },
}

impl MutationAction {
    /// Toast text for a successful mutation, given the server's message.
    pub fn success_message(&self, server_message: String) -> String {
        match self {
            MutationAction::Add => "Book added successfully!".to_string(),
            MutationAction::Update { .. } => "Book edited successfully".to_string(),
            MutationAction::Delete { .. } if server_message.is_empty() => {
                "Book deleted".to_string()
            }
            MutationAction::Borrow { .. } if server_message.is_empty() => {
                "Book borrowed".to_string()
            }
            MutationAction::Delete { .. } | MutationAction::Borrow { .. } => server_message,
        }
    }

    /// Text shown when a mutation fails: the server's message if it sent one.
    pub fn failure_message(&self, error: &ShelfError) -> String {
        match error {
            ShelfError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            ShelfError::Validation(e) => e.to_string(),
            _ => self.fallback_message().to_string(),
        }
    }

    /// The by-id entry to refresh after success. Nothing invalidates `getBook`,
    /// and both edits and borrows change the book's fields.
    pub fn refreshes(&self) -> Option<Query> {
        match self {
            MutationAction::Update { id } | MutationAction::Borrow { id } => {
                Some(Query::Book { id: id.clone() })
            }
            MutationAction::Add | MutationAction::Delete { .. } => None,
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            MutationAction::Add => "Failed to add book.",
            MutationAction::Update { .. } => "Failed to update book.",
            MutationAction::Delete { .. } => "Failed to delete book.",
            MutationAction::Borrow { .. } => "Failed to borrow book.",
        }
    }
}

/// Messages from background tasks to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    /// A watched cache entry changed state.
    EntryChanged(CacheEntry),
    MutationFinished {
        action: MutationAction,
        result: std::result::Result<String, String>,
    },
}

/// Dialog drawn over the current view.
#[derive(Debug)]
pub enum Modal {
    Book(BookForm),
    Borrow(BorrowForm),
    ConfirmDelete { id: String, title: String },
}

/// Main application state.
pub struct App {
    pub library: Library,
    /// Currently active tab.
    pub active_tab: Tab,
    pub books: BooksTabState,
    pub console: ConsoleLog,
    pub toast: Option<Toast>,
    pub modal: Option<Modal>,
    pub show_help: bool,
    /// Whether the app should exit.
    pub should_quit: bool,
    summary_subscription: Option<Subscription>,
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    last_gc: Instant,
}

impl App {
    pub fn new(library: Library, page_size: u32, runtime: Handle) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            library,
            active_tab: Tab::default(),
            books: BooksTabState::new(page_size),
            console: ConsoleLog::new(),
            toast: None,
            modal: None,
            show_help: false,
            should_quit: false,
            summary_subscription: None,
            runtime,
            events_tx,
            events_rx,
            last_gc: Instant::now(),
        }
    }

    /// Main event loop. Must run on a thread that may block.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        self.enter_tab(self.active_tab);
        while !self.should_quit {
            self.drain_events();
            self.tick();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        self.leave_tab(self.active_tab);
        Ok(())
    }

    /// Current cache entry for `query`, if any.
    pub fn entry(&self, query: &Query) -> Option<CacheEntry> {
        self.library.cache().peek(query)
    }

    /// The book the next action applies to: the open details view, else the list selection.
    pub fn selected_book(&self) -> Option<Book> {
        if let Some(query) = self.books.detail_query() {
            return self.entry(&query).and_then(|e| e.book().cloned());
        }
        let entry = self.entry(&self.books.list_query())?;
        let index = self.books.selected()?;
        entry.books().and_then(|page| page.books.get(index).cloned())
    }

    /// Total pages of the current list, once known.
    pub fn total_pages(&self) -> Option<u32> {
        self.entry(&self.books.list_query())
            .and_then(|e| e.books().map(|page| page.total_pages))
    }

    fn tick(&mut self) {
        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
        if self.last_gc.elapsed() >= GC_INTERVAL {
            let evicted = self.library.cache().collect_garbage();
            if evicted > 0 {
                debug!(evicted, "collected unused cache entries");
            }
            self.last_gc = Instant::now();
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                AppEvent::EntryChanged(entry) => self.on_entry_changed(entry),
                AppEvent::MutationFinished { action, result } => {
                    self.on_mutation_finished(action, result)
                }
            }
        }
    }

    // Subscriptions and fetches

    /// Subscribe to `query` and start loading it.
    fn watch(&self, query: Query) -> Subscription {
        let tx = self.events_tx.clone();
        let subscription = self.library.cache().subscribe(query.clone(), move |entry| {
            let _ = tx.send(AppEvent::EntryChanged(entry.clone()));
        });
        self.fetch(query);
        subscription
    }

    fn release(&self, subscription: Option<Subscription>) {
        if let Some(subscription) = subscription {
            self.library.cache().unsubscribe(&subscription);
        }
    }

    fn fetch(&self, query: Query) {
        let cache = self.library.cache().clone();
        self.runtime.spawn(async move {
            cache.query(query).await;
        });
    }

    fn refetch(&self, query: Query) {
        let cache = self.library.cache().clone();
        self.runtime.spawn(async move {
            cache.refetch(query).await;
        });
    }

    fn enter_tab(&mut self, tab: Tab) {
        match tab {
            Tab::Books => {
                self.books.list_subscription = Some(self.watch(self.books.list_query()));
                if let Some(query) = self.books.detail_query() {
                    self.books.detail_subscription = Some(self.watch(query));
                }
            }
            Tab::Summary => {
                self.summary_subscription = Some(self.watch(Query::BorrowSummary));
            }
            Tab::Console => self.console.mark_read(),
        }
    }

    fn leave_tab(&mut self, tab: Tab) {
        match tab {
            Tab::Books => {
                let list = self.books.list_subscription.take();
                let detail = self.books.detail_subscription.take();
                self.release(list);
                self.release(detail);
            }
            Tab::Summary => {
                let summary = self.summary_subscription.take();
                self.release(summary);
            }
            Tab::Console => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.active_tab {
            return;
        }
        self.leave_tab(self.active_tab);
        self.active_tab = tab;
        self.enter_tab(tab);
    }

    /// Move the list subscription to the current page.
    fn resubscribe_list(&mut self) {
        let previous = self.books.list_subscription.take();
        self.release(previous);
        self.books.list_subscription = Some(self.watch(self.books.list_query()));
    }

    fn open_details(&mut self, book: &Book) {
        self.books.nav.push(ViewLevel::Details {
            id: book.id.clone(),
            title: book.title.clone(),
        });
        let query = Query::Book {
            id: book.id.clone(),
        };
        self.books.detail_subscription = Some(self.watch(query));
    }

    fn close_details(&mut self) {
        if self.books.nav.pop() {
            let detail = self.books.detail_subscription.take();
            self.release(detail);
        }
    }

    fn on_entry_changed(&mut self, entry: CacheEntry) {
        match entry.status {
            EntryStatus::Error => {
                let message = entry.error_message().unwrap_or_default();
                self.console
                    .log_warn(format!("{} failed: {}", entry.query, message));
            }
            EntryStatus::Success if entry.query == self.books.list_query() => {
                if let Some(page) = entry.books() {
                    // Deleting the last book on the last page leaves us past the end.
                    if page.is_empty() && self.books.page > page.total_pages.max(1) {
                        self.books.page = page.total_pages.max(1);
                        self.books.list_state.select(Some(0));
                        self.resubscribe_list();
                        return;
                    }
                    self.books.clamp_selection(page.len());
                }
            }
            _ => {}
        }
    }

    // Mutations

    fn spawn_mutation<F>(&self, action: MutationAction, work: F)
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        info!(?action, "starting mutation");
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = work.await.map_err(|e| action.failure_message(&e));
            let _ = tx.send(AppEvent::MutationFinished { action, result });
        });
    }

    fn on_mutation_finished(
        &mut self,
        action: MutationAction,
        result: std::result::Result<String, String>,
    ) {
        match result {
            Ok(server_message) => {
                let message = action.success_message(server_message);
                self.modal = None;
                self.console.log_info(message.clone());
                self.toast = Some(Toast::success(message));

                if let Some(query) = action.refreshes() {
                    self.refetch(query);
                }
                if let MutationAction::Delete { id } = &action {
                    if self.books.nav.current().book_id() == Some(id.as_str()) {
                        self.close_details();
                    }
                }
            }
            Err(message) => {
                match &mut self.modal {
                    Some(Modal::Book(form)) => {
                        form.submitting = false;
                        form.error = Some(message.clone());
                    }
                    Some(Modal::Borrow(form)) => {
                        form.submitting = false;
                        form.error = Some(message.clone());
                    }
                    Some(Modal::ConfirmDelete { .. }) | None => {}
                }
                self.console.log_error(message.clone());
                if self.active_tab == Tab::Console {
                    self.console.mark_read();
                }
                self.toast = Some(Toast::error(message));
            }
        }
    }

    fn open_add(&mut self) {
        self.modal = Some(Modal::Book(BookForm::add()));
    }

    fn open_edit(&mut self) {
        if let Some(book) = self.selected_book() {
            self.modal = Some(Modal::Book(BookForm::edit(&book)));
        }
    }

    fn open_delete(&mut self) {
        if let Some(book) = self.selected_book() {
            self.modal = Some(Modal::ConfirmDelete {
                id: book.id,
                title: book.title,
            });
        }
    }

    fn open_borrow(&mut self) {
        let Some(book) = self.selected_book() else {
            return;
        };
        if book.is_available() {
            self.modal = Some(Modal::Borrow(BorrowForm::new(book)));
        } else {
            self.toast = Some(Toast::error("No copies available to borrow"));
        }
    }

    fn submit_book_form(&self, form: &mut BookForm) {
        let input = match form.submit() {
            Ok(input) => input,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        form.submitting = true;

        let library = self.library.clone();
        match form.mode.clone() {
            FormMode::Add => {
                self.spawn_mutation(MutationAction::Add, async move {
                    library.add_book(input).await
                });
            }
            FormMode::Edit { id } => {
                let action = MutationAction::Update { id: id.clone() };
                self.spawn_mutation(action, async move { library.update_book(&id, input).await });
            }
        }
    }

    fn submit_borrow_form(&self, form: &mut BorrowForm) {
        let (quantity, due_date) = match form.submit() {
            Ok(values) => values,
            Err(e) => {
                form.error = Some(e.to_string());
                return;
            }
        };
        form.submitting = true;

        let library = self.library.clone();
        let book = form.book.clone();
        let action = MutationAction::Borrow {
            id: book.id.clone(),
        };
        self.spawn_mutation(action, async move {
            library.borrow_book(&book, quantity, Some(due_date)).await
        });
    }

    fn confirm_delete(&self, id: String) {
        let library = self.library.clone();
        let action = MutationAction::Delete { id: id.clone() };
        self.spawn_mutation(action, async move { library.delete_book(&id).await });
    }

    // Input

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if let Some(modal) = self.modal.take() {
            self.modal = self.handle_modal_key(modal, key);
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab => self.switch_tab(self.active_tab.next()),
            KeyCode::BackTab => self.switch_tab(self.active_tab.prev()),
            _ => match self.active_tab {
                Tab::Books => self.handle_books_key(key),
                Tab::Summary => {
                    if key.code == KeyCode::Char('r') {
                        self.refetch(Query::BorrowSummary);
                    }
                }
                Tab::Console => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => self.console.select_prev(),
                    KeyCode::Down | KeyCode::Char('j') => self.console.select_next(),
                    _ => {}
                },
            },
        }
    }

    fn handle_books_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('a') => self.open_add(),
            KeyCode::Char('e') => self.open_edit(),
            KeyCode::Char('d') => self.open_delete(),
            KeyCode::Char('b') => self.open_borrow(),
            _ if self.books.in_details() => match key.code {
                KeyCode::Esc | KeyCode::Backspace => self.close_details(),
                KeyCode::Char('r') => {
                    if let Some(query) = self.books.detail_query() {
                        self.refetch(query);
                    }
                }
                _ => {}
            },
            _ => self.handle_list_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let len = self
            .entry(&self.books.list_query())
            .and_then(|e| e.books().map(|page| page.len()))
            .unwrap_or(0);

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.books.select_prev(len),
            KeyCode::Down | KeyCode::Char('j') => self.books.select_next(len),
            KeyCode::Char('n') | KeyCode::Right => {
                let total = self.total_pages().unwrap_or(1);
                if self.books.next_page(total) {
                    self.resubscribe_list();
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.books.prev_page() {
                    self.resubscribe_list();
                }
            }
            KeyCode::Enter => {
                if let Some(book) = self.selected_book() {
                    self.open_details(&book);
                }
            }
            KeyCode::Char('r') => self.refetch(self.books.list_query()),
            _ => {}
        }
    }

    /// Returns the modal to keep open, if any.
    fn handle_modal_key(&mut self, modal: Modal, key: KeyEvent) -> Option<Modal> {
        match modal {
            Modal::Book(mut form) => {
                if form.submitting {
                    return Some(Modal::Book(form));
                }
                match key.code {
                    KeyCode::Esc => return None,
                    KeyCode::Enter => self.submit_book_form(&mut form),
                    KeyCode::Tab | KeyCode::Down => form.focus_next(),
                    KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
                    KeyCode::Left => form.cycle_genre(false),
                    KeyCode::Right => form.cycle_genre(true),
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Char(c) => form.input(c),
                    _ => {}
                }
                Some(Modal::Book(form))
            }
            Modal::Borrow(mut form) => {
                if form.submitting {
                    return Some(Modal::Borrow(form));
                }
                match key.code {
                    KeyCode::Esc => return None,
                    KeyCode::Enter => self.submit_borrow_form(&mut form),
                    KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                        form.toggle_focus()
                    }
                    KeyCode::Backspace => form.backspace(),
                    KeyCode::Char(c) => form.input(c),
                    _ => {}
                }
                Some(Modal::Borrow(form))
            }
            Modal::ConfirmDelete { id, title } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.confirm_delete(id);
                    None
                }
                KeyCode::Char('n') | KeyCode::Esc => None,
                _ => Some(Modal::ConfirmDelete { id, title }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::cache::QueryCache;
    use crate::validate::ValidationError;
    use std::sync::Arc;

    fn offline_app() -> App {
        let client = ApiClient::new("http://127.0.0.1:1/api/").unwrap();
        let library = Library::new(QueryCache::new(Arc::new(client)));
        App::new(library, 10, Handle::current())
    }

    #[tokio::test]
    async fn test_switching_tabs_moves_subscriptions() {
        let mut app = offline_app();
        let cache = app.library.cache().clone();
        let list = app.books.list_query();

        app.enter_tab(Tab::Books);
        assert_eq!(cache.subscriber_count(&list), 1);

        app.switch_tab(Tab::Summary);
        assert_eq!(cache.subscriber_count(&list), 0);
        assert_eq!(cache.subscriber_count(&Query::BorrowSummary), 1);

        app.switch_tab(Tab::Console);
        assert_eq!(cache.subscriber_count(&Query::BorrowSummary), 0);

        app.switch_tab(Tab::Books);
        app.books.page = 2;
        app.resubscribe_list();
        assert_eq!(cache.subscriber_count(&list), 0);
        assert_eq!(cache.subscriber_count(&app.books.list_query()), 1);
    }

    #[test]
    fn test_tab_cycle() {
        assert_eq!(Tab::Books.next(), Tab::Summary);
        assert_eq!(Tab::Console.next(), Tab::Books);
        assert_eq!(Tab::Books.prev(), Tab::Console);
        assert_eq!(Tab::Summary.title(), "Borrow Summary");
    }

    #[test]
    fn test_success_messages() {
        assert_eq!(
            MutationAction::Add.success_message("Book created".into()),
            "Book added successfully!"
        );
        assert_eq!(
            MutationAction::Update { id: "b1".into() }.success_message(String::new()),
            "Book edited successfully"
        );
        assert_eq!(
            MutationAction::Borrow { id: "b1".into() }
                .success_message("Book borrowed successfully".into()),
            "Book borrowed successfully"
        );
    }

    #[test]
    fn test_edits_and_borrows_refresh_the_book() {
        let book = Query::Book { id: "b1".into() };
        assert_eq!(
            MutationAction::Borrow { id: "b1".into() }.refreshes(),
            Some(book.clone())
        );
        assert_eq!(MutationAction::Update { id: "b1".into() }.refreshes(), Some(book));
        assert_eq!(MutationAction::Add.refreshes(), None);
        assert_eq!(MutationAction::Delete { id: "b1".into() }.refreshes(), None);
    }

    #[test]
    fn test_failure_prefers_server_message() {
        let borrow = MutationAction::Borrow { id: "b1".into() };
        assert_eq!(
            borrow.failure_message(&ShelfError::api(Some(400), "Not enough copies available")),
            "Not enough copies available"
        );
        assert_eq!(
            borrow.failure_message(&ShelfError::api(Some(500), "")),
            "Failed to borrow book."
        );
        assert_eq!(
            borrow.failure_message(&ShelfError::Other("connection reset".into())),
            "Failed to borrow book."
        );
        assert_eq!(
            borrow.failure_message(&ShelfError::Validation(ValidationError::MissingDueDate)),
            "Please select a due date."
        );
    }
}
