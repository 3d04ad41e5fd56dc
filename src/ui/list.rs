// List and table rendering for cached queries.
// Provides styled views with loading, error, and empty states.

use chrono::{DateTime, Utc};
use ratatui::{prelude::*, widgets::*};

use crate::api::Book;
use crate::cache::{CacheEntry, EntryStatus};

/// Format a timestamp as relative time (e.g., "2h ago").
pub fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(*dt);

    if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}

/// Render a loading indicator.
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(format!("⏳ {}...", message))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(text, area);
}

/// Render an error message.
pub fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let text = Paragraph::new(format!("❌ {}", error))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Red));
    frame.render_widget(text, area);
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(text, area);
}

/// What to show for an entry that has no data yet.
/// Returns true if a placeholder was drawn.
fn render_placeholder(
    frame: &mut Frame,
    entry: Option<&CacheEntry>,
    area: Rect,
    loading: &str,
    failed: &str,
) -> bool {
    let Some(entry) = entry else {
        render_loading(frame, area, loading);
        return true;
    };
    if entry.data.is_some() {
        return false;
    }
    match entry.status {
        EntryStatus::Error => {
            let detail = entry.error_message().unwrap_or_default();
            render_error(frame, area, &format!("{} {}", failed, detail));
        }
        _ => render_loading(frame, area, loading),
    }
    true
}

/// Block title suffix while a refetch of already-shown data is running.
fn refresh_marker(entry: &CacheEntry) -> &'static str {
    if entry.is_loading() {
        " ⟳"
    } else if entry.is_error() {
        " ⚠"
    } else {
        ""
    }
}

fn availability(book: &Book) -> Span<'static> {
    if book.is_available() {
        Span::styled("available", Style::default().fg(Color::Green))
    } else {
        Span::styled("unavailable", Style::default().fg(Color::Red))
    }
}

/// Render one page of books.
pub fn render_books_list(
    frame: &mut Frame,
    entry: Option<&CacheEntry>,
    list_state: &mut ListState,
    page: u32,
    area: Rect,
) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    if render_placeholder(frame, entry, inner, "Loading books", "Failed to load books.") {
        frame.render_widget(block.title(" Books "), area);
        return;
    }
    let Some((entry, books)) = entry.and_then(|e| e.books().map(|p| (e, p))) else {
        return;
    };

    let title = format!(
        " Books [page {}/{}]{} ",
        page,
        books.total_pages.max(1),
        refresh_marker(entry)
    );
    let block = block.title(title);

    if books.is_empty() {
        frame.render_widget(block, area);
        render_empty(frame, inner, "No books found. Press 'a' to add one.");
        return;
    }

    let items: Vec<ListItem> = books
        .books
        .iter()
        .map(|book| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    book.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  by {}", book.author),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    format!("  {}", book.genre),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(
                    format!("  {} copies  ", book.copies),
                    Style::default().fg(Color::DarkGray),
                ),
                availability(book),
            ]))
        })
        .collect();

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list_widget, area, list_state);
}

/// Render the full record of one book.
pub fn render_book_details(frame: &mut Frame, entry: Option<&CacheEntry>, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    if render_placeholder(frame, entry, inner, "Loading book", "Failed to load book details.") {
        frame.render_widget(block.title(" Details "), area);
        return;
    }
    let Some((entry, book)) = entry.and_then(|e| e.book().map(|b| (e, b))) else {
        return;
    };

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let timestamp = |ts: Option<DateTime<Utc>>| {
        ts.map(|ts| format!("{} ({})", ts.format("%Y-%m-%d %H:%M"), format_relative_time(&ts)))
            .unwrap_or_else(|| "-".to_string())
    };

    let lines = vec![
        Line::from(Span::styled(
            book.title.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![label("Author:      "), Span::raw(book.author.clone())]),
        Line::from(vec![label("Genre:       "), Span::raw(book.genre.to_string())]),
        Line::from(vec![label("ISBN:        "), Span::raw(book.isbn.clone())]),
        Line::from(vec![label("Copies:      "), Span::raw(book.copies.to_string())]),
        Line::from(vec![label("Available:   "), availability(book)]),
        Line::from(vec![label("Created:     "), Span::raw(timestamp(book.created_at))]),
        Line::from(vec![label("Updated:     "), Span::raw(timestamp(book.updated_at))]),
        Line::from(""),
        Line::from(label("Description")),
        Line::from(book.description.clone()),
    ];

    let block = block.title(format!(" Details{} ", refresh_marker(entry)));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Render the borrow summary table.
pub fn render_borrow_summary(frame: &mut Frame, entry: Option<&CacheEntry>, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);

    if render_placeholder(
        frame,
        entry,
        inner,
        "Loading borrow summary",
        "Failed to load borrow summary.",
    ) {
        frame.render_widget(block.title(" Borrow Summary "), area);
        return;
    }
    let Some((entry, items)) = entry.and_then(|e| e.borrow_summary().map(|s| (e, s))) else {
        return;
    };

    let block = block.title(format!(" Borrow Summary{} ", refresh_marker(entry)));
    if items.is_empty() {
        frame.render_widget(block, area);
        render_empty(frame, inner, "No books have been borrowed yet");
        return;
    }

    let header = Row::new(vec!["Title", "ISBN", "Total Quantity"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            Row::new(vec![
                Cell::from(item.book.title.clone()),
                Cell::from(item.book.isbn.clone()).style(Style::default().fg(Color::Gray)),
                Cell::from(item.total_quantity.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, area);
}
