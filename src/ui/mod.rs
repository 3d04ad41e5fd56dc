// UI module for rendering the TUI.
// Contains widgets for the header, book lists, modals, and the console.

mod header;
mod list;
mod modal;

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, Modal, Tab};
use crate::api::Query;
use crate::state::{ConsoleLevel, ViewLevel};

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Length(2), // Location
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    header::draw_tab_bar(frame, app, chunks[0]);
    header::draw_location(frame, app, chunks[1]);

    draw_content(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    match &app.modal {
        Some(Modal::Book(form)) => modal::draw_book_form(frame, form),
        Some(Modal::Borrow(form)) => modal::draw_borrow_form(frame, form),
        Some(Modal::ConfirmDelete { title, .. }) => modal::draw_confirm_delete(frame, title),
        None => {}
    }

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the main content area based on active tab.
fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.active_tab {
        Tab::Books => draw_books_tab(frame, app, area),
        Tab::Summary => {
            let entry = app.entry(&Query::BorrowSummary);
            list::render_borrow_summary(frame, entry.as_ref(), area);
        }
        Tab::Console => draw_console_tab(frame, app, area),
    }
}

fn draw_books_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    match app.books.nav.current().clone() {
        ViewLevel::Books => {
            let entry = app.entry(&app.books.list_query());
            let page = app.books.page;
            list::render_books_list(frame, entry.as_ref(), &mut app.books.list_state, page, area);
        }
        ViewLevel::Details { id, .. } => {
            let entry = app.entry(&Query::Book { id });
            list::render_book_details(frame, entry.as_ref(), area);
        }
    }
}

/// Draw the Console tab with the activity log.
fn draw_console_tab(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Console ");

    if app.console.messages.is_empty() {
        let text = Paragraph::new("No messages")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(text, area);
        return;
    }

    let items: Vec<ListItem> = app
        .console
        .messages
        .iter()
        .map(|msg| {
            let (icon, color) = level_style(msg.level);
            let time = msg
                .timestamp
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
                .to_string();

            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", icon)),
                Span::styled(time, Style::default().fg(Color::DarkGray)),
                Span::raw(" "),
                Span::styled(msg.message.clone(), Style::default().fg(color)),
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

    frame.render_stateful_widget(list_widget, area, &mut app.console.list_state);
}

fn level_style(level: ConsoleLevel) -> (&'static str, Color) {
    match level {
        ConsoleLevel::Error => ("❌", Color::Red),
        ConsoleLevel::Warn => ("⚠️", Color::Yellow),
        ConsoleLevel::Info => ("ℹ️", Color::Cyan),
    }
}

/// Draw the status bar with keybinding hints, or the current toast.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(toast) = &app.toast {
        let color = match toast.level {
            ConsoleLevel::Info => Color::Green,
            ConsoleLevel::Warn => Color::Yellow,
            ConsoleLevel::Error => Color::Red,
        };
        let line = Line::from(Span::styled(
            format!(" {} ", toast.message),
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let key = |k: &'static str| Span::raw(k);
    let action = |a: &'static str| Span::styled(a, Style::default().fg(Color::DarkGray));

    let mut hints = match app.active_tab {
        Tab::Books if app.books.in_details() => vec![
            key(" e "),
            action("Edit"),
            key("  d "),
            action("Delete"),
            key("  b "),
            action("Borrow"),
            key("  Esc "),
            action("Back"),
        ],
        Tab::Books => vec![
            key(" ↑↓ "),
            action("Navigate"),
            key("  ↵ "),
            action("Details"),
            key("  n/p "),
            action("Page"),
            key("  a "),
            action("Add"),
            key("  e "),
            action("Edit"),
            key("  d "),
            action("Delete"),
            key("  b "),
            action("Borrow"),
        ],
        Tab::Summary => vec![],
        Tab::Console => vec![key(" ↑↓ "), action("Scroll")],
    };
    hints.extend([
        key("  Tab "),
        action("Switch"),
        key("  r "),
        action("Refresh"),
        key("  ? "),
        action("Help"),
        key("  q "),
        action("Quit"),
    ]);

    let status = Paragraph::new(Line::from(hints));
    frame.render_widget(status, area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = area.width.min(55);
    let popup_height = area.height.min(26);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let shortcut = |keys: &'static str, description: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<14}", keys), Style::default().fg(Color::Cyan)),
            Span::raw(description),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        shortcut("↑/↓ or j/k", "Navigate list"),
        shortcut("n/p or →/←", "Next/previous page"),
        shortcut("Enter", "Open book details"),
        shortcut("Esc", "Go back / close dialog"),
        shortcut("Tab", "Switch tabs"),
        shortcut("a", "Add a book"),
        shortcut("e", "Edit selected book"),
        shortcut("d", "Delete selected book"),
        shortcut("b", "Borrow selected book"),
        shortcut("r", "Refresh current view"),
        shortcut("?", "Show/hide this help"),
        shortcut("q", "Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "In forms",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        shortcut("Tab/↑↓", "Move between fields"),
        shortcut("←/→", "Change genre"),
        shortcut("Space", "Toggle available"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
