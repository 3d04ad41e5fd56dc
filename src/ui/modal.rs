// Modal UI components.
// Book editor, borrow dialog, and delete confirmation drawn over the current view.

use ratatui::{prelude::*, widgets::*};

use crate::state::{BookField, BookForm, BorrowField, BorrowForm};

/// Centered rectangle of at most `width` x `height`, cleared for drawing.
fn modal_area(frame: &mut Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;

    let modal_area = Rect::new(x, y, width, height);
    frame.render_widget(Clear, modal_area);
    modal_area
}

fn modal_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", title))
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
}

/// A labelled input row; the focused row gets a cursor.
fn field_line(label: &str, value: String, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(format!("{:<13}", format!("{}:", label)), label_style),
        Span::raw(value),
    ];
    if focused {
        spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
    }
    Line::from(spans)
}

fn status_line(error: Option<&str>, submitting: bool) -> Line<'static> {
    if submitting {
        Line::from(Span::styled(
            "⏳ Saving...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = error {
        Line::from(Span::styled(
            format!("❌ {}", error),
            Style::default().fg(Color::Red),
        ))
    } else {
        Line::from("")
    }
}

fn hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Yellow)),
        Span::styled(action, Style::default().fg(Color::DarkGray)),
    ]
}

/// Draw the add/edit book form.
pub fn draw_book_form(frame: &mut Frame, form: &BookForm) {
    let area = modal_area(frame, 70, 16);

    let mut lines: Vec<Line> = BookField::ALL
        .iter()
        .map(|field| field_line(field.label(), form.value(*field), form.focus == *field))
        .collect();
    lines.push(Line::from(""));
    lines.push(status_line(form.error.as_deref(), form.submitting));
    lines.push(Line::from(""));

    let mut instructions = Vec::new();
    instructions.extend(hint(" Enter", " = Save  "));
    instructions.extend(hint("Tab/↑↓", " = Field  "));
    instructions.extend(hint("←→", " = Genre  "));
    instructions.extend(hint("Space", " = Toggle  "));
    instructions.extend(hint("Esc", " = Cancel "));
    lines.push(Line::from(instructions));

    let paragraph = Paragraph::new(lines).block(modal_block(form.heading()));
    frame.render_widget(paragraph, area);
}

/// Draw the borrow dialog.
pub fn draw_borrow_form(frame: &mut Frame, form: &BorrowForm) {
    let area = modal_area(frame, 60, 11);

    let mut instructions = Vec::new();
    instructions.extend(hint(" Enter", " = Borrow  "));
    instructions.extend(hint("Tab", " = Field  "));
    instructions.extend(hint("Esc", " = Cancel "));

    let lines = vec![
        Line::from(vec![
            Span::styled(
                form.book.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  ({} copies available)", form.book.copies),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(""),
        field_line(
            "Quantity",
            form.quantity.clone(),
            form.focus == BorrowField::Quantity,
        ),
        field_line(
            "Due Date",
            form.due_date.clone(),
            form.focus == BorrowField::DueDate,
        ),
        Line::from(Span::styled(
            "             YYYY-MM-DD",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        status_line(form.error.as_deref(), form.submitting),
        Line::from(instructions),
    ];

    let paragraph = Paragraph::new(lines).block(modal_block("Borrow Book"));
    frame.render_widget(paragraph, area);
}

/// Draw the delete confirmation.
pub fn draw_confirm_delete(frame: &mut Frame, title: &str) {
    let area = modal_area(frame, 50, 7);

    let mut instructions = Vec::new();
    instructions.extend(hint("y", " = Delete  "));
    instructions.extend(hint("n/Esc", " = Cancel"));

    let lines = vec![
        Line::from("Delete this book?"),
        Line::from(Span::styled(
            title.to_string(),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(instructions),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(modal_block("Confirm Delete"));
    frame.render_widget(paragraph, area);
}
