// Header rows: the tab bar and the location line under it.
// The location line pairs where you are with how current the shown data is.

use ratatui::{prelude::*, widgets::*};

use crate::api::Query;
use crate::app::{App, Tab};
use crate::cache::{CacheEntry, EntryStatus};

use super::list::format_relative_time;

/// Tab title, with the unread error count on the Console tab.
pub fn tab_label(tab: Tab, unread_errors: usize) -> String {
    match tab {
        Tab::Console if unread_errors > 0 => format!("{} ({})", tab.title(), unread_errors),
        _ => tab.title().to_string(),
    }
}

/// How current an entry's data is. `None` while nothing has been shown yet;
/// the content area covers that case.
pub fn freshness(entry: Option<&CacheEntry>) -> Option<(String, Color)> {
    let entry = entry?;
    match entry.status {
        EntryStatus::Loading if entry.data.is_some() => {
            Some(("refreshing...".to_string(), Color::Yellow))
        }
        EntryStatus::Error if entry.data.is_some() => {
            Some(("refresh failed, showing cached".to_string(), Color::Red))
        }
        EntryStatus::Success if entry.stale => Some(("out of date".to_string(), Color::Yellow)),
        EntryStatus::Success => entry
            .fulfilled_at
            .map(|at| (format!("updated {}", format_relative_time(&at)), Color::DarkGray)),
        EntryStatus::Uninitialized | EntryStatus::Loading | EntryStatus::Error => None,
    }
}

pub fn draw_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let unread = app.console.unread_errors;

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|&tab| {
            let style = match tab {
                _ if tab == app.active_tab => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                Tab::Console if unread > 0 => Style::default().fg(Color::Red),
                _ => Style::default().fg(Color::White),
            };
            Line::from(Span::styled(tab_label(tab, unread), style))
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|&tab| tab == app.active_tab)
        .unwrap_or(0);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" shelf ")
        .title_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));
    frame.render_widget(tabs, area);
}

/// Location trail on the left, freshness of the data on screen on the right.
pub fn draw_location(frame: &mut Frame, app: &App, area: Rect) {
    let separator = || Span::styled(" > ", Style::default().fg(Color::DarkGray));
    let current = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let (trail, shown): (Vec<Span>, Option<Query>) = match app.active_tab {
        Tab::Books => {
            let nodes = app.books.nav.breadcrumbs();
            let last = nodes.len().saturating_sub(1);
            let mut spans = Vec::new();
            for (i, node) in nodes.into_iter().enumerate() {
                if i > 0 {
                    spans.push(separator());
                }
                let style = if i == last {
                    current
                } else {
                    Style::default().fg(Color::White)
                };
                spans.push(Span::styled(node.label, style));
            }
            let shown = app
                .books
                .detail_query()
                .unwrap_or_else(|| app.books.list_query());
            (spans, Some(shown))
        }
        Tab::Summary => (
            vec![Span::styled("Borrowed books", current)],
            Some(Query::BorrowSummary),
        ),
        Tab::Console => (
            vec![Span::styled(
                format!("{} messages", app.console.messages.len()),
                current,
            )],
            None,
        ),
    };

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(trail)).block(block), area);

    let entry = shown.and_then(|query| app.entry(&query));
    if let Some((text, color)) = freshness(entry.as_ref()) {
        let status = Paragraph::new(Span::styled(text, Style::default().fg(color)))
            .alignment(Alignment::Right);
        frame.render_widget(status, Rect { height: 1, ..area });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::QueryData;

    #[test]
    fn test_console_label_shows_unread_errors() {
        assert_eq!(tab_label(Tab::Console, 0), "Console");
        assert_eq!(tab_label(Tab::Console, 3), "Console (3)");
        assert_eq!(tab_label(Tab::Books, 3), "Books");
    }

    #[test]
    fn test_freshness_tracks_entry_state() {
        let mut entry = CacheEntry::new(Query::BorrowSummary);
        assert!(freshness(Some(&entry)).is_none());

        entry.begin_fetch();
        assert!(freshness(Some(&entry)).is_none());

        entry.fulfill(QueryData::BorrowSummary(Vec::new()));
        assert_eq!(freshness(Some(&entry)).unwrap().0, "updated just now");

        entry.mark_stale();
        entry.begin_fetch();
        assert_eq!(freshness(Some(&entry)).unwrap().0, "refreshing...");

        entry.reject(crate::error::ShelfError::Other("offline".into()));
        assert_eq!(
            freshness(Some(&entry)),
            Some(("refresh failed, showing cached".to_string(), Color::Red))
        );
        assert!(freshness(None).is_none());
    }
}
