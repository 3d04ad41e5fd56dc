// Console tab state and status-bar notifications.
// Keeps a timestamped activity log of mutations and query failures.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use ratatui::widgets::ListState;

/// How long a toast stays in the status bar.
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Oldest messages are dropped past this many.
const MAX_MESSAGES: usize = 500;

/// Console message level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Info,
    Warn,
    Error,
}

/// A console message for the activity log.
#[derive(Debug, Clone)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ConsoleMessage {
    fn new(level: ConsoleLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Error, message)
    }
}

/// Activity log shown in the Console tab.
#[derive(Debug, Default)]
pub struct ConsoleLog {
    pub messages: Vec<ConsoleMessage>,
    pub list_state: ListState,
    /// Errors logged since the Console tab was last viewed.
    pub unread_errors: usize,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::info(message));
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.push(ConsoleMessage::warn(message));
    }

    pub fn log_error(&mut self, message: impl Into<String>) {
        self.unread_errors += 1;
        self.push(ConsoleMessage::error(message));
    }

    fn push(&mut self, message: ConsoleMessage) {
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            let excess = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(..excess);
        }
        self.scroll_to_bottom();
    }

    /// Clear the unread badge.
    pub fn mark_read(&mut self) {
        self.unread_errors = 0;
    }

    fn scroll_to_bottom(&mut self) {
        if !self.messages.is_empty() {
            self.list_state.select(Some(self.messages.len() - 1));
        }
    }

    pub fn select_prev(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => self.messages.len() - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_next(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.messages.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }
}

/// Transient notification shown in the status bar.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ConsoleLevel,
    shown_at: Instant,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ConsoleLevel::Info,
            shown_at: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: ConsoleLevel::Error,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= TOAST_DURATION
    }
}
