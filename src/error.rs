// Error types for shelf.
// Covers client-side validation, transport failures, and API envelope errors.

use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx status or an envelope with `success: false`.
    #[error("{message}")]
    Api { status: Option<u16>, message: String },

    #[error("Response did not include any data")]
    MissingData,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ShelfError {
    /// Build an API error from a server message.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        ShelfError::Api {
            status,
            message: message.into(),
        }
    }

    /// True for errors raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, ShelfError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
