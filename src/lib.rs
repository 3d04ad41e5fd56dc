// shelf: terminal client for a library catalog.
// A tag-invalidated query cache over the library REST API, with a ratatui front end.

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod paths;
pub mod state;
pub mod ui;
pub mod validate;

pub use error::{Result, ShelfError};
