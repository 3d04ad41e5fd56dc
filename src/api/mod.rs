// Library API module.
// Provides the HTTP client, transport seam, endpoint declarations, and wire types.

pub mod client;
pub mod endpoints;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use endpoints::{Mutation, Query, QueryData};
pub use transport::{ApiRequest, Method, Transport};
pub use types::*;
