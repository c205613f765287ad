// ABOUTME: HTTP server for hookstream: a JSON ingestion endpoint in front of an ordered log.
// ABOUTME: Uses Axum with an injected LogStore handle shared across all requests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ConfigError, ServerConfig};
pub use error::IngestError;
pub use extract::JsonObjectBody;
pub use routes::create_router;
