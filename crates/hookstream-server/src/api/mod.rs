// ABOUTME: API module containing the HTTP handlers under /api.
// ABOUTME: `send` appends records; `stream` reports on the stream without modifying it.

pub mod send;
pub mod stream;
