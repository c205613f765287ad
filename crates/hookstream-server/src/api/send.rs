// ABOUTME: POST /api/send: append a JSON object body to the stream exactly once, byte for byte.
// ABOUTME: Rejected bodies never reach the store; store failures and timeouts are surfaced, not retried.

use axum::Json;
use axum::extract::State;
use hookstream_core::Record;
use serde_json::Value;

use crate::app_state::SharedState;
use crate::error::IngestError;
use crate::extract::JsonObjectBody;

/// Acknowledgement text returned once the store has accepted the append.
pub const SENT_STATUS: &str = "sent to stream";

/// POST /api/send - Append the request body to the configured stream.
pub async fn send(
    State(state): State<SharedState>,
    JsonObjectBody(body): JsonObjectBody,
) -> Result<Json<Value>, IngestError> {
    let record = Record::from_bytes(body.to_vec());
    let fields = [(state.field.clone(), record.into_bytes())];

    let id = state
        .bounded(state.store.append(&state.stream, &fields))
        .await?;

    tracing::debug!(stream = %state.stream, id = %id, "appended record");

    Ok(Json(serde_json::json!({ "status": SENT_STATUS, "id": id })))
}
