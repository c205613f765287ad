// ABOUTME: GET /api/stream: read-only view of the configured stream's name, length, and backend.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::app_state::SharedState;
use crate::error::IngestError;

#[derive(Debug, Serialize)]
pub struct StreamInfo {
    pub stream: String,
    pub length: u64,
    pub backend: &'static str,
}

/// GET /api/stream - Report how many entries the stream holds.
pub async fn stream_info(State(state): State<SharedState>) -> Result<Json<StreamInfo>, IngestError> {
    let length = state.bounded(state.store.len(&state.stream)).await?;

    Ok(Json(StreamInfo {
        stream: state.stream.to_string(),
        length,
        backend: state.store.backend(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::StatusCode;
    use hookstream_core::testing::UnavailableLog;
    use hookstream_core::{LogStore, SharedStore, StreamName};
    use hookstream_store::MemoryLog;
    use http::Request;
    use tower::ServiceExt;

    use crate::app_state::AppState;
    use crate::routes::create_router;

    #[tokio::test]
    async fn stream_info_reports_length() {
        let log = Arc::new(MemoryLog::new());
        let stream = StreamName::default();
        log.append(&stream, &[("data".to_string(), b"{}".to_vec())])
            .await
            .unwrap();
        let store: SharedStore = log;
        let app = create_router(Arc::new(AppState::new(store)));

        let resp = app
            .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["stream"], "hooks");
        assert_eq!(json["length"], 1);
        assert_eq!(json["backend"], "memory");
    }

    #[tokio::test]
    async fn stream_info_fails_when_store_is_down() {
        let store: SharedStore = Arc::new(UnavailableLog::new());
        let app = create_router(Arc::new(AppState::new(store)));

        let resp = app
            .oneshot(Request::get("/api/stream").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
