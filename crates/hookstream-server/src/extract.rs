// ABOUTME: Request extractor for ingestion bodies: a JSON object kept as the exact bytes received.
// ABOUTME: Checks content type and shape without re-encoding, so key order and number text survive.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, StatusCode, header};
use serde_json::value::RawValue;

use crate::error::IngestError;

/// A request body verified to be one JSON object, holding the original bytes.
#[derive(Debug)]
pub struct JsonObjectBody(pub Bytes);

impl<S> FromRequest<S> for JsonObjectBody
where
    S: Send + Sync,
{
    type Rejection = IngestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            return Err(IngestError::rejected(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "expected request with `Content-Type: application/json`",
            ));
        }

        let body = Bytes::from_request(req, state).await?;
        check_json_object(&body)?;
        Ok(Self(body))
    }
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.split_once('/') {
        Some(("application", subtype)) => subtype == "json" || subtype.ends_with("+json"),
        _ => false,
    }
}

fn check_json_object(body: &[u8]) -> Result<(), IngestError> {
    let raw: &RawValue = serde_json::from_slice(body).map_err(|e| {
        IngestError::rejected(
            StatusCode::BAD_REQUEST,
            format!("failed to parse the request body as JSON: {e}"),
        )
    })?;

    if !raw.get().starts_with('{') {
        return Err(IngestError::rejected(
            StatusCode::BAD_REQUEST,
            "request body must be a JSON object",
        ));
    }
    Ok(())
}
