//! Stream handler — serves file bytes with range support.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, header};
use axum::response::Response;

use chandrive_core::error::AppError;

use crate::dto::request::StreamQuery;
use crate::state::AppState;

/// GET|HEAD /api/files/{file_id}/stream
///
/// Authentication is by the `hash` query parameter, not the bearer
/// token: stream URLs are handed to media players that cannot set
/// headers.
pub async fn stream_file(
    State(state): State<AppState>,
    method: Method,
    Path(file_id): Path<String>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());
    let attachment = query.d.as_deref() == Some("1");
    let head = method == Method::HEAD;

    let prepared = state
        .download_engine
        .stream(&file_id, query.hash.as_deref(), range, attachment, head)
        .await?;
    let plan = prepared.plan;

    let mut builder = Response::builder()
        .status(plan.status)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, plan.content_type)
        .header(header::CONTENT_LENGTH, plan.content_length)
        .header(header::ETAG, plan.etag)
        .header(header::LAST_MODIFIED, plan.last_modified)
        .header(header::CONTENT_DISPOSITION, plan.disposition);

    if let Some(content_range) = plan.content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    let body = match prepared.body {
        Some(stream) => Body::from_stream(stream),
        None => Body::empty(),
    };

    builder
        .body(body)
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))
}
