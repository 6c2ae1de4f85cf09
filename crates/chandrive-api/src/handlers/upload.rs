//! Upload handlers.

use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::header;
use futures::TryStreamExt;

use chandrive_core::error::AppError;
use chandrive_core::traits::remote::ByteStream;
use chandrive_database::repositories::upload::InsertUploadPart;
use chandrive_engine::upload::UploadPartParams;
use chandrive_entity::upload::Upload;

use crate::dto::request::{CreateUploadPartRequest, UploadQuery};
use crate::dto::response::{MessageResponse, UploadPartsResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST|PUT /api/uploads/{id} — stream one part's bytes up.
pub async fn upload_part(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(upload_id): Path<String>,
    Query(query): Query<UploadQuery>,
    request: Request,
) -> Result<Json<Upload>, AppError> {
    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| AppError::bad_request("Content-Length required"))?;

    let body: ByteStream = Box::pin(
        request
            .into_body()
            .into_data_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
    );

    let upload = state
        .upload_engine
        .upload_part(
            &auth.0,
            &upload_id,
            UploadPartParams {
                file_name: query.file_name,
                part_no: query.part_no,
                total_parts: query.total_parts,
                channel_id: query.channel_id,
            },
            body,
            content_length,
        )
        .await?;

    Ok(Json(upload))
}

/// POST /api/uploads/{id}/parts — record a part committed out of band.
pub async fn create_upload_part(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(upload_id): Path<String>,
    Json(req): Json<CreateUploadPartRequest>,
) -> Result<Json<Upload>, AppError> {
    let upload = state
        .upload_repo
        .insert(&InsertUploadPart {
            upload_id,
            name: req.name,
            part_no: req.part_no,
            total_parts: req.total_parts,
            part_id: req.part_id,
            channel_id: req.channel_id,
            size: req.size,
            user_id: auth.user_id,
        })
        .await?;
    Ok(Json(upload))
}

/// GET /api/uploads/{id} — committed parts ordered by part number.
pub async fn list_upload_parts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(upload_id): Path<String>,
) -> Result<Json<UploadPartsResponse>, AppError> {
    let parts = state
        .upload_repo
        .parts(&upload_id, state.config.engine.upload_retention_days)
        .await?;
    Ok(Json(UploadPartsResponse { parts }))
}

/// DELETE /api/uploads/{id}
pub async fn delete_upload(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(upload_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.upload_repo.delete(&upload_id).await?;
    Ok(Json(MessageResponse::ok("upload deleted")))
}
