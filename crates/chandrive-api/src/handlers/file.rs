//! File metadata handlers: create, read, list, update, and the
//! path operations backed by stored procedures.

use axum::Json;
use axum::extract::{Path, Query, State};

use chandrive_cache::keys;
use chandrive_core::error::AppError;
use chandrive_database::repositories::file::{
    ListFilesQuery, ListOp, UpdateFileChanges, encode_page_token,
};
use chandrive_entity::file::{CreateFile, File};

use crate::dto::request::{
    CopyFileRequest, CreateFileRequest, DeleteFilesRequest, ListFilesParams, MkDirRequest,
    MoveDirRequest, MoveFilesRequest, UpdateFileRequest,
};
use crate::dto::response::{FileListResponse, MessageResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/files
pub async fn create_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<File>, AppError> {
    let path = req.path.trim().to_string();

    let parent_id = if path.is_empty() {
        None
    } else {
        let parent = state
            .file_repo
            .find_folder_by_path(&path)
            .await?
            .ok_or_else(|| AppError::not_found("parent directory not found"))?;
        Some(parent.id)
    };

    let record = match req.kind.as_str() {
        "folder" => {
            let full_path = if path == "/" {
                format!("/{}", req.name)
            } else {
                format!("{path}/{}", req.name)
            };
            let depth = full_path.split('/').count() as i32 - 1;
            CreateFile {
                name: req.name,
                kind: req.kind,
                path: Some(full_path),
                depth: Some(depth),
                parent_id,
                size: None,
                mime_type: Some("drive/folder".to_string()),
                channel_id: None,
                parts: None,
                user_id: auth.user_id,
            }
        }
        "file" => {
            let channel_id = if req.channel_id == 0 {
                state.channel_repo.default_channel(auth.user_id).await?
            } else {
                req.channel_id
            };
            CreateFile {
                name: req.name,
                kind: req.kind,
                path: None,
                depth: None,
                parent_id,
                size: req.size,
                mime_type: req.mime_type,
                channel_id: Some(channel_id),
                parts: req.parts,
                user_id: auth.user_id,
            }
        }
        other => {
            return Err(AppError::validation(format!("unknown file type '{other}'")));
        }
    };

    let file = state.file_repo.create(&record).await?;
    Ok(Json(file))
}

/// GET /api/files/{file_id}
pub async fn get_file(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(file_id): Path<String>,
) -> Result<Json<File>, AppError> {
    let file = state
        .file_repo
        .find_by_id(&file_id)
        .await?
        .ok_or_else(|| AppError::not_found("file not found"))?;
    Ok(Json(file))
}

/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListFilesParams>,
) -> Result<Json<FileListResponse>, AppError> {
    let op = match params.op.as_str() {
        "find" => ListOp::Find,
        "search" => ListOp::Search,
        _ => ListOp::List,
    };

    let query = ListFilesQuery {
        op,
        path: params.path,
        name: params.name,
        starred: params.starred,
        search: params.search,
        per_page: params.per_page,
        next_page_token: params.next_page_token,
        sort: params.sort.clone(),
        order: params.order,
    };

    let results = state.file_repo.list(auth.user_id, &query).await?;

    // Keyset pagination: a full page carries a token from its last row.
    let next_page_token = if !results.is_empty() && results.len() as i64 == query.per_page {
        let last = &results[results.len() - 1];
        let value = match params.sort.as_str() {
            "size" => last.size.unwrap_or(0).to_string(),
            "updated_at" => last.updated_at.to_rfc3339(),
            _ => last.name.clone(),
        };
        encode_page_token(&value)
    } else {
        String::new()
    };

    Ok(Json(FileListResponse {
        results,
        next_page_token,
    }))
}

/// PATCH /api/files/{file_id}
pub async fn update_file(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(file_id): Path<String>,
    Json(req): Json<UpdateFileRequest>,
) -> Result<Json<File>, AppError> {
    let file = match (&req.kind, &req.name) {
        (Some(kind), Some(name)) if kind == "folder" => {
            state.file_repo.update_folder(&file_id, name).await?
        }
        _ => {
            state
                .file_repo
                .update(
                    &file_id,
                    &UpdateFileChanges {
                        name: req.name,
                        parent_id: req.parent_id,
                        starred: req.starred,
                        status: None,
                    },
                )
                .await?
        }
    };

    state.cache.delete(&keys::file_by_id(&file_id)).await?;
    Ok(Json(file))
}

/// POST /api/files/mkdir
pub async fn make_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<MkDirRequest>,
) -> Result<Json<File>, AppError> {
    let folder = state
        .file_repo
        .create_directories(auth.user_id, &req.path)
        .await?;
    Ok(Json(folder))
}

/// POST /api/files/copy
pub async fn copy_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CopyFileRequest>,
) -> Result<Json<File>, AppError> {
    let file = state
        .copy_engine
        .copy(
            &auth.0,
            chandrive_engine::copy::CopyParams {
                id: req.id,
                destination: req.destination,
                name: req.name,
            },
        )
        .await?;
    Ok(Json(file))
}

/// POST /api/files/move
pub async fn move_files(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<MoveFilesRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let destination = state
        .file_repo
        .find_folder_by_path(&req.destination)
        .await?
        .ok_or_else(|| AppError::not_found("destination not found"))?;

    state.file_repo.move_files(&req.files, &destination.id).await?;
    Ok(Json(MessageResponse::ok("files moved")))
}

/// POST /api/files/delete
pub async fn delete_files(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<DeleteFilesRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state.file_repo.delete_files(&req.files).await?;
    Ok(Json(MessageResponse::ok("files deleted")))
}

/// POST /api/files/directories/move
pub async fn move_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<MoveDirRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .file_repo
        .move_directory(&req.source, &req.destination, auth.user_id)
        .await?;
    Ok(Json(MessageResponse::ok("directory moved")))
}
