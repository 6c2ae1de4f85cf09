//! Request DTOs.

use serde::{Deserialize, Serialize};

use chandrive_entity::file::Part;

/// Create file/folder request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRequest {
    /// Node name.
    pub name: String,
    /// Node kind: `"file"` or `"folder"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Parent folder path. Required for folders; for files it names the
    /// containing folder.
    #[serde(default)]
    pub path: String,
    /// MIME type, for files.
    pub mime_type: Option<String>,
    /// Size in bytes, for files.
    pub size: Option<i64>,
    /// Backing channel; zero or absent selects the default channel.
    #[serde(default)]
    pub channel_id: i64,
    /// Ordered part list snapshotted from the upload.
    pub parts: Option<Vec<Part>>,
}

/// Update file request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFileRequest {
    /// New name.
    pub name: Option<String>,
    /// Node kind hint; folder renames go through the path-rewriting
    /// procedure.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// New starred flag.
    pub starred: Option<bool>,
    /// New parent folder id.
    pub parent_id: Option<String>,
}

/// Copy request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyFileRequest {
    /// Source file id.
    pub id: String,
    /// Destination folder path.
    pub destination: String,
    /// Name of the copy.
    pub name: String,
}

/// Make-directory request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MkDirRequest {
    /// Absolute path to create.
    pub path: String,
}

/// Bulk move request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveFilesRequest {
    /// Ids of the files to move.
    pub files: Vec<String>,
    /// Destination folder path.
    pub destination: String,
}

/// Bulk delete request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFilesRequest {
    /// Ids of the files to delete.
    pub files: Vec<String>,
}

/// Directory move request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveDirRequest {
    /// Source folder path.
    pub source: String,
    /// Destination folder path.
    pub destination: String,
}

/// Record an externally committed upload part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUploadPartRequest {
    /// File name.
    pub name: String,
    /// Remote message id carrying the part.
    pub part_id: i64,
    /// Channel the part lives in.
    pub channel_id: i64,
    /// Part size in bytes.
    pub size: i64,
    /// 1-based part number.
    #[serde(default = "default_part_no")]
    pub part_no: i32,
    /// Total parts of the upload.
    #[serde(default = "default_part_no")]
    pub total_parts: i32,
}

/// Query parameters of the upload-part operation.
///
/// Wire names are camelCase (`fileName`, `partNo`, ...) for client
/// compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    /// File name recorded with the part.
    #[serde(default)]
    pub file_name: String,
    /// 1-based part number.
    #[serde(default = "default_part_no")]
    pub part_no: i32,
    /// Total parts the client intends to upload.
    #[serde(default = "default_part_no")]
    pub total_parts: i32,
    /// Target channel; zero selects the default channel.
    #[serde(default)]
    pub channel_id: i64,
}

fn default_part_no() -> i32 {
    1
}

/// Query parameters of the file listing operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesParams {
    /// Operation: `list` (default), `find`, or `search`.
    #[serde(default = "default_op")]
    pub op: String,
    /// Folder path scope.
    pub path: Option<String>,
    /// Name filter for `find`.
    pub name: Option<String>,
    /// Starred filter for `find`.
    pub starred: Option<bool>,
    /// Search terms for `search`.
    pub search: Option<String>,
    /// Page size.
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    /// Keyset token from the previous page.
    pub next_page_token: Option<String>,
    /// Sort column: `name`, `size`, or `updated_at`.
    #[serde(default = "default_sort")]
    pub sort: String,
    /// Sort order: `asc` or `desc`.
    #[serde(default = "default_order")]
    pub order: String,
}

fn default_op() -> String {
    "list".to_string()
}

fn default_per_page() -> i64 {
    200
}

fn default_sort() -> String {
    "name".to_string()
}

fn default_order() -> String {
    "asc".to_string()
}

/// Query parameters of the stream operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamQuery {
    /// Session lookup hash.
    pub hash: Option<String>,
    /// `1` forces an attachment disposition.
    pub d: Option<String>,
}
