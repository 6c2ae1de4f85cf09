//! File repository — CRUD over the virtual tree plus the stored-procedure
//! surface for path operations.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_entity::file::{CreateFile, File};

/// Listing operations supported by [`FileRepository::list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOp {
    /// Children of one folder.
    List,
    /// Exact-attribute filtering.
    Find,
    /// Full-text name search.
    Search,
}

/// Query parameters for file listing.
#[derive(Debug, Clone)]
pub struct ListFilesQuery {
    /// Which listing operation to run.
    pub op: ListOp,
    /// Folder path for `List`, or scoping path for `Find`.
    pub path: Option<String>,
    /// Name filter for `Find`.
    pub name: Option<String>,
    /// Starred filter for `Find`.
    pub starred: Option<bool>,
    /// Search terms for `Search`.
    pub search: Option<String>,
    /// Page size.
    pub per_page: i64,
    /// Opaque keyset token from the previous page.
    pub next_page_token: Option<String>,
    /// Sort column: `name`, `size`, or `updated_at`.
    pub sort: String,
    /// Sort order: `asc` or `desc`.
    pub order: String,
}

impl Default for ListFilesQuery {
    fn default() -> Self {
        Self {
            op: ListOp::List,
            path: None,
            name: None,
            starred: None,
            search: None,
            per_page: 200,
            next_page_token: None,
            sort: "name".to_string(),
            order: "asc".to_string(),
        }
    }
}

/// Repository for rows in `chandrive.files`.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM chandrive.files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find a folder row by its absolute path.
    pub async fn find_folder_by_path(&self, path: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM chandrive.files WHERE type = 'folder' AND path = $1",
        )
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve path", e))
    }

    /// List active files for a user per the query's operation.
    pub async fn list(&self, user_id: i64, query: &ListFilesQuery) -> AppResult<Vec<File>> {
        let parent_id = match &query.path {
            Some(path) if query.op != ListOp::Search => Some(
                self.find_folder_by_path(path)
                    .await?
                    .ok_or_else(|| AppError::not_found("path not found"))?
                    .id,
            ),
            _ => None,
        };

        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT * FROM chandrive.files WHERE status = 'active' AND user_id = ",
        );
        qb.push_bind(user_id);

        match query.op {
            ListOp::List => {
                qb.push(" AND parent_id = ");
                qb.push_bind(parent_id.unwrap_or_default());
            }
            ListOp::Find => {
                if let Some(parent_id) = parent_id {
                    qb.push(" AND parent_id = ");
                    qb.push_bind(parent_id);
                }
                if let Some(name) = &query.name {
                    qb.push(" AND name = ");
                    qb.push_bind(name.clone());
                }
                if let Some(starred) = query.starred {
                    qb.push(" AND starred = ");
                    qb.push_bind(starred);
                }
            }
            ListOp::Search => {
                qb.push(" AND chandrive.get_tsquery(");
                qb.push_bind(query.search.clone().unwrap_or_default());
                qb.push(") @@ chandrive.get_tsvector(name)");
            }
        }

        let sort_column = sort_column(&query.sort);
        let descending = query.order.eq_ignore_ascii_case("desc");

        if let Some(token) = &query.next_page_token {
            let value = decode_page_token(token)?;
            qb.push(format!(
                " AND {sort_column} {} ",
                if descending { "<" } else { ">" }
            ));
            qb.push_bind(value);
            qb.push(sort_cast(&query.sort));
        }

        qb.push(format!(
            " ORDER BY type DESC, {sort_column} {}",
            if descending { "DESC" } else { "ASC" }
        ));
        qb.push(" LIMIT ");
        qb.push_bind(query.per_page);

        qb.build_query_as::<File>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Create a new file or folder row.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        let id = Uuid::new_v4().to_string();
        let parts = data
            .parts
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(AppError::from)?;

        sqlx::query_as::<_, File>(
            "INSERT INTO chandrive.files \
             (id, name, type, path, depth, parent_id, size, mime_type, channel_id, parts, user_id, status, starred) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active', FALSE) RETURNING *",
        )
        .bind(&id)
        .bind(&data.name)
        .bind(&data.kind)
        .bind(&data.path)
        .bind(data.depth)
        .bind(&data.parent_id)
        .bind(data.size)
        .bind(&data.mime_type)
        .bind(data.channel_id)
        .bind(parts)
        .bind(data.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::conflict(
                format!("'{}' already exists at this location", data.name),
            ),
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    /// Apply a partial update to a file row.
    pub async fn update(&self, id: &str, changes: &UpdateFileChanges) -> AppResult<File> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE chandrive.files SET updated_at = NOW()");

        if let Some(name) = &changes.name {
            qb.push(", name = ");
            qb.push_bind(name.clone());
        }
        if let Some(parent_id) = &changes.parent_id {
            qb.push(", parent_id = ");
            qb.push_bind(parent_id.clone());
        }
        if let Some(starred) = changes.starred {
            qb.push(", starred = ");
            qb.push_bind(starred);
        }
        if let Some(status) = &changes.status {
            qb.push(", status = ");
            qb.push_bind(status.clone());
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id.to_string());
        qb.push(" RETURNING *");

        qb.build_query_as::<File>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update file", e))?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    /// Rename a folder through the `update_folder` procedure, which also
    /// rewrites the paths of every descendant.
    pub async fn update_folder(&self, id: &str, name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>("SELECT * FROM chandrive.update_folder($1, $2)")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update folder", e))?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// Upsert a directory chain and return the leaf folder row.
    pub async fn create_directories(&self, user_id: i64, path: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>("SELECT * FROM chandrive.create_directories($1, $2)")
            .bind(user_id)
            .bind(path)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to create directories", e)
            })?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::database("create_directories returned no rows"))
    }

    /// Re-parent a set of files under the destination folder.
    pub async fn move_files(&self, ids: &[String], destination_id: &str) -> AppResult<u64> {
        let result = sqlx::query("UPDATE chandrive.files SET parent_id = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(destination_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move files", e))?;
        Ok(result.rows_affected())
    }

    /// Move a directory subtree through the `move_directory` procedure.
    pub async fn move_directory(&self, source: &str, destination: &str, user_id: i64) -> AppResult<()> {
        sqlx::query("SELECT * FROM chandrive.move_directory($1, $2, $3)")
            .bind(source)
            .bind(destination)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to move directory", e)
            })?;
        Ok(())
    }

    /// Soft-delete files through the `delete_files` procedure.
    pub async fn delete_files(&self, ids: &[String]) -> AppResult<()> {
        sqlx::query("CALL chandrive.delete_files($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete files", e))?;
        Ok(())
    }
}

/// Partial update payload for [`FileRepository::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateFileChanges {
    /// New name.
    pub name: Option<String>,
    /// New parent folder.
    pub parent_id: Option<String>,
    /// New starred flag.
    pub starred: Option<bool>,
    /// New status.
    pub status: Option<String>,
}

/// Map a client sort key to a safe SQL column expression.
fn sort_column(sort: &str) -> &'static str {
    match sort {
        "size" => "size",
        "updated_at" => "updated_at",
        _ => "name COLLATE numeric",
    }
}

/// Cast suffix for comparing a keyset token against a non-text column.
fn sort_cast(sort: &str) -> &'static str {
    match sort {
        "size" => "::bigint",
        "updated_at" => "::timestamptz",
        _ => "",
    }
}

/// Encode a keyset page token from the last row's sort value.
pub fn encode_page_token(value: &str) -> String {
    BASE64.encode(value.as_bytes())
}

/// Decode a keyset page token back to the raw sort value.
fn decode_page_token(token: &str) -> AppResult<String> {
    let raw = BASE64
        .decode(token)
        .map_err(|_| AppError::bad_request("invalid page token"))?;
    String::from_utf8(raw).map_err(|_| AppError::bad_request("invalid page token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_token_round_trip() {
        let token = encode_page_token("movie.mkv");
        assert_eq!(decode_page_token(&token).unwrap(), "movie.mkv");
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(sort_column("size"), "size");
        assert_eq!(sort_column("updated_at"), "updated_at");
        // Unknown keys fall back to the name collation.
        assert_eq!(sort_column("id; DROP TABLE"), "name COLLATE numeric");
    }
}
