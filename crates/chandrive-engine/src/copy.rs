//! Copy engine.
//!
//! Server-side copy re-references the source parts' media documents into
//! fresh messages on the same channel, so no bytes move. Document
//! references are channel-scoped on the platform, which is why the
//! destination channel always equals the source channel.

use std::sync::Arc;

use tracing::info;

use chandrive_core::config::RemoteConfig;
use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::RemoteApi;
use chandrive_database::repositories::file::FileRepository;
use chandrive_entity::file::{CreateFile, File, Part};
use chandrive_entity::session::Session;
use chandrive_remote::ChatClient;

/// Parameters for a copy operation.
#[derive(Debug, Clone)]
pub struct CopyParams {
    /// Source file id.
    pub id: String,
    /// Destination folder path; missing folders are created.
    pub destination: String,
    /// Name of the copy.
    pub name: String,
}

/// Copies files by re-referencing their media documents.
pub struct CopyEngine {
    file_repo: Arc<FileRepository>,
    remote: RemoteConfig,
}

impl CopyEngine {
    /// Create a new copy engine.
    pub fn new(file_repo: Arc<FileRepository>, remote: RemoteConfig) -> Self {
        Self { file_repo, remote }
    }

    /// Copy a file into `destination` under a new name.
    ///
    /// An error mid-iteration leaves the already-sent messages orphaned
    /// on the platform; nothing references them and no cleanup runs.
    pub async fn copy(&self, session: &Session, params: CopyParams) -> AppResult<File> {
        let source = self
            .file_repo
            .find_by_id(&params.id)
            .await?
            .ok_or_else(|| AppError::not_found("source file not found"))?;

        let channel_id = source
            .channel_id
            .ok_or_else(|| AppError::bad_request("source file has no backing channel"))?;

        let client: Arc<dyn RemoteApi> =
            Arc::new(ChatClient::user_login(&self.remote, &session.session)?);

        let new_parts = reference_parts(&client, channel_id, &source.part_ids()).await?;

        let destination = self
            .file_repo
            .create_directories(session.user_id, &params.destination)
            .await?;

        let copied = self
            .file_repo
            .create(&CreateFile {
                name: params.name,
                kind: source.kind.clone(),
                path: None,
                depth: None,
                parent_id: Some(destination.id),
                size: source.size,
                mime_type: source.mime_type.clone(),
                channel_id: Some(channel_id),
                parts: Some(new_parts),
                user_id: session.user_id,
            })
            .await?;

        info!(
            source = params.id,
            copy = copied.id,
            channel_id,
            "Copied file by reference"
        );
        Ok(copied)
    }
}

/// Re-send each source part's document and collect the new message ids,
/// preserving part order.
pub(crate) async fn reference_parts(
    client: &Arc<dyn RemoteApi>,
    channel_id: i64,
    part_ids: &[i64],
) -> AppResult<Vec<Part>> {
    let channel = client.resolve_channel(channel_id).await?;
    let messages = client.get_messages(channel_id, part_ids).await?;

    let mut new_parts = Vec::with_capacity(messages.len());
    for message in messages {
        let document = message
            .document
            .ok_or_else(|| AppError::not_found("source part message has no document"))?;
        let sent = client.send_media(&channel, &document.as_input()).await?;
        new_parts.push(Part { id: sent.id });
    }
    Ok(new_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRemote;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_reference_parts_preserves_order_and_bytes() {
        let mock = Arc::new(MockRemote::default());
        let m1 = mock.add_part(b"first");
        let m2 = mock.add_part(b"second");
        let m3 = mock.add_part(b"third");

        let client: Arc<dyn RemoteApi> = mock.clone();
        let new_parts = reference_parts(&client, 9, &[m1, m2, m3]).await.unwrap();

        assert_eq!(new_parts.len(), 3);
        // New ids, same underlying documents, same order.
        let new_ids: Vec<i64> = new_parts.iter().map(|p| p.id).collect();
        assert!(new_ids.iter().all(|id| ![m1, m2, m3].contains(id)));
        assert_eq!(mock.part_bytes(new_ids[0]), Bytes::from_static(b"first"));
        assert_eq!(mock.part_bytes(new_ids[1]), Bytes::from_static(b"second"));
        assert_eq!(mock.part_bytes(new_ids[2]), Bytes::from_static(b"third"));
    }

    #[tokio::test]
    async fn test_reference_parts_missing_message_fails() {
        let mock = Arc::new(MockRemote::default());
        let m1 = mock.add_part(b"only");

        let client: Arc<dyn RemoteApi> = mock;
        let err = reference_parts(&client, 9, &[m1, 424242]).await.unwrap_err();
        assert_eq!(err.kind, chandrive_core::error::ErrorKind::NotFound);
    }
}
