//! Upload engine.
//!
//! Streams one HTTP body into one channel message and records the part
//! row. A failed part is never re-driven here; the client retries with
//! the same `(upload_id, part_no)` and reconciles duplicates by listing
//! the upload's parts.

use std::sync::Arc;

use tracing::info;

use chandrive_core::config::RemoteConfig;
use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::{ByteStream, RemoteApi};
use chandrive_database::repositories::channel::ChannelRepository;
use chandrive_database::repositories::upload::{InsertUploadPart, UploadRepository};
use chandrive_entity::session::Session;
use chandrive_entity::upload::Upload;
use chandrive_remote::ChatClient;

use crate::pool::UploadWorkers;

/// Upload concurrency per part. Tuned for the platform's per-connection
/// throughput; not configurable.
const UPLOAD_THREADS: usize = 16;

/// Chunk size for the parallel uploader.
const UPLOAD_PART_SIZE: usize = 512 * 1024;

/// Query parameters accepted by the upload-part operation.
#[derive(Debug, Clone)]
pub struct UploadPartParams {
    /// File name recorded with the part.
    pub file_name: String,
    /// 1-based part number.
    pub part_no: i32,
    /// Total parts the client intends to upload.
    pub total_parts: i32,
    /// Target channel; zero selects the user's default channel.
    pub channel_id: i64,
}

/// Streams upload bodies into channel messages.
pub struct UploadEngine {
    upload_repo: Arc<UploadRepository>,
    channel_repo: Arc<ChannelRepository>,
    workers: UploadWorkers,
    remote: RemoteConfig,
}

impl UploadEngine {
    /// Create a new upload engine.
    pub fn new(
        upload_repo: Arc<UploadRepository>,
        channel_repo: Arc<ChannelRepository>,
        remote: RemoteConfig,
    ) -> Self {
        Self {
            upload_repo,
            channel_repo,
            workers: UploadWorkers::new(),
            remote,
        }
    }

    /// Upload one part: commit the body as a media message, then record
    /// the part row.
    ///
    /// The row insert is not transactional with the remote commit; if the
    /// insert fails the message stays on the platform and the client's
    /// retry may create a duplicate, which it discards when assembling
    /// the file.
    pub async fn upload_part(
        &self,
        session: &Session,
        upload_id: &str,
        params: UploadPartParams,
        body: ByteStream,
        content_length: i64,
    ) -> AppResult<Upload> {
        if params.file_name.is_empty() {
            return Err(AppError::bad_request("filename missing"));
        }

        let channel_id = if params.channel_id == 0 {
            self.channel_repo.default_channel(session.user_id).await?
        } else {
            params.channel_id
        };

        let tokens = self
            .channel_repo
            .bot_tokens(session.user_id, channel_id)
            .await?;

        let client: Arc<dyn RemoteApi> = if tokens.is_empty() {
            Arc::new(ChatClient::user_login(&self.remote, &session.session)?)
        } else {
            self.workers.set(channel_id, &tokens);
            let token = self
                .workers
                .next(channel_id)
                .ok_or_else(|| AppError::internal("upload worker pool is empty"))?;
            Arc::new(ChatClient::bot_login(&self.remote, &token)?)
        };

        let part_id = commit_part(
            &client,
            channel_id,
            body,
            &params.file_name,
            content_length,
        )
        .await?;

        info!(
            upload_id,
            part_no = params.part_no,
            part_id,
            channel_id,
            size = content_length,
            "Committed upload part"
        );

        self.upload_repo
            .insert(&InsertUploadPart {
                upload_id: upload_id.to_string(),
                name: params.file_name,
                part_no: params.part_no,
                total_parts: params.total_parts,
                part_id,
                channel_id,
                size: content_length,
                user_id: session.user_id,
            })
            .await
    }
}

/// Resolve the channel, stream the body up, and return the committed
/// message id.
pub(crate) async fn commit_part(
    client: &Arc<dyn RemoteApi>,
    channel_id: i64,
    body: ByteStream,
    file_name: &str,
    content_length: i64,
) -> AppResult<i64> {
    let channel = client.resolve_channel(channel_id).await?;

    let message = client
        .upload_and_send(
            &channel,
            body,
            file_name,
            content_length,
            UPLOAD_THREADS,
            UPLOAD_PART_SIZE,
        )
        .await?;

    if message.id == 0 {
        return Err(AppError::remote("failed to upload part"));
    }
    Ok(message.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRemote;
    use bytes::Bytes;
    use futures::stream;

    fn body_from(data: Vec<u8>) -> ByteStream {
        Box::pin(stream::iter(vec![Ok(Bytes::from(data))]))
    }

    #[tokio::test]
    async fn test_commit_part_creates_message() {
        let mock = Arc::new(MockRemote::default());
        let client: Arc<dyn RemoteApi> = mock.clone();

        let data = vec![7u8; 1234];
        let part_id = commit_part(&client, 55, body_from(data.clone()), "a.bin", 1234)
            .await
            .unwrap();

        assert!(part_id != 0);
        assert_eq!(mock.part_bytes(part_id), Bytes::from(data));
    }

    #[tokio::test]
    async fn test_commit_part_rejects_length_mismatch() {
        let mock = Arc::new(MockRemote::default());
        let client: Arc<dyn RemoteApi> = mock;

        let err = commit_part(&client, 55, body_from(vec![1, 2, 3]), "a.bin", 999)
            .await
            .unwrap_err();
        assert_eq!(err.kind, chandrive_core::error::ErrorKind::BadRequest);
    }
}
