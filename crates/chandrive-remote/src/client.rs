//! The chat-platform RPC client.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rand::RngCore;
use rand::rngs::OsRng;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use chandrive_core::config::RemoteConfig;
use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::{
    ByteStream, ChannelHandle, InputDocument, Message, RemoteApi,
};

use crate::types::{
    GetFileRequest, GetMessagesRequest, GetMessagesResponse, ResolveChannelRequest,
    SendFileRequest, SendMediaRequest, Updates,
};
use crate::uploader;

/// Maximum read window accepted by the platform's file-read primitive.
pub const MAX_READ_LIMIT: i64 = 1024 * 1024;

/// Required alignment for read offsets and limits.
pub const READ_ALIGN: i64 = 4096;

/// A credential the client acts under.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Bot token of the form `<bot_user_id>:<secret>`.
    Bot(String),
    /// Serialized user session.
    User(String),
}

impl Credential {
    fn header_value(&self) -> String {
        match self {
            Self::Bot(token) => format!("Bot {token}"),
            Self::User(session) => format!("Session {session}"),
        }
    }
}

/// Generate a 64-bit message nonce from the OS cryptographic RNG.
///
/// The platform uses the nonce for idempotency on retries, so collisions
/// would silently drop messages.
pub fn rand_int64() -> i64 {
    OsRng.next_u64() as i64
}

/// Typed client over the platform RPC gateway, one per credential.
///
/// Cloning is cheap; the underlying HTTP connection pool is shared.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl ChatClient {
    /// Log in with a bot token.
    pub fn bot_login(config: &RemoteConfig, token: &str) -> AppResult<Self> {
        Self::connect(config, Credential::Bot(token.to_string()))
    }

    /// Log in with a user session credential.
    pub fn user_login(config: &RemoteConfig, session: &str) -> AppResult<Self> {
        Self::connect(config, Credential::User(session.to_string()))
    }

    fn connect(config: &RemoteConfig, credential: Credential) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Remote, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// Translate a non-success gateway response into an [`AppError`].
    async fn check_status(response: reqwest::Response) -> AppResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let err = match status.as_u16() {
            401 | 403 => AppError::unauthorized("platform rejected the credential"),
            404 => AppError::not_found("message or channel not found on the platform"),
            429 => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                AppError::rate_limit(format!("platform rate limit, retry after {retry_after}s"))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                AppError::remote(format!("platform returned {status}: {body}"))
            }
        };
        Err(err)
    }

    async fn call<Req, Resp>(&self, method: &str, request: &Req) -> AppResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint(method))
            .header(AUTHORIZATION, self.credential.header_value())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Remote, format!("{method} transport error"), e)
            })?;

        let response = Self::check_status(response).await?;
        response.json().await.map_err(|e| {
            AppError::with_source(ErrorKind::Remote, format!("{method} decode error"), e)
        })
    }

    /// Upload one chunk of a pending file. Used by the parallel uploader.
    pub(crate) async fn save_part(
        &self,
        file_id: i64,
        part_no: i32,
        total_parts: i32,
        data: Bytes,
    ) -> AppResult<()> {
        let response = self
            .http
            .post(self.endpoint("upload.save_part"))
            .header(AUTHORIZATION, self.credential.header_value())
            .query(&[
                ("file_id", file_id.to_string()),
                ("part_no", part_no.to_string()),
                ("total_parts", total_parts.to_string()),
            ])
            .body(data)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Remote, "upload.save_part transport error", e)
            })?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Commit previously uploaded chunks as a single media-document message.
    pub(crate) async fn send_uploaded_file(
        &self,
        channel: &ChannelHandle,
        file_id: i64,
        parts: i32,
        file_name: &str,
        size: i64,
    ) -> AppResult<Message> {
        let request = SendFileRequest {
            channel_id: channel.channel_id,
            access_hash: channel.access_hash,
            file_id,
            parts,
            name: file_name,
            size,
            random_id: rand_int64(),
        };
        let updates: Updates = self.call("messages.send_file", &request).await?;
        updates
            .into_first_message()
            .ok_or_else(|| AppError::remote("no new channel message in updates batch"))
    }
}

#[async_trait]
impl RemoteApi for ChatClient {
    async fn resolve_channel(&self, channel_id: i64) -> AppResult<ChannelHandle> {
        debug!(channel_id, "Resolving channel");
        self.call("channels.resolve", &ResolveChannelRequest { channel_id })
            .await
    }

    async fn get_messages(&self, channel_id: i64, ids: &[i64]) -> AppResult<Vec<Message>> {
        let response: GetMessagesResponse = self
            .call("messages.get", &GetMessagesRequest { channel_id, ids })
            .await?;
        Ok(response.messages)
    }

    async fn send_media(
        &self,
        channel: &ChannelHandle,
        document: &InputDocument,
    ) -> AppResult<Message> {
        let request = SendMediaRequest {
            channel_id: channel.channel_id,
            access_hash: channel.access_hash,
            document,
            random_id: rand_int64(),
            silent: true,
        };
        let updates: Updates = self.call("messages.send_media", &request).await?;
        updates
            .into_first_message()
            .ok_or_else(|| AppError::remote("no new channel message in updates batch"))
    }

    async fn upload_and_send(
        &self,
        channel: &ChannelHandle,
        body: ByteStream,
        file_name: &str,
        size: i64,
        threads: usize,
        part_size: usize,
    ) -> AppResult<Message> {
        if size <= 0 {
            return Err(AppError::validation("upload size must be positive"));
        }

        let file_id = rand_int64();
        let total_parts = uploader::part_count(size, part_size);

        uploader::upload_parts(self, file_id, body, size, total_parts, threads, part_size)
            .await?;

        debug!(file_id, total_parts, size, "Committing uploaded document");
        self.send_uploaded_file(channel, file_id, total_parts, file_name, size)
            .await
    }

    async fn get_file(
        &self,
        location: &InputDocument,
        offset: i64,
        limit: i64,
    ) -> AppResult<Bytes> {
        if offset % READ_ALIGN != 0 || limit % READ_ALIGN != 0 {
            return Err(AppError::validation("file read offset/limit must be 4 KiB-aligned"));
        }
        if limit <= 0 || limit > MAX_READ_LIMIT {
            return Err(AppError::validation("file read limit out of range"));
        }

        let request = GetFileRequest {
            document: location,
            offset,
            limit,
        };
        let response = self
            .http
            .post(self.endpoint("upload.get_file"))
            .header(AUTHORIZATION, self.credential.header_value())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Remote, "upload.get_file transport error", e)
            })?;

        let response = Self::check_status(response).await?;
        response.bytes().await.map_err(|e| {
            AppError::with_source(ErrorKind::Remote, "upload.get_file read error", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonces_are_distinct() {
        // Collisions in 64 bits across a handful of draws would indicate a
        // broken RNG rather than bad luck.
        let a = rand_int64();
        let b = rand_int64();
        let c = rand_int64();
        assert!(a != b || b != c);
    }

    #[test]
    fn test_credential_header() {
        assert_eq!(
            Credential::Bot("12:ab".into()).header_value(),
            "Bot 12:ab"
        );
        assert_eq!(
            Credential::User("sess".into()).header_value(),
            "Session sess"
        );
    }
}
