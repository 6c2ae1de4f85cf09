//! Remote chat-platform API trait and its wire types.
//!
//! The platform stores file bytes as media-document messages inside
//! channels. This trait is the seam between the engines and the concrete
//! RPC client in `chandrive-remote`; tests substitute an in-memory
//! implementation.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A byte stream type used for request bodies and streamed downloads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Addressable handle for a channel, stable per credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    /// Numeric channel identifier.
    pub channel_id: i64,
    /// Access hash bound to the resolving credential.
    pub access_hash: i64,
}

/// Reference to an existing media document, reusable across sends and reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDocument {
    /// Document identifier.
    pub id: i64,
    /// Document access hash.
    pub access_hash: i64,
    /// Opaque file reference token issued by the platform.
    pub file_reference: String,
}

/// The platform's file-attachment object carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: i64,
    /// Document access hash.
    pub access_hash: i64,
    /// Opaque file reference token.
    pub file_reference: String,
    /// Size of the document in bytes.
    pub size: i64,
    /// MIME type reported by the platform.
    pub mime_type: String,
}

impl Document {
    /// Build the input reference used to re-send or read this document.
    pub fn as_input(&self) -> InputDocument {
        InputDocument {
            id: self.id,
            access_hash: self.access_hash,
            file_reference: self.file_reference.clone(),
        }
    }
}

/// One chat-platform message. A file part is one message carrying a
/// media document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier within its channel.
    pub id: i64,
    /// The attached media document, if any.
    pub document: Option<Document>,
}

/// Typed adapter over the chat-platform API.
///
/// One implementation exists per live credential (bot token or user
/// session); the worker pools hand out shared instances.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// Resolve a numeric channel id into an addressable handle.
    ///
    /// The result is stable per credential and may be cached by the caller.
    async fn resolve_channel(&self, channel_id: i64) -> AppResult<ChannelHandle>;

    /// Fetch messages by id, preserving the request order.
    async fn get_messages(&self, channel_id: i64, ids: &[i64]) -> AppResult<Vec<Message>>;

    /// Create a new message referencing an existing media document.
    ///
    /// The implementation generates the platform's 64-bit idempotency nonce
    /// from a cryptographic RNG.
    async fn send_media(
        &self,
        channel: &ChannelHandle,
        document: &InputDocument,
    ) -> AppResult<Message>;

    /// Stream `size` bytes from `body` to the platform in parallel chunks
    /// of `part_size`, then commit them as a single media-document message.
    /// `threads` bounds upload concurrency.
    async fn upload_and_send(
        &self,
        channel: &ChannelHandle,
        body: ByteStream,
        file_name: &str,
        size: i64,
        threads: usize,
        part_size: usize,
    ) -> AppResult<Message>;

    /// Read at most `limit` bytes from a media document at byte `offset`.
    ///
    /// `offset` must be 4 KiB-aligned and `limit` a multiple of 4 KiB up to
    /// 1 MiB; the linear reader is the sole caller and enforces this.
    async fn get_file(&self, location: &InputDocument, offset: i64, limit: i64)
    -> AppResult<Bytes>;
}
