//! In-memory `RemoteApi` implementation for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::{
    ByteStream, ChannelHandle, Document, InputDocument, Message, RemoteApi,
};

/// Fake platform: documents and messages held in memory.
#[derive(Debug, Default)]
pub(crate) struct MockRemote {
    docs: Mutex<HashMap<i64, Bytes>>,
    messages: Mutex<HashMap<i64, Message>>,
    next_id: AtomicI64,
    /// Message ids created by send calls, in creation order.
    pub sent: Mutex<Vec<i64>>,
}

impl MockRemote {
    fn alloc_id(&self) -> i64 {
        1000 + self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Store `data` as a document and wrap it in a new message.
    /// Returns the message id.
    pub fn add_part(&self, data: &[u8]) -> i64 {
        let doc_id = self.alloc_id();
        let msg_id = self.alloc_id();
        self.docs
            .lock()
            .unwrap()
            .insert(doc_id, Bytes::copy_from_slice(data));
        let message = Message {
            id: msg_id,
            document: Some(Document {
                id: doc_id,
                access_hash: doc_id ^ 0x7777,
                file_reference: format!("ref-{doc_id}"),
                size: data.len() as i64,
                mime_type: "application/octet-stream".to_string(),
            }),
        };
        self.messages.lock().unwrap().insert(msg_id, message);
        msg_id
    }

    /// Raw document bytes by message id.
    pub fn part_bytes(&self, msg_id: i64) -> Bytes {
        let messages = self.messages.lock().unwrap();
        let doc = messages[&msg_id].document.as_ref().unwrap();
        self.docs.lock().unwrap()[&doc.id].clone()
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn resolve_channel(&self, channel_id: i64) -> AppResult<ChannelHandle> {
        Ok(ChannelHandle {
            channel_id,
            access_hash: channel_id ^ 0x5a5a,
        })
    }

    async fn get_messages(&self, _channel_id: i64, ids: &[i64]) -> AppResult<Vec<Message>> {
        let messages = self.messages.lock().unwrap();
        ids.iter()
            .map(|id| {
                messages
                    .get(id)
                    .cloned()
                    .ok_or_else(|| AppError::not_found(format!("message {id} not found")))
            })
            .collect()
    }

    async fn send_media(
        &self,
        _channel: &ChannelHandle,
        document: &InputDocument,
    ) -> AppResult<Message> {
        let size = self
            .docs
            .lock()
            .unwrap()
            .get(&document.id)
            .map(|d| d.len() as i64)
            .ok_or_else(|| AppError::not_found("document not found"))?;

        let msg_id = self.alloc_id();
        let message = Message {
            id: msg_id,
            document: Some(Document {
                id: document.id,
                access_hash: document.access_hash,
                file_reference: document.file_reference.clone(),
                size,
                mime_type: "application/octet-stream".to_string(),
            }),
        };
        self.messages.lock().unwrap().insert(msg_id, message.clone());
        self.sent.lock().unwrap().push(msg_id);
        Ok(message)
    }

    async fn upload_and_send(
        &self,
        _channel: &ChannelHandle,
        mut body: ByteStream,
        _file_name: &str,
        size: i64,
        _threads: usize,
        _part_size: usize,
    ) -> AppResult<Message> {
        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk.map_err(AppError::from)?);
        }
        if data.len() as i64 != size {
            return Err(AppError::bad_request("body length mismatch"));
        }
        let msg_id = self.add_part(&data);
        self.sent.lock().unwrap().push(msg_id);
        Ok(self.messages.lock().unwrap()[&msg_id].clone())
    }

    async fn get_file(
        &self,
        location: &InputDocument,
        offset: i64,
        limit: i64,
    ) -> AppResult<Bytes> {
        if offset % 4096 != 0 || limit % 4096 != 0 || limit <= 0 {
            return Err(AppError::validation("unaligned read"));
        }
        let docs = self.docs.lock().unwrap();
        let doc = docs
            .get(&location.id)
            .ok_or_else(|| AppError::not_found("document not found"))?;
        if offset >= doc.len() as i64 {
            return Ok(Bytes::new());
        }
        let end = (offset + limit).min(doc.len() as i64);
        Ok(doc.slice(offset as usize..end as usize))
    }
}
