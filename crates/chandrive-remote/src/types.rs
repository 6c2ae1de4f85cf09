//! Wire DTOs for the platform RPC gateway.

use serde::{Deserialize, Serialize};

use chandrive_core::traits::remote::{InputDocument, Message};

#[derive(Debug, Serialize)]
pub(crate) struct ResolveChannelRequest {
    pub channel_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetMessagesRequest<'a> {
    pub channel_id: i64,
    pub ids: &'a [i64],
}

#[derive(Debug, Deserialize)]
pub(crate) struct GetMessagesResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMediaRequest<'a> {
    pub channel_id: i64,
    pub access_hash: i64,
    pub document: &'a InputDocument,
    pub random_id: i64,
    pub silent: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendFileRequest<'a> {
    pub channel_id: i64,
    pub access_hash: i64,
    pub file_id: i64,
    pub parts: i32,
    pub name: &'a str,
    pub size: i64,
    pub random_id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetFileRequest<'a> {
    pub document: &'a InputDocument,
    pub offset: i64,
    pub limit: i64,
}

/// One entry of the updates batch returned by a send call.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum Update {
    /// A message was created in a channel.
    #[serde(rename = "new_channel_message")]
    NewChannelMessage { message: Message },
    /// Any update kind we do not care about.
    #[serde(other)]
    Other,
}

/// Updates batch envelope returned by send calls.
#[derive(Debug, Deserialize)]
pub(crate) struct Updates {
    pub updates: Vec<Update>,
}

impl Updates {
    /// The first new-channel-message entry of the batch, if any.
    pub(crate) fn into_first_message(self) -> Option<Message> {
        self.updates.into_iter().find_map(|u| match u {
            Update::NewChannelMessage { message } => Some(message),
            Update::Other => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_message_skips_unknown_updates() {
        let raw = r#"{
            "updates": [
                {"type": "read_history"},
                {"type": "new_channel_message", "message": {"id": 42, "document": null}},
                {"type": "new_channel_message", "message": {"id": 43, "document": null}}
            ]
        }"#;
        let updates: Updates = serde_json::from_str(raw).unwrap();
        let msg = updates.into_first_message().unwrap();
        assert_eq!(msg.id, 42);
    }

    #[test]
    fn test_empty_batch_has_no_message() {
        let updates: Updates = serde_json::from_str(r#"{"updates": []}"#).unwrap();
        assert!(updates.into_first_message().is_none());
    }
}
