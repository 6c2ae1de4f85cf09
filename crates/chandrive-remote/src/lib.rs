//! Concrete client for the chat-platform API.
//!
//! [`ChatClient`] implements the `RemoteApi` trait from `chandrive-core`
//! over the platform's HTTP RPC gateway. One client is constructed per
//! credential; the worker pools keep them warm and hand out shared
//! instances across requests.

pub mod client;
mod types;
mod uploader;

pub use client::{ChatClient, Credential, rand_int64};
