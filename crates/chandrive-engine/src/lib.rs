//! The chandrive file I/O engine.
//!
//! Uploads stream HTTP bodies into channel messages through a pool of bot
//! credentials, downloads assemble ranged byte streams across message
//! parts, and copies re-reference existing media documents without moving
//! bytes. The metadata CRUD around this lives in `chandrive-database` and
//! `chandrive-api`; everything rate-limited and byte-shaped lives here.

pub mod copy;
pub mod download;
pub mod parts;
pub mod pool;
pub mod range;
pub mod reader;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use copy::CopyEngine;
pub use download::{DownloadEngine, PreparedStream, StreamPlan};
pub use pool::{StreamWorkers, UploadWorkers};
pub use upload::UploadEngine;
