//! Database access for the chandrive metadata index.
//!
//! Path resolution, directory creation, folder move, and bulk delete are
//! delegated to stored procedures in the `chandrive` schema; everything
//! else is plain SQL through sqlx.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
