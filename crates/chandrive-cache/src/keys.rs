//! Cache key builders for all chandrive cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

/// Cache key for a file row by ID.
pub fn file_by_id(file_id: &str) -> String {
    format!("files:{file_id}")
}

/// Cache key for a session by its lookup hash.
pub fn session_by_hash(hash: &str) -> String {
    format!("sessions:{hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_key() {
        assert_eq!(file_by_id("abc-123"), "files:abc-123");
    }

    #[test]
    fn test_session_key() {
        assert_eq!(session_by_hash("deadbeef"), "sessions:deadbeef");
    }
}
