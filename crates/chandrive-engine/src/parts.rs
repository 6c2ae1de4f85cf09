//! Part discovery and range-to-part windowing.
//!
//! Part sizes are not stored in the index; they are discovered at read
//! time from each message's document. A requested absolute byte window is
//! then pruned to the parts it intersects, with local offsets for the
//! first and last retained part.

use std::sync::Arc;

use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::{InputDocument, RemoteApi};

/// A file part located on the platform, with its discovered size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartLocation {
    /// Read/re-send reference for the part's document.
    pub input: InputDocument,
    /// Document size in bytes.
    pub size: i64,
}

/// One part of a ranged read, with local inclusive offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangedPart {
    /// Read reference for the part's document.
    pub input: InputDocument,
    /// First byte of this part to deliver.
    pub start: i64,
    /// Last byte of this part to deliver, inclusive.
    pub end: i64,
}

/// Fetch the messages behind `part_ids` and read out their documents.
///
/// A message without a document means the part was deleted on the
/// platform; the read cannot proceed.
pub async fn fetch_parts(
    client: &Arc<dyn RemoteApi>,
    channel_id: i64,
    part_ids: &[i64],
) -> AppResult<Vec<PartLocation>> {
    if part_ids.is_empty() {
        return Ok(Vec::new());
    }

    let messages = client.get_messages(channel_id, part_ids).await?;
    messages
        .into_iter()
        .map(|message| {
            let document = message
                .document
                .ok_or_else(|| AppError::not_found("file part message has no document"))?;
            Ok(PartLocation {
                input: document.as_input(),
                size: document.size,
            })
        })
        .collect()
}

/// Prune a part list to the window `[start, end]` and localize offsets.
///
/// Interior parts are retained in full; only the first and last retained
/// parts carry partial windows.
pub fn ranged_parts(parts: &[PartLocation], start: i64, end: i64) -> Vec<RangedPart> {
    let mut ranged = Vec::new();
    let mut offset: i64 = 0;

    for part in parts {
        let part_start = offset;
        let part_end = offset + part.size - 1;
        offset += part.size;

        if part.size == 0 || part_end < start || part_start > end {
            continue;
        }

        ranged.push(RangedPart {
            input: part.input.clone(),
            start: (start - part_start).max(0),
            end: if end < part_end {
                end - part_start
            } else {
                part.size - 1
            },
        });
    }

    ranged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(id: i64, size: i64) -> PartLocation {
        PartLocation {
            input: InputDocument {
                id,
                access_hash: id * 10,
                file_reference: format!("ref-{id}"),
            },
            size,
        }
    }

    #[test]
    fn test_window_inside_single_part() {
        // Scenario: parts of 1_000_000 / 1_000_000 / 500_000 bytes,
        // range 1_500_000-1_999_999 lands entirely in the middle part.
        let parts = vec![part(1, 1_000_000), part(2, 1_000_000), part(3, 500_000)];
        let ranged = ranged_parts(&parts, 1_500_000, 1_999_999);
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].input.id, 2);
        assert_eq!(ranged[0].start, 500_000);
        assert_eq!(ranged[0].end, 999_999);
    }

    #[test]
    fn test_window_spanning_all_parts() {
        let parts = vec![part(1, 100), part(2, 100), part(3, 100)];
        let ranged = ranged_parts(&parts, 50, 249);
        assert_eq!(ranged.len(), 3);
        assert_eq!((ranged[0].start, ranged[0].end), (50, 99));
        assert_eq!((ranged[1].start, ranged[1].end), (0, 99));
        assert_eq!((ranged[2].start, ranged[2].end), (0, 49));
    }

    #[test]
    fn test_full_file_window() {
        let parts = vec![part(1, 100), part(2, 50)];
        let ranged = ranged_parts(&parts, 0, 149);
        assert_eq!(ranged.len(), 2);
        assert_eq!((ranged[0].start, ranged[0].end), (0, 99));
        assert_eq!((ranged[1].start, ranged[1].end), (0, 49));
    }

    #[test]
    fn test_part_boundary_window() {
        // Window exactly covering the second part.
        let parts = vec![part(1, 100), part(2, 100), part(3, 100)];
        let ranged = ranged_parts(&parts, 100, 199);
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].input.id, 2);
        assert_eq!((ranged[0].start, ranged[0].end), (0, 99));
    }

    #[test]
    fn test_single_byte_window() {
        let parts = vec![part(1, 100), part(2, 100)];
        let ranged = ranged_parts(&parts, 100, 100);
        assert_eq!(ranged.len(), 1);
        assert_eq!((ranged[0].start, ranged[0].end), (0, 0));
    }
}
