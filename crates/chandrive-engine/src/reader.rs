//! Linear part reader.
//!
//! Presents the ordered parts of a ranged read as a single contiguous
//! byte stream of exactly `content_length` bytes. The platform's read
//! primitive requires 4 KiB-aligned offsets, so the reader rounds each
//! part's local start down, fetches fixed chunks, and discards the
//! pre-roll before delivering bytes. This module is the only place the
//! alignment constraint lives.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream;

use chandrive_core::error::AppError;
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::{ByteStream, RemoteApi};

use crate::parts::RangedPart;

/// Fixed fetch size. Must be a 4 KiB multiple no larger than the
/// platform's 1 MiB per-read cap.
pub const CHUNK_SIZE: i64 = 1024 * 1024;

const ALIGN: i64 = 4096;

/// Read progress within the current part.
#[derive(Debug)]
struct PartProgress {
    /// Next aligned fetch offset within the part's document.
    fetch_offset: i64,
    /// Pre-roll bytes still to discard from the next fetch.
    skip: i64,
    /// Bytes of this part still owed to the consumer.
    left: i64,
}

/// Pull-based reader over the pruned part list of one ranged download.
///
/// Each [`next_chunk`](Self::next_chunk) call performs at most one remote
/// fetch; chunks are delivered strictly in increasing offset order, parts
/// strictly in list order. A remote error aborts the stream without
/// retry.
pub struct LinearReader {
    client: Arc<dyn RemoteApi>,
    parts: Vec<RangedPart>,
    pos: usize,
    progress: Option<PartProgress>,
    remaining: i64,
}

impl LinearReader {
    /// Create a reader delivering exactly `content_length` bytes across
    /// `parts` (already pruned and localized to the requested window).
    pub fn new(client: Arc<dyn RemoteApi>, parts: Vec<RangedPart>, content_length: i64) -> Self {
        Self {
            client,
            parts,
            pos: 0,
            progress: None,
            remaining: content_length,
        }
    }

    /// Fetch and return the next run of bytes, or `None` once
    /// `content_length` bytes have been delivered.
    pub async fn next_chunk(&mut self) -> AppResult<Option<Bytes>> {
        if self.remaining <= 0 {
            return Ok(None);
        }
        let part = match self.parts.get(self.pos) {
            Some(part) => part,
            None => {
                return Err(AppError::remote(
                    "part list exhausted before content length was reached",
                ));
            }
        };

        let progress = self.progress.get_or_insert_with(|| {
            let aligned = part.start - (part.start % ALIGN);
            PartProgress {
                fetch_offset: aligned,
                skip: part.start - aligned,
                left: part.end - part.start + 1,
            }
        });

        let fetched = self
            .client
            .get_file(&part.input, progress.fetch_offset, CHUNK_SIZE)
            .await?;
        progress.fetch_offset += CHUNK_SIZE;

        if (fetched.len() as i64) <= progress.skip {
            return Err(AppError::remote("short read from platform document"));
        }
        let mut chunk = if progress.skip > 0 {
            let skip = progress.skip as usize;
            progress.skip = 0;
            fetched.slice(skip..)
        } else {
            fetched
        };

        if (chunk.len() as i64) > progress.left {
            chunk = chunk.slice(..progress.left as usize);
        }
        progress.left -= chunk.len() as i64;
        self.remaining -= chunk.len() as i64;

        if progress.left == 0 {
            self.progress = None;
            self.pos += 1;
        }

        Ok(Some(chunk))
    }

    /// Adapt the reader into a byte stream for an HTTP response body.
    ///
    /// An error is yielded once and then the stream fuses; dropping the
    /// stream aborts any in-flight fetch.
    pub fn into_stream(self) -> ByteStream {
        Box::pin(stream::unfold(self, |mut reader| async move {
            match reader.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), reader)),
                Ok(None) => None,
                Err(err) => {
                    reader.remaining = 0;
                    Some((
                        Err(std::io::Error::new(std::io::ErrorKind::Other, err)),
                        reader,
                    ))
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::{PartLocation, fetch_parts, ranged_parts};
    use crate::testing::MockRemote;

    /// Deterministic pseudo-random content.
    fn pattern(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| ((i as u64 * 31 + seed as u64) % 251) as u8)
            .collect()
    }

    async fn locations(remote: &Arc<dyn RemoteApi>, ids: &[i64]) -> Vec<PartLocation> {
        fetch_parts(remote, 1, ids).await.unwrap()
    }

    async fn read_window(
        remote: Arc<dyn RemoteApi>,
        parts: &[PartLocation],
        start: i64,
        end: i64,
    ) -> Vec<u8> {
        let ranged = ranged_parts(parts, start, end);
        let mut reader = LinearReader::new(remote, ranged, end - start + 1);
        let mut out = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn test_full_round_trip_across_parts() {
        let mock = MockRemote::default();
        let contents = [
            pattern(1_000_000, 1),
            pattern(1_000_000, 2),
            pattern(500_000, 3),
        ];
        let ids: Vec<i64> = contents.iter().map(|c| mock.add_part(c)).collect();
        let expected: Vec<u8> = contents.concat();

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let parts = locations(&remote, &ids).await;
        let got = read_window(remote, &parts, 0, expected.len() as i64 - 1).await;
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_ranged_read_matches_slice() {
        let mock = MockRemote::default();
        let contents = [
            pattern(1_000_000, 1),
            pattern(1_000_000, 2),
            pattern(500_000, 3),
        ];
        let ids: Vec<i64> = contents.iter().map(|c| mock.add_part(c)).collect();
        let all: Vec<u8> = contents.concat();

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let parts = locations(&remote, &ids).await;

        // The middle-part window from the 3-part scenario.
        let got = read_window(Arc::clone(&remote), &parts, 1_500_000, 1_999_999).await;
        assert_eq!(got.len(), 500_000);
        assert_eq!(got, all[1_500_000..2_000_000]);

        // A window crossing the first part boundary.
        let got = read_window(remote, &parts, 999_990, 1_000_009).await;
        assert_eq!(got, all[999_990..1_000_010]);
    }

    #[tokio::test]
    async fn test_alignment_independence() {
        let mock = MockRemote::default();
        let content = pattern(50_000, 9);
        let ids = vec![mock.add_part(&content)];

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let parts = locations(&remote, &ids).await;

        // One aligned start, one not; both must return exact slices.
        for start in [4096i64, 4097, 12_345] {
            let end = start + 1000;
            let got = read_window(Arc::clone(&remote), &parts, start, end).await;
            assert_eq!(got, content[start as usize..=end as usize], "start={start}");
        }
    }

    #[tokio::test]
    async fn test_concatenation_law() {
        let mock = MockRemote::default();
        let contents = [pattern(300_000, 4), pattern(200_000, 5)];
        let ids: Vec<i64> = contents.iter().map(|c| mock.add_part(c)).collect();
        let all: Vec<u8> = contents.concat();
        let size = all.len() as i64;

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let parts = locations(&remote, &ids).await;

        // Adjacent partition of [0, size-1].
        let cuts = [(0i64, 123_456i64), (123_457, 400_000), (400_001, size - 1)];
        let mut glued = Vec::new();
        for (a, b) in cuts {
            glued.extend(read_window(Arc::clone(&remote), &parts, a, b).await);
        }
        assert_eq!(glued, all);
    }

    #[tokio::test]
    async fn test_multi_chunk_part() {
        // A part larger than the fetch size needs several remote reads.
        let mock = MockRemote::default();
        let content = pattern(2 * CHUNK_SIZE as usize + 777, 6);
        let ids = vec![mock.add_part(&content)];

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let parts = locations(&remote, &ids).await;
        let got = read_window(remote, &parts, 0, content.len() as i64 - 1).await;
        assert_eq!(got, content);
    }

    #[tokio::test]
    async fn test_truncated_document_aborts() {
        let mock = MockRemote::default();
        let id = mock.add_part(&pattern(1000, 7));

        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let mut parts = locations(&remote, &[id]).await;
        // Claim the part is bigger than the stored document.
        parts[0].size = 10_000;

        let ranged = ranged_parts(&parts, 0, 9_999);
        let mut reader = LinearReader::new(remote, ranged, 10_000);

        let first = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(first.len(), 1000);
        assert!(reader.next_chunk().await.is_err());
    }

    #[tokio::test]
    async fn test_stream_fuses_after_error() {
        use futures::StreamExt;

        let mock = MockRemote::default();
        let id = mock.add_part(&pattern(100, 8));
        let remote: Arc<dyn RemoteApi> = Arc::new(mock);
        let mut parts = locations(&remote, &[id]).await;
        parts[0].size = 500;

        let ranged = ranged_parts(&parts, 0, 499);
        let mut stream = LinearReader::new(remote, ranged, 500).into_stream();

        assert!(stream.next().await.unwrap().is_ok());
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
