//! Parallel chunk uploader.
//!
//! Reads the request body sequentially, slices it into fixed-size parts,
//! and keeps up to `threads` `upload.save_part` calls in flight. Part
//! numbers follow read order; the platform reassembles by part number at
//! commit time, so out-of-order completion is fine.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::task::JoinSet;
use tracing::debug;

use chandrive_core::error::{AppError, ErrorKind};
use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::ByteStream;

use crate::client::ChatClient;

/// Number of fixed-size parts required for `size` bytes.
pub(crate) fn part_count(size: i64, part_size: usize) -> i32 {
    ((size + part_size as i64 - 1) / part_size as i64) as i32
}

/// Upload every part of `body`, bounding concurrency at `threads`.
///
/// Fails fast: the first part error aborts the remaining in-flight
/// uploads (the pending file is simply never committed).
pub(crate) async fn upload_parts(
    client: &ChatClient,
    file_id: i64,
    mut body: ByteStream,
    size: i64,
    total_parts: i32,
    threads: usize,
    part_size: usize,
) -> AppResult<()> {
    let mut tasks: JoinSet<AppResult<()>> = JoinSet::new();
    let mut buf = BytesMut::new();
    let mut part_no: i32 = 0;
    let mut uploaded: i64 = 0;

    while let Some(part) = next_part(&mut body, part_size, &mut buf).await? {
        if tasks.len() >= threads {
            join_one(&mut tasks).await?;
        }

        uploaded += part.len() as i64;
        let worker = client.clone();
        let no = part_no;
        tasks.spawn(async move { worker.save_part(file_id, no, total_parts, part).await });
        part_no += 1;
    }

    while !tasks.is_empty() {
        join_one(&mut tasks).await?;
    }

    if uploaded != size {
        return Err(AppError::bad_request(format!(
            "request body was {uploaded} bytes, expected {size}"
        )));
    }

    debug!(file_id, parts = part_no, uploaded, "All parts uploaded");
    Ok(())
}

/// Await one in-flight upload and surface its result.
async fn join_one(tasks: &mut JoinSet<AppResult<()>>) -> AppResult<()> {
    match tasks.join_next().await {
        Some(Ok(result)) => result,
        Some(Err(e)) => Err(AppError::with_source(
            ErrorKind::Internal,
            "upload task failed",
            e,
        )),
        None => Ok(()),
    }
}

/// Pull the next `part_size`-byte slice from the body.
///
/// The trailing part may be shorter. Returns `None` once the body and the
/// carry-over buffer are both exhausted.
async fn next_part(
    body: &mut ByteStream,
    part_size: usize,
    buf: &mut BytesMut,
) -> AppResult<Option<Bytes>> {
    while buf.len() < part_size {
        match body.next().await {
            Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
            Some(Err(e)) => {
                return Err(AppError::with_source(
                    ErrorKind::BadRequest,
                    "request body read error",
                    e,
                ));
            }
            None => break,
        }
    }

    if buf.is_empty() {
        return Ok(None);
    }
    let take = buf.len().min(part_size);
    Ok(Some(buf.split_to(take).freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn body_of(chunks: Vec<&'static [u8]>) -> ByteStream {
        Box::pin(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))),
        ))
    }

    #[test]
    fn test_part_count() {
        assert_eq!(part_count(1, 512 * 1024), 1);
        assert_eq!(part_count(512 * 1024, 512 * 1024), 1);
        assert_eq!(part_count(512 * 1024 + 1, 512 * 1024), 2);
        assert_eq!(part_count(3 * 512 * 1024, 512 * 1024), 3);
    }

    #[tokio::test]
    async fn test_next_part_reslices_chunks() {
        // Incoming chunks of 3+3+2 bytes resliced into parts of 4.
        let mut body = body_of(vec![b"abc", b"def", b"gh"]);
        let mut buf = BytesMut::new();

        let p1 = next_part(&mut body, 4, &mut buf).await.unwrap().unwrap();
        assert_eq!(&p1[..], b"abcd");
        let p2 = next_part(&mut body, 4, &mut buf).await.unwrap().unwrap();
        assert_eq!(&p2[..], b"efgh");
        assert!(next_part(&mut body, 4, &mut buf).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_next_part_short_tail() {
        let mut body = body_of(vec![b"abcde"]);
        let mut buf = BytesMut::new();

        let p1 = next_part(&mut body, 4, &mut buf).await.unwrap().unwrap();
        assert_eq!(&p1[..], b"abcd");
        let p2 = next_part(&mut body, 4, &mut buf).await.unwrap().unwrap();
        assert_eq!(&p2[..], b"e");
        assert!(next_part(&mut body, 4, &mut buf).await.unwrap().is_none());
    }
}
