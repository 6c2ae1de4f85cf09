//! HTTP `Range` header parsing for the download engine.
//!
//! Only the first range of a multi-range header is honored; the rest
//! degrade silently. Supported forms: `bytes=s-e`, `bytes=s-`, and the
//! suffix form `bytes=-n`.

/// Outcome of resolving a request's range against the file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// No range requested: serve the whole file with 200.
    Full,
    /// A satisfiable range: serve `[start, end]` inclusive with 206.
    Partial {
        /// First byte offset.
        start: i64,
        /// Last byte offset, inclusive.
        end: i64,
    },
    /// The range lies entirely past the end of the file: 416.
    Unsatisfiable,
}

/// Errors from a syntactically invalid header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRange;

/// Resolve an optional `Range` header against a file of `size` bytes.
pub fn plan_range(header: Option<&str>, size: i64) -> Result<RangePlan, MalformedRange> {
    let header = match header {
        Some(h) => h.trim(),
        None => return Ok(RangePlan::Full),
    };

    let spec = header.strip_prefix("bytes=").ok_or(MalformedRange)?;
    // Multi-range requests degrade to their first range.
    let first = spec.split(',').next().ok_or(MalformedRange)?.trim();

    let (start_raw, end_raw) = first.split_once('-').ok_or(MalformedRange)?;

    if start_raw.is_empty() {
        // Suffix form: last n bytes.
        let n: i64 = end_raw.parse().map_err(|_| MalformedRange)?;
        if n <= 0 {
            return Ok(RangePlan::Unsatisfiable);
        }
        let start = (size - n).max(0);
        return Ok(RangePlan::Partial {
            start,
            end: size - 1,
        });
    }

    let start: i64 = start_raw.parse().map_err(|_| MalformedRange)?;
    if start >= size {
        return Ok(RangePlan::Unsatisfiable);
    }

    let end = if end_raw.is_empty() {
        size - 1
    } else {
        let end: i64 = end_raw.parse().map_err(|_| MalformedRange)?;
        if end < start {
            return Err(MalformedRange);
        }
        end.min(size - 1)
    };

    Ok(RangePlan::Partial { start, end })
}
