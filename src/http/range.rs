//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges only (RFC 9110 §14). Multi-range requests are
//! answered with the full body.

/// Inclusive byte range, already clamped to the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub const fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    Valid(ByteRange),
    /// No overlap with the file - answer 416
    NotSatisfiable,
    /// No Range header, multi-range or malformed - serve the whole file
    None,
}

/// Parse a `Range` header against a file of `size` bytes
///
/// Supported forms:
/// - `bytes=start-end`
/// - `bytes=start-`
/// - `bytes=-suffix`
///
/// # Examples
/// ```
/// use dirserve::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// assert_eq!(
///     parse_range_header(Some("bytes=0-99"), 1000),
///     RangeParseResult::Valid(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range_header(None, 1000), RangeParseResult::None);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: u64) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    if spec.contains(',') {
        return RangeParseResult::None;
    }

    let Some((first, last)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        suffix_range(last, size)
    } else {
        bounded_range(first, last, size)
    }
}

/// `-n`: the last n bytes
fn suffix_range(suffix: &str, size: u64) -> RangeParseResult {
    let Ok(n) = suffix.parse::<u64>() else {
        return RangeParseResult::None;
    };
    if n == 0 || size == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange {
        start: size.saturating_sub(n),
        end: size - 1,
    })
}

/// `a-` or `a-b`
fn bounded_range(first: &str, last: &str, size: u64) -> RangeParseResult {
    let Ok(start) = first.parse::<u64>() else {
        return RangeParseResult::None;
    };

    let end = if last.is_empty() {
        None
    } else {
        let Ok(end) = last.parse::<u64>() else {
            return RangeParseResult::None;
        };
        if end < start {
            return RangeParseResult::None;
        }
        Some(end)
    };

    if start >= size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = end.map_or(size - 1, |e| e.min(size - 1));
    RangeParseResult::Valid(ByteRange { start, end })
}
