//! HTTP Range request parsing module
//!
//! Single `bytes` ranges only (RFC 9110 §14.1.2). Multi-range requests and
//! anything malformed fall back to the full representation.

/// Inclusive byte range already clamped to the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn length(self) -> usize {
        self.end - self.start + 1
    }

    /// `Content-Range` header value for this range
    pub fn content_range(self, total: usize) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// What a `Range` header asks for
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header, send everything
    Full,
    /// Send this slice with 206
    Partial(ByteRange),
    /// Syntactically valid but outside the file; send 416
    Unsatisfiable,
}

/// Parse a `Range` header against a file of `size` bytes
///
/// # Examples
/// ```
/// use static_game_server::http::range::{parse_range_header, ByteRange, RangeOutcome};
///
/// assert_eq!(
///     parse_range_header(Some("bytes=0-99"), 1000),
///     RangeOutcome::Partial(ByteRange { start: 0, end: 99 })
/// );
/// assert_eq!(parse_range_header(None, 1000), RangeOutcome::Full);
/// ```
pub fn parse_range_header(range_header: Option<&str>, size: usize) -> RangeOutcome {
    let Some(spec) = range_header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };

    match (first.trim(), last.trim()) {
        ("", "") => RangeOutcome::Full,
        ("", suffix) => suffix_range(suffix, size),
        (start, end) => bounded_range(start, end, size),
    }
}

/// `-N`: the last N bytes
fn suffix_range(suffix: &str, size: usize) -> RangeOutcome {
    let Ok(n) = suffix.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    if n == 0 || size == 0 {
        return RangeOutcome::Unsatisfiable;
    }
    RangeOutcome::Partial(ByteRange {
        start: size.saturating_sub(n),
        end: size - 1,
    })
}

/// `A-` or `A-B`, with B clamped to the last byte
fn bounded_range(start: &str, end: &str, size: usize) -> RangeOutcome {
    let Ok(start) = start.parse::<usize>() else {
        return RangeOutcome::Full;
    };
    let end = if end.is_empty() {
        None
    } else {
        match end.parse::<usize>() {
            Ok(e) => Some(e),
            Err(_) => return RangeOutcome::Full,
        }
    };

    if let Some(e) = end {
        if e < start {
            return RangeOutcome::Full;
        }
    }
    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }

    let last = size - 1;
    RangeOutcome::Partial(ByteRange {
        start,
        end: end.map_or(last, |e| e.min(last)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(start: usize, end: usize) -> RangeOutcome {
        RangeOutcome::Partial(ByteRange { start, end })
    }

    #[test]
    fn test_no_range() {
        assert_eq!(parse_range_header(None, 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("items=0-1"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_bounded_and_open_ranges() {
        assert_eq!(parse_range_header(Some("bytes=0-9"), 100), partial(0, 9));
        assert_eq!(parse_range_header(Some("bytes=50-"), 100), partial(50, 99));
        assert_eq!(parse_range_header(Some("bytes=90-500"), 100), partial(90, 99));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(parse_range_header(Some("bytes=-20"), 100), partial(80, 99));
        assert_eq!(parse_range_header(Some("bytes=-500"), 100), partial(0, 99));
        assert_eq!(parse_range_header(Some("bytes=-0"), 100), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_not_satisfiable() {
        assert_eq!(parse_range_header(Some("bytes=200-"), 100), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range_header(Some("bytes=0-"), 0), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range_header(Some("bytes=-5"), 0), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn test_malformed_is_ignored() {
        assert_eq!(parse_range_header(Some("bytes=a-b"), 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("bytes=0-9,20-29"), 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("bytes=9-3"), 100), RangeOutcome::Full);
        assert_eq!(parse_range_header(Some("bytes=-"), 100), RangeOutcome::Full);
    }

    #[test]
    fn test_content_range() {
        let range = ByteRange { start: 10, end: 19 };
        assert_eq!(range.length(), 10);
        assert_eq!(range.content_range(100), "bytes 10-19/100");
    }
}
