//! HTTP Range request parsing module
//!
//! Single byte-range requests (RFC 7233). Multi-range and malformed headers
//! fall back to the full representation.

/// Outcome of applying a `Range` header to a representation of known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// Serve the whole body
    Full,
    /// Serve bytes `start..=end`
    Partial { start: u64, end: u64 },
    /// Respond with 416
    Unsatisfiable,
}

/// Resolve a `Range` header against a body of `len` bytes
///
/// Supported forms are `bytes=start-end`, `bytes=start-` and `bytes=-suffix`.
///
/// # Examples
/// ```
/// use planetarium::http::range::{resolve_range, ByteRange};
///
/// assert_eq!(resolve_range(Some("bytes=0-99"), 1000), ByteRange::Partial { start: 0, end: 99 });
/// assert_eq!(resolve_range(None, 1000), ByteRange::Full);
/// ```
pub fn resolve_range(header: Option<&str>, len: u64) -> ByteRange {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if spec.contains(',') {
        return ByteRange::Full;
    }
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Full;
    };
    let (first, last) = (first.trim(), last.trim());

    if first.is_empty() {
        // Suffix form: the final `last` bytes
        return match last.parse::<u64>() {
            Ok(0) => ByteRange::Unsatisfiable,
            Ok(_) if len == 0 => ByteRange::Unsatisfiable,
            Ok(suffix) => ByteRange::Partial {
                start: len.saturating_sub(suffix),
                end: len - 1,
            },
            Err(_) => ByteRange::Full,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return ByteRange::Full;
    };
    let end = if last.is_empty() {
        u64::MAX
    } else {
        match last.parse::<u64>() {
            Ok(end) if end >= start => end,
            _ => return ByteRange::Full,
        }
    };

    if start >= len {
        return ByteRange::Unsatisfiable;
    }
    ByteRange::Partial {
        start,
        end: end.min(len - 1),
    }
}
