//! Byte-range parsing module
//!
//! Single-range subset of RFC 7233 for static file downloads.
//! Multi-range and non-byte units are ignored rather than rejected.

/// Outcome of resolving a Range header against a file of known size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable Range header, serve the whole file
    Full,
    /// Inclusive byte window within the file
    Partial { start: usize, end: usize },
    /// Requested window lies outside the file, answer 416
    Unsatisfiable,
}

/// Resolve a Range header value to a concrete byte window
///
/// Supported forms: `bytes=start-end`, `bytes=start-`, `bytes=-suffix`.
/// Malformed values fall back to `Full` (ignore, per RFC), while
/// syntactically valid windows outside the file yield `Unsatisfiable`.
pub fn resolve_range(header: Option<&str>, file_size: usize) -> ByteRange {
    let Some(ranges) = header.and_then(|h| h.strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };

    // Single range only
    if ranges.contains(',') {
        return ByteRange::Full;
    }

    let Some((start_str, end_str)) = ranges.split_once('-') else {
        return ByteRange::Full;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix form: "-N" selects the last N bytes
    if start_str.is_empty() {
        let Ok(suffix) = end_str.parse::<usize>() else {
            return ByteRange::Full;
        };
        if suffix == 0 || file_size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: file_size.saturating_sub(suffix),
            end: file_size - 1,
        };
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return ByteRange::Full;
    };
    if start >= file_size {
        return ByteRange::Unsatisfiable;
    }

    let end = if end_str.is_empty() {
        file_size - 1
    } else {
        let Ok(end) = end_str.parse::<usize>() else {
            return ByteRange::Full;
        };
        end.min(file_size - 1)
    };

    if start > end {
        return ByteRange::Unsatisfiable;
    }

    ByteRange::Partial { start, end }
}
