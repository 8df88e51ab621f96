//! URL path handling for static lookups
//!
//! Decoding and cleaning happen before any filesystem access, so a request
//! can never name a location above the registry root.

/// Percent-decode a URL path.
///
/// Returns `None` for truncated or non-hex escapes, NUL bytes and
/// results that are not UTF-8.
pub fn percent_decode(raw: &str) -> Option<String> {
    // `decode_binary` passes malformed escapes through unchanged
    let well_formed = raw.match_indices('%').all(|(i, _)| {
        raw.get(i + 1..i + 3)
            .is_some_and(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if !well_formed {
        return None;
    }

    let decoded = urlencoding::decode_binary(raw.as_bytes());
    if decoded.contains(&0) {
        return None;
    }
    String::from_utf8(decoded.into_owned()).ok()
}

/// Split a decoded path into clean segments.
///
/// Empty and `.` segments are dropped and `..` removes the previous
/// segment, never climbing above the root.
pub fn clean_segments(decoded: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s if s.contains('\\') => {
                // Backslash is a separator on Windows; never let it through
                segments.extend(s.split('\\').filter(|p| !p.is_empty() && *p != "." && *p != ".."));
            }
            s => segments.push(s),
        }
    }
    segments
}

/// Percent-encode a single path segment for use in an `href`
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
