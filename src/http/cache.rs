//! HTTP cache validation module
//!
//! Provides `ETag` generation, `Last-Modified` dates and the conditional
//! request check shared by every static file response.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate an `ETag` from file size and modification time.
///
/// Files are streamed, so the tag cannot depend on their content.
///
/// # Returns
/// Quoted `ETag` string, e.g., `"1a-17f3c2b9e0d41a00"`
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let nanos = modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{len:x}-{nanos:x}\"")
}

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parse an IMF-fixdate as sent in `If-Modified-Since`
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Conditional request headers relevant to static files
#[derive(Debug, Default, Clone, Copy)]
pub struct Validators<'a> {
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

/// Whether the client's cached copy is still current (answer with 304).
///
/// `If-None-Match` takes precedence; `If-Modified-Since` is only consulted
/// when it is absent. Weak tags compare equal to their strong form.
pub fn is_not_modified(validators: Validators<'_>, etag: &str, modified: Option<SystemTime>) -> bool {
    if let Some(client_tags) = validators.if_none_match {
        return client_tags.split(',').map(str::trim).any(|tag| {
            tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag
        });
    }

    let (Some(since), Some(modified)) = (
        validators.if_modified_since.and_then(parse_http_date),
        modified,
    ) else {
        return false;
    };
    // HTTP dates have second precision
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}
