//! MIME type detection module
//!
//! Registry content is mostly JSON and images; the table covers what
//! actually lives in the chain and validator registries plus common web types.

use std::path::Path;

const OCTET_STREAM: &str = "application/octet-stream";
const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Content-Type for a served file, from its extension (case-insensitive).
///
/// Files without a known extension are sniffed: UTF-8 text without NUL
/// bytes is served as plain text, anything else as an octet stream.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use planetarium::http::mime::content_type;
/// assert_eq!(content_type(Path::new("cosmoshub/chain.json"), b"{}"), "application/json");
/// assert_eq!(content_type(Path::new("LICENSE"), b"MIT"), "text/plain; charset=utf-8");
/// ```
pub fn content_type(path: &Path, content: &[u8]) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    extension
        .as_deref()
        .and_then(by_extension)
        .unwrap_or_else(|| sniff(content))
}

fn by_extension(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        "json" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "txt" => PLAIN_TEXT,
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        _ => return None,
    };
    Some(mime)
}

fn sniff(content: &[u8]) -> &'static str {
    // Only the first 512 bytes are inspected, so a multi-byte character cut
    // at the boundary is tolerated
    let head = &content[..content.len().min(512)];
    let text = match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    if text && !head.contains(&0) {
        PLAIN_TEXT
    } else {
        OCTET_STREAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_types() {
        assert_eq!(
            content_type(Path::new("osmosis/assetlist.json"), b""),
            "application/json"
        );
        assert_eq!(content_type(Path::new("osmosis/images/osmo.png"), b""), "image/png");
        assert_eq!(content_type(Path::new("osmosis/images/osmo.svg"), b""), "image/svg+xml");
        assert_eq!(
            content_type(Path::new("README.md"), b""),
            "text/markdown; charset=utf-8"
        );
    }

    #[test]
    fn test_extension_case_is_ignored() {
        assert_eq!(content_type(Path::new("logo.PNG"), b""), "image/png");
        assert_eq!(content_type(Path::new("chain.JSON"), b""), "application/json");
    }

    #[test]
    fn test_sniffing_unknown_files() {
        assert_eq!(content_type(Path::new("LICENSE"), b"Apache License"), PLAIN_TEXT);
        assert_eq!(content_type(Path::new("blob.bin"), &[0, 159, 146, 150]), OCTET_STREAM);
        assert_eq!(content_type(Path::new("empty"), b""), PLAIN_TEXT);
    }
}
