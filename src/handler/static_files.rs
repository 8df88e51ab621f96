//! Static registry content
//!
//! Serves files and directory listings below a registry root with the usual
//! file-server behavior: index files, slash redirects, conditional and
//! range requests, and no access above the root. File bodies are streamed
//! from disk in chunks.

use std::io::{self, ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use futures_util::stream;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::{Bytes, Frame};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::handler::router::RequestContext;
use crate::http::response::{self, FileHeaders};
use crate::http::{self, cache, mime, path, ByteRange, HttpResponse, ResponseBody};
use crate::logger;
use crate::registry::RegistryRoot;

/// File served in place of a listing when a directory contains it
const INDEX_FILE: &str = "index.html";

/// Bytes read from disk per body frame
const CHUNK_SIZE: u64 = 64 * 1024;

/// Bytes inspected to sniff the type of files without a known extension
const SNIFF_LEN: u64 = 512;

/// Serve `relative` (already percent-decoded) from below `root`
pub async fn serve(ctx: &RequestContext<'_>, root: &RegistryRoot, relative: &str) -> HttpResponse {
    let target: PathBuf = path::clean_segments(relative)
        .into_iter()
        .fold(root.path().to_path_buf(), |acc, segment| acc.join(segment));

    let metadata = match fs::metadata(&target).await {
        Ok(metadata) => metadata,
        Err(err) => return io_error_response(&target, &err),
    };

    if !is_within_root(root.path(), &target).await {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            ctx.path,
            target.display()
        ));
        return http::build_404_response();
    }

    let wants_directory = relative.is_empty() || relative.ends_with('/');
    if metadata.is_dir() {
        if !wants_directory {
            return http::build_redirect_response(&format!("{}/", ctx.path));
        }
        let index = target.join(INDEX_FILE);
        if let Ok(index_metadata) = fs::metadata(&index).await {
            if index_metadata.is_file() {
                return serve_file(ctx, &index, index_metadata.modified().ok()).await;
            }
        }
        return serve_listing(&target).await;
    }

    if wants_directory {
        // A file asked for as a directory
        return http::build_redirect_response(ctx.path.trim_end_matches('/'));
    }
    serve_file(ctx, &target, metadata.modified().ok()).await
}

/// Resolve symlinks on both sides and require `target` to stay below `root`
async fn is_within_root(root: &Path, target: &Path) -> bool {
    let root = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Registry directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return false;
        }
    };
    fs::canonicalize(target)
        .await
        .is_ok_and(|target| target.starts_with(&root))
}

async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    modified: Option<SystemTime>,
) -> HttpResponse {
    let mut file = match File::open(file_path).await {
        Ok(file) => file,
        Err(err) => return io_error_response(file_path, &err),
    };
    let len = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(err) => return io_error_response(file_path, &err),
    };

    let etag = cache::generate_etag(len, modified);
    let last_modified = modified.map(cache::http_date);
    if cache::is_not_modified(ctx.validators(), &etag, modified) {
        return response::build_304_response(&etag, last_modified.as_deref());
    }

    let mut head = Vec::new();
    if let Err(err) = (&mut file).take(SNIFF_LEN).read_to_end(&mut head).await {
        return io_error_response(file_path, &err);
    }
    let headers = FileHeaders {
        content_type: mime::content_type(file_path, &head),
        etag: &etag,
        last_modified: last_modified.as_deref(),
    };

    let (start, end) = match http::resolve_range(ctx.range, len) {
        ByteRange::Unsatisfiable => return response::build_416_response(len),
        ByteRange::Full => (0, None),
        ByteRange::Partial { start, end } => (start, Some(end)),
    };
    if let Err(err) = file.seek(SeekFrom::Start(start)).await {
        return io_error_response(file_path, &err);
    }

    match end {
        None => response::build_file_response(file_body(file, len), len, &headers),
        Some(end) => {
            let body = file_body(file, end - start + 1);
            response::build_partial_response(body, start, end, len, &headers)
        }
    }
}

/// Stream the next `len` bytes of `file` in `CHUNK_SIZE` frames
fn file_body(file: File, len: u64) -> ResponseBody {
    let frames = stream::try_unfold((file, len), |(mut file, remaining)| async move {
        if remaining == 0 {
            return Ok(None);
        }
        let mut chunk = Vec::new();
        let read = (&mut file)
            .take(remaining.min(CHUNK_SIZE))
            .read_to_end(&mut chunk)
            .await?;
        if read == 0 {
            // Truncated while being served
            return Err(io::Error::from(ErrorKind::UnexpectedEof));
        }
        let left = remaining.saturating_sub(chunk.len() as u64);
        Ok(Some((Frame::data(Bytes::from(chunk)), (file, left))))
    });
    StreamBody::new(frames).boxed_unsync()
}

async fn serve_listing(dir: &Path) -> HttpResponse {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(err) => return io_error_response(dir, &err),
    };

    let mut entries = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let is_dir = entry.file_type().await.is_ok_and(|t| t.is_dir());
                entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
            }
            Ok(None) => break,
            Err(err) => return io_error_response(dir, &err),
        }
    }
    entries.sort();

    response::build_html_response(render_listing(&entries))
}

/// Minimal HTML index: one link per entry, directories suffixed with `/`
fn render_listing(entries: &[(String, bool)]) -> String {
    let mut html = String::from(
        "<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n",
    );
    for (name, is_dir) in entries {
        let slash = if *is_dir { "/" } else { "" };
        html.push_str(&format!(
            "<a href=\"{}{slash}\">{}{slash}</a>\n",
            path::encode_segment(name),
            path::escape_html(name),
        ));
    }
    html.push_str("</pre>\n");
    html
}

fn io_error_response(path: &Path, err: &std::io::Error) -> HttpResponse {
    match err.kind() {
        // Not found is the common case, no need to log it
        ErrorKind::NotFound | ErrorKind::NotADirectory => http::build_404_response(),
        ErrorKind::PermissionDenied => {
            logger::log_warning(&format!("Permission denied for '{}'", path.display()));
            http::build_403_response()
        }
        _ => {
            logger::log_error(&format!("Failed to read '{}': {err}", path.display()));
            http::build_500_response("500 internal server error")
        }
    }
}
