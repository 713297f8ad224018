//! MIME type detection module
//!
//! Maps a static asset's file extension to the Content-Type it is served with.

use std::path::Path;

const FALLBACK: &str = "application/octet-stream";

/// Content-Type for a file path, decided by its (case-insensitive) extension
///
/// # Examples
/// ```
/// use lumos::http::mime::content_type_for;
/// use std::path::Path;
/// assert_eq!(content_type_for(Path::new("css/main.css")), "text/css");
/// assert_eq!(content_type_for(Path::new("logo.PNG")), "image/png");
/// assert_eq!(content_type_for(Path::new("LICENSE")), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(FALLBACK, |ext| by_extension(&ext.to_ascii_lowercase()))
}

fn by_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css",
        "txt" | "md" => "text/plain; charset=utf-8",
        "csv" => "text/csv",
        "xml" => "application/xml",

        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "wasm" => "application/wasm",

        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",

        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",

        "pdf" => "application/pdf",
        "zip" => "application/zip",

        _ => FALLBACK,
    }
}
