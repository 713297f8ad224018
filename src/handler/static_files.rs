//! Static file serving module
//!
//! [`StaticRouter`] claims every request under the reserved asset prefix
//! before the middleware pipeline runs, strips the prefix, and hands the rest
//! of the path to [`StaticFiles`].

use crate::http::response::CONTENT_TYPE_TEXT;
use crate::http::{mime, WireResponse, NOT_FOUND_BODY};
use crate::logger;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Serves files from one root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serve the file at `path` (relative to the root) or the default 404
    pub async fn serve(&self, path: &str) -> WireResponse {
        match self.load(path).await {
            Some((content, content_type)) => WireResponse::new(200, content_type, content),
            None => WireResponse::new(404, CONTENT_TYPE_TEXT, NOT_FOUND_BODY),
        }
    }

    /// Load a file below the root, refusing anything that escapes it
    async fn load(&self, path: &str) -> Option<(Vec<u8>, &'static str)> {
        let relative = sanitize(path)?;
        let file_path = self.root.join(&relative);

        let root_canonical = match fs::canonicalize(&self.root).await {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Static directory not found or inaccessible '{}': {e}",
                    self.root.display()
                ));
                return None;
            }
        };

        // File not found is common (404), no need to log at warning level
        let Ok(file_canonical) = fs::canonicalize(&file_path).await else {
            return None;
        };
        if !file_canonical.starts_with(&root_canonical) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                path,
                file_canonical.display()
            ));
            return None;
        }
        if !fs::metadata(&file_canonical).await.is_ok_and(|m| m.is_file()) {
            return None;
        }

        match fs::read(&file_canonical).await {
            Ok(content) => Some((content, mime::content_type_for(&file_canonical))),
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    file_canonical.display()
                ));
                None
            }
        }
    }
}

/// Turn a URL path into a relative filesystem path, rejecting `..` and roots
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for component in Path::new(path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

/// Intercepts the reserved static prefix ahead of routing and middleware
#[derive(Debug, Clone)]
pub struct StaticRouter {
    prefix: String,
    files: StaticFiles,
}

impl StaticRouter {
    /// `prefix` is normalized to a leading slash and no trailing slash
    pub fn new(prefix: &str, files: StaticFiles) -> Self {
        let trimmed = prefix.trim_matches('/');
        Self {
            prefix: format!("/{trimmed}"),
            files,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The path with the prefix removed, if `path` is under the prefix
    ///
    /// Only whole segments count: with prefix `/static`, `/static/a.css` and
    /// `/static` are claimed, `/statics` is not.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        (rest.is_empty() || rest.starts_with('/') || self.prefix == "/").then_some(rest)
    }

    pub async fn serve(&self, stripped: &str) -> WireResponse {
        logger::log_debug(&format!("Serving static asset {stripped}"));
        self.files.serve(stripped).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FIXTURE_ID: AtomicUsize = AtomicUsize::new(0);

    fn fixture_dir() -> PathBuf {
        let id = FIXTURE_ID.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "lumos-static-{}-{id}",
            std::process::id()
        ));
        std::fs::create_dir_all(dir.join("css")).unwrap();
        std::fs::write(dir.join("css/main.css"), "body {background-color: #d0e4fe}").unwrap();
        dir
    }

    #[test]
    fn test_strip_prefix() {
        let router = StaticRouter::new("/static/", StaticFiles::new("unused"));
        assert_eq!(router.prefix(), "/static");
        assert_eq!(router.strip("/static/css/main.css"), Some("/css/main.css"));
        assert_eq!(router.strip("/static"), Some(""));
        assert_eq!(router.strip("/statics/x"), None);
        assert_eq!(router.strip("/home"), None);
    }

    #[test]
    fn test_sanitize_rejects_traversal() {
        assert!(sanitize("/../Cargo.toml").is_none());
        assert!(sanitize("/css/../../etc/passwd").is_none());
        assert!(sanitize("/").is_none());
        assert_eq!(sanitize("/css/./main.css"), Some(PathBuf::from("css/main.css")));
    }

    #[tokio::test]
    async fn test_serves_existing_file() {
        let dir = fixture_dir();
        let files = StaticFiles::new(&dir);
        let resp = files.serve("/css/main.css").await;
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, "text/css");
        assert_eq!(resp.text(), "body {background-color: #d0e4fe}");
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = fixture_dir();
        let files = StaticFiles::new(&dir);
        let resp = files.serve("/main.css)").await;
        assert_eq!(resp.status, 404);
        assert_eq!(resp.text(), NOT_FOUND_BODY);
        assert_eq!(files.serve("/css").await.status, 404);
        assert_eq!(files.serve("/../css/main.css").await.status, 404);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_is_404() {
        let files = StaticFiles::new("/definitely/not/a/lumos/dir");
        assert_eq!(files.serve("/main.css").await.status, 404);
    }
}
