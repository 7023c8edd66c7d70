//! Static bundle serving module
//!
//! Resolves request paths inside the bundle root and serves file bytes
//! with MIME detection, conditional requests and byte ranges.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::StaticSiteConfig;
use crate::http::{self, cache, mime, ByteRange};
use crate::logger;

/// Conditional headers extracted from a static request
#[derive(Debug, Default, Clone)]
pub struct Conditions {
    pub if_none_match: Option<String>,
    pub range: Option<String>,
}

/// Resolution of a request path against the bundle root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing regular file
    File(PathBuf),
    /// An existing directory containing the entry document
    /// (carries the path of that entry document)
    DirWithIndex(PathBuf),
    /// Nothing on disk, candidate for the SPA fallback
    NotFound,
}

/// Responder over the bundle root directory
pub struct StaticFiles {
    root: PathBuf,
    entry_document: String,
}

impl StaticFiles {
    pub fn new(config: &StaticSiteConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            entry_document: config.entry_document.clone(),
        }
    }

    /// Resolve a request path to a location under the bundle root
    ///
    /// Traversal sequences are neutralized before joining and the
    /// canonical result must stay inside the canonical root.
    pub fn resolve(&self, path: &str) -> Resolved {
        // Remove leading slash and neutralize traversal sequences
        let clean = path.trim_start_matches('/').replace("..", "");
        let candidate = self.root.join(clean.trim_start_matches('/'));

        let Ok(root) = self.root.canonicalize() else {
            logger::log_warning(&format!(
                "Bundle root not found or inaccessible: {}",
                self.root.display()
            ));
            return Resolved::NotFound;
        };

        // canonicalize doubles as the existence check; a miss here is the
        // common 404-shaped case that becomes the SPA fallback
        let Ok(candidate) = candidate.canonicalize() else {
            return Resolved::NotFound;
        };
        if !candidate.starts_with(&root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {path} -> {}",
                candidate.display()
            ));
            return Resolved::NotFound;
        }

        if candidate.is_file() {
            return Resolved::File(candidate);
        }
        if candidate.is_dir() {
            let index = candidate.join(&self.entry_document);
            if index.is_file() {
                return Resolved::DirWithIndex(index);
            }
        }
        Resolved::NotFound
    }

    /// Serve a resolved file's bytes
    pub async fn serve_file(&self, file_path: &Path, cond: &Conditions) -> Response<Full<Bytes>> {
        let content = match fs::read(file_path).await {
            Ok(content) => content,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {e}",
                    file_path.display()
                ));
                return http::build_404_response();
            }
        };
        let content_type =
            mime::content_type_for(file_path.extension().and_then(|ext| ext.to_str()));
        build_conditional_response(content, content_type, cond)
    }

    /// Serve the root entry document (SPA fallback)
    ///
    /// Client-side-routed URLs resolve to nothing on disk; they get the
    /// application shell with status 200, never a 404.
    pub async fn serve_entry_document(&self, cond: &Conditions) -> Response<Full<Bytes>> {
        let entry = self.root.join(&self.entry_document);
        let content = match fs::read(&entry).await {
            Ok(content) => content,
            Err(e) => {
                logger::log_error(&format!(
                    "Entry document missing at '{}': {e}",
                    entry.display()
                ));
                return http::build_404_response();
            }
        };
        let content_type =
            mime::content_type_for(entry.extension().and_then(|ext| ext.to_str()));
        build_conditional_response(content, content_type, cond)
    }
}

/// Build the response for file content, honoring conditional and range headers
fn build_conditional_response(
    content: Vec<u8>,
    content_type: &str,
    cond: &Conditions,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&content);
    if cache::not_modified(cond.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    let total_size = content.len();
    match http::resolve_range(cond.range.as_deref(), total_size) {
        ByteRange::Partial { start, end } => http::build_partial_response(
            Bytes::from(content[start..=end].to_vec()),
            content_type,
            &etag,
            start,
            end,
            total_size,
        ),
        ByteRange::Unsatisfiable => http::build_416_response(total_size),
        ByteRange::Full => http::build_file_response(Bytes::from(content), content_type, &etag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn bundle_with(files: &[(&str, &str)]) -> (tempfile::TempDir, StaticFiles) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        let static_files = StaticFiles::new(&StaticSiteConfig {
            root: dir.path().to_string_lossy().into_owned(),
            entry_document: "index.html".to_string(),
        });
        (dir, static_files)
    }

    async fn body_of(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_resolve_existing_file() {
        let (_dir, sf) = bundle_with(&[("index.html", "<html>"), ("assets/app.js", "js")]);
        assert!(matches!(sf.resolve("/assets/app.js"), Resolved::File(_)));
    }

    #[test]
    fn test_resolve_directory_with_index() {
        let (_dir, sf) = bundle_with(&[("admin/index.html", "<admin>")]);
        match sf.resolve("/admin") {
            Resolved::DirWithIndex(index) => assert!(index.ends_with("admin/index.html")),
            other => panic!("expected DirWithIndex, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_root_serves_index() {
        let (_dir, sf) = bundle_with(&[("index.html", "<html>")]);
        assert!(matches!(sf.resolve("/"), Resolved::DirWithIndex(_)));
    }

    #[test]
    fn test_resolve_missing_path() {
        let (_dir, sf) = bundle_with(&[("index.html", "<html>")]);
        assert_eq!(sf.resolve("/dashboard/42"), Resolved::NotFound);
    }

    #[test]
    fn test_resolve_directory_without_index_falls_through() {
        let (_dir, sf) = bundle_with(&[("index.html", "<html>"), ("assets/app.js", "js")]);
        // a directory with no entry document is not listed, it falls back
        assert_eq!(sf.resolve("/assets"), Resolved::NotFound);
    }

    #[test]
    fn test_traversal_cannot_escape_root() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        let root = outer.path().join("bundle");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("index.html"), "<html>").unwrap();

        let sf = StaticFiles::new(&StaticSiteConfig {
            root: root.to_string_lossy().into_owned(),
            entry_document: "index.html".to_string(),
        });
        assert_eq!(sf.resolve("/../secret.txt"), Resolved::NotFound);
        assert_eq!(sf.resolve("/..%2Fsecret.txt"), Resolved::NotFound);
    }

    #[tokio::test]
    async fn test_serve_file_bytes_and_type() {
        let (_dir, sf) = bundle_with(&[("assets/app.js", "console.log(1)")]);
        let Resolved::File(path) = sf.resolve("/assets/app.js") else {
            panic!("expected file");
        };
        let resp = sf.serve_file(&path, &Conditions::default()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "application/javascript"
        );
        assert_eq!(body_of(resp).await, Bytes::from_static(b"console.log(1)"));
    }

    #[tokio::test]
    async fn test_spa_fallback_serves_entry_document() {
        let (_dir, sf) = bundle_with(&[("index.html", "<app shell>"), ("assets/app.js", "js")]);
        assert_eq!(sf.resolve("/dashboard/42"), Resolved::NotFound);
        let resp = sf.serve_entry_document(&Conditions::default()).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(body_of(resp).await, Bytes::from_static(b"<app shell>"));
    }

    #[tokio::test]
    async fn test_missing_entry_document_is_404() {
        let (_dir, sf) = bundle_with(&[("assets/app.js", "js")]);
        let resp = sf.serve_entry_document(&Conditions::default()).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_conditional_request_yields_304() {
        let (_dir, sf) = bundle_with(&[("index.html", "<html>")]);
        let Resolved::DirWithIndex(path) = sf.resolve("/") else {
            panic!("expected index");
        };
        let first = sf.serve_file(&path, &Conditions::default()).await;
        let etag = first.headers().get("ETag").unwrap().to_str().unwrap().to_string();

        let second = sf
            .serve_file(
                &path,
                &Conditions {
                    if_none_match: Some(etag),
                    range: None,
                },
            )
            .await;
        assert_eq!(second.status(), 304);
    }

    #[tokio::test]
    async fn test_range_request_yields_partial() {
        let (_dir, sf) = bundle_with(&[("data.txt", "0123456789")]);
        let Resolved::File(path) = sf.resolve("/data.txt") else {
            panic!("expected file");
        };
        let resp = sf
            .serve_file(
                &path,
                &Conditions {
                    if_none_match: None,
                    range: Some("bytes=0-3".to_string()),
                },
            )
            .await;
        assert_eq!(resp.status(), 206);
        assert_eq!(body_of(resp).await, Bytes::from_static(b"0123"));
    }
}
