//! Static file serving module
//!
//! The dispatcher reaches the filesystem only through [`StaticFiles`], so the
//! file server can be swapped out. [`DirectoryFiles`] serves a fixed root.

use crate::config::StaticFilesConfig;
use crate::http::{self, cache, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use hyper::Response;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// File-serving collaborator of the dispatcher
pub trait StaticFiles: Send + Sync + 'static {
    /// Answer a GET (or HEAD when `is_head`) for `target`, the raw request
    /// target including any query string. Always produces a response.
    fn serve(
        &self,
        target: &str,
        headers: &HeaderMap,
        is_head: bool,
    ) -> impl Future<Output = Response<Full<Bytes>>> + Send;
}

/// Cache validators sent with a conditional GET
#[derive(Debug, Clone, Copy)]
struct Validators<'a> {
    if_none_match: Option<&'a str>,
    if_modified_since: Option<&'a str>,
}

impl<'a> Validators<'a> {
    fn from_headers(headers: &'a HeaderMap) -> Self {
        let get = move |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            if_none_match: get(IF_NONE_MATCH),
            if_modified_since: get(IF_MODIFIED_SINCE),
        }
    }

    /// `If-None-Match` wins; `If-Modified-Since` is only consulted without it
    fn not_modified(&self, etag: &str, modified: Option<SystemTime>) -> bool {
        if self.if_none_match.is_some() {
            return cache::check_etag_match(self.if_none_match, etag);
        }
        modified.is_some_and(|m| cache::check_not_modified_since(self.if_modified_since, m))
    }
}

/// Serves files below one root directory
#[derive(Debug, Clone)]
pub struct DirectoryFiles {
    /// Canonical root; every served path must stay below it
    root: PathBuf,
    index_files: Vec<String>,
}

impl DirectoryFiles {
    /// Open the root directory. Fails if it does not exist or is not a directory.
    pub fn open(root: impl AsRef<Path>, index_files: Vec<String>) -> io::Result<Self> {
        let root = root.as_ref().canonicalize().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("static root '{}': {e}", root.as_ref().display()),
            )
        })?;
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("static root '{}' is not a directory", root.display()),
            ));
        }
        Ok(Self { root, index_files })
    }

    pub fn from_config(config: &StaticFilesConfig) -> io::Result<Self> {
        Self::open(&config.root, config.index_files.clone())
    }

    async fn serve_target(
        &self,
        target: &str,
        validators: Validators<'_>,
        is_head: bool,
    ) -> Response<Full<Bytes>> {
        let (raw_path, query) = split_target(target);

        let Ok(decoded) = urlencoding::decode(raw_path) else {
            return http::build_404_response();
        };

        // File not found is common (404), no need to log at warning level
        let Ok(resolved) = fs::canonicalize(self.root.join(decoded.trim_start_matches('/'))).await
        else {
            return http::build_404_response();
        };
        if !resolved.starts_with(&self.root) {
            logger::log_warning(&format!(
                "Path traversal attempt blocked: {} -> {}",
                raw_path,
                resolved.display()
            ));
            return http::build_404_response();
        }

        let Ok(metadata) = fs::metadata(&resolved).await else {
            return http::build_404_response();
        };

        let file_path = if metadata.is_dir() {
            if !raw_path.ends_with('/') {
                return http::build_redirect_response(&directory_location(raw_path, query));
            }
            match self.find_index(&resolved).await {
                Some(index) => index,
                None => return http::build_404_response(),
            }
        } else {
            resolved
        };

        self.load(&file_path, validators, is_head).await
    }

    async fn find_index(&self, dir: &Path) -> Option<PathBuf> {
        for name in &self.index_files {
            let candidate = dir.join(name);
            if let Ok(meta) = fs::metadata(&candidate).await {
                if meta.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    async fn load(
        &self,
        file_path: &Path,
        validators: Validators<'_>,
        is_head: bool,
    ) -> Response<Full<Bytes>> {
        let content = match fs::read(file_path).await {
            Ok(c) => c,
            Err(e) => {
                logger::log_error(&format!(
                    "Failed to read file '{}': {}",
                    file_path.display(),
                    e
                ));
                return http::build_404_response();
            }
        };

        let etag = cache::generate_etag(&content);
        let modified = fs::metadata(file_path)
            .await
            .and_then(|m| m.modified())
            .ok();
        if validators.not_modified(&etag, modified) {
            return http::build_304_response(&etag);
        }

        let last_modified = modified.map(cache::http_date);

        http::response::build_file_response(
            Bytes::from(content),
            mime::content_type_for(file_path),
            &etag,
            last_modified.as_deref(),
            is_head,
        )
    }
}

impl StaticFiles for DirectoryFiles {
    fn serve(
        &self,
        target: &str,
        headers: &HeaderMap,
        is_head: bool,
    ) -> impl Future<Output = Response<Full<Bytes>>> + Send {
        self.serve_target(target, Validators::from_headers(headers), is_head)
    }
}

/// Split a request target into path and query, dropping any fragment
fn split_target(target: &str) -> (&str, Option<&str>) {
    let target = target.split('#').next().unwrap_or(target);
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Location for a directory requested without its trailing slash
fn directory_location(path: &str, query: Option<&str>) -> String {
    query.map_or_else(|| format!("{path}/"), |q| format!("{path}/?{q}"))
}
