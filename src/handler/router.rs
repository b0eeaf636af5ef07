//! Request dispatch module
//!
//! Entry point for HTTP request processing: classify the request, hand it to
//! the preflight, proxy or static-file behavior, then finalize headers.

use crate::config::Config;
use crate::handler::proxy::{self, Upstream};
use crate::handler::static_files::{DirectoryFiles, StaticFiles};
use crate::http::{self, cors};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{HeaderMap, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Uri};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Instant;

/// Per-process request dispatcher; immutable once built
pub struct Dispatcher<S = DirectoryFiles> {
    static_files: S,
    upstream: Upstream,
    /// Reserved request-target prefix, e.g. `/api/`
    prefix: String,
    /// Access log format, `None` when access logging is off
    access_log: Option<String>,
}

impl Dispatcher<DirectoryFiles> {
    /// Build the dispatcher described by the startup configuration.
    /// Fails if the static root cannot be opened.
    pub fn from_config(config: &Config) -> std::io::Result<Self> {
        let static_files = DirectoryFiles::from_config(&config.static_files)?;
        let upstream = Upstream::from_config(&config.upstream);
        let access_log = config
            .logging
            .access_log
            .then(|| config.logging.access_log_format.clone());

        Ok(Self::new(static_files, upstream, &config.upstream.prefix).with_access_log(access_log))
    }
}

impl<S: StaticFiles> Dispatcher<S> {
    pub fn new(static_files: S, upstream: Upstream, prefix: &str) -> Self {
        Self {
            static_files,
            upstream,
            prefix: prefix.to_string(),
            access_log: None,
        }
    }

    #[must_use]
    pub fn with_access_log(mut self, format: Option<String>) -> Self {
        self.access_log = format;
        self
    }

    /// hyper service entry point: dispatch, then write the access log line
    pub async fn handle_request(
        &self,
        req: Request<Incoming>,
        peer_addr: SocketAddr,
    ) -> Result<Response<Full<Bytes>>, Infallible> {
        let started = Instant::now();
        let (parts, _body) = req.into_parts();

        let response = self.dispatch(&parts.method, &parts.uri, &parts.headers).await;

        if let Some(format) = &self.access_log {
            let mut entry = AccessLogEntry::new(
                peer_addr.ip().to_string(),
                parts.method.to_string(),
                parts.uri.path().to_string(),
            );
            entry.query = parts.uri.query().map(ToString::to_string);
            entry.http_version = logger::version_label(parts.version).to_string();
            entry.status = response.status().as_u16();
            entry.body_bytes = response
                .body()
                .size_hint()
                .exact()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0);
            entry.referer = header_string(&parts.headers, REFERER.as_str());
            entry.user_agent = header_string(&parts.headers, USER_AGENT.as_str());
            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            logger::log_access(&entry, format);
        }

        Ok(response)
    }

    /// Produce exactly one response for a request
    ///
    /// 1. `OPTIONS` (any target) answers the preflight
    /// 2. `GET` under the reserved prefix goes upstream
    /// 3. `GET`/`HEAD` otherwise is served from the static root
    /// 4. anything else is 501
    ///
    /// Every response gets the CORS headers; reserved-prefix responses also
    /// get the no-cache headers.
    pub async fn dispatch(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
    ) -> Response<Full<Bytes>> {
        let target = request_target(uri);
        let proxied = is_proxied(target, &self.prefix);

        let mut response = match method {
            &Method::OPTIONS => http::build_options_response(),
            &Method::GET if proxied => proxy::forward(&self.upstream, target).await,
            &Method::GET => self.static_files.serve(target, headers, false).await,
            &Method::HEAD => self.static_files.serve(target, headers, true).await,
            _ => {
                logger::log_warning(&format!("Unsupported method: {method} {target}"));
                http::build_501_response()
            }
        };

        finalize_headers(response.headers_mut(), proxied);
        response
    }
}

/// Whether a request target belongs to the upstream
pub fn is_proxied(target: &str, prefix: &str) -> bool {
    target.starts_with(prefix)
}

/// Path plus query exactly as the client sent it
fn request_target(uri: &Uri) -> &str {
    uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str())
}

/// Last step before headers go out
fn finalize_headers(headers: &mut HeaderMap, proxied: bool) {
    cors::apply_cors(headers);
    if proxied {
        cors::apply_no_cache(headers);
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
