//! Upstream proxy module
//!
//! Forwards reserved-prefix GET requests to the backend and relays the answer.
//! The whole upstream body is buffered before the client response is built.

use crate::config::UpstreamConfig;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::time::Duration;

/// Body sent when the upstream reports an error without a body of its own
pub const FALLBACK_ERROR_BODY: &str = r#"{"error": "API request failed"}"#;

/// Redirect hops followed before the last redirect is reported as an error
pub const MAX_REDIRECTS: usize = 10;

/// Upstream headers never copied to the client (compared case-insensitively)
const STRIPPED_HEADERS: &[&str] = &[
    "connection",
    "transfer-encoding",
    // The gateway sets its own CORS origin
    "access-control-allow-origin",
];

/// Ways an upstream call can fail without an HTTP status to relay
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidUri {
        url: String,
        #[source]
        source: hyper::http::uri::InvalidUri,
    },

    #[error("{}", error_chain(.0))]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read upstream response body: {0}")]
    Body(#[from] hyper::Error),

    #[error("upstream did not respond within {} seconds", .0.as_secs_f64())]
    Timeout(Duration),
}

/// Fully buffered upstream answer
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The backend service behind the reserved prefix
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Empty<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl Upstream {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // A fresh connection per request; idle connections are not kept
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build_http();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(&config.base_url, config.timeout())
    }

    /// Upstream base followed by the request target, verbatim
    pub fn target_url(&self, target: &str) -> String {
        format!("{}{}", self.base_url, target)
    }

    /// GET the target from the upstream and buffer the whole response.
    ///
    /// Redirects (301, 302, 303, 307, 308) are followed up to
    /// [`MAX_REDIRECTS`] hops. The timeout covers every hop.
    pub async fn fetch(&self, target: &str) -> Result<UpstreamResponse, ProxyError> {
        let url = self.target_url(target);
        let uri: Uri = url
            .parse()
            .map_err(|source| ProxyError::InvalidUri { url: url.clone(), source })?;

        let exchange = async {
            let mut uri = uri;
            let mut hops = 0;
            loop {
                let response = self.client.get(uri.clone()).await?;
                let (parts, body) = response.into_parts();
                let body = body.collect().await?.to_bytes();

                if hops < MAX_REDIRECTS && is_followed_redirect(parts.status) {
                    if let Some(next) = redirect_target(&uri, &parts.headers) {
                        hops += 1;
                        uri = next;
                        continue;
                    }
                }

                return Ok::<_, ProxyError>(UpstreamResponse {
                    status: parts.status,
                    headers: parts.headers,
                    body,
                });
            }
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| ProxyError::Timeout(self.timeout))?
    }
}

/// Fetch `target` from the upstream and turn the outcome into a client response
pub async fn forward(upstream: &Upstream, target: &str) -> Response<Full<Bytes>> {
    let result = upstream.fetch(target).await;
    if let Err(ref err) = result {
        logger::log_error(&format!(
            "Upstream request {} failed: {err}",
            upstream.target_url(target)
        ));
    }
    relay(result)
}

/// Map an upstream outcome to the response sent to the client
///
/// - 1xx/2xx: status, filtered headers and body relayed as-is
/// - 3xx left after redirect following, 4xx and 5xx: status relayed with a JSON body
/// - no response at all: 502 with `{"error": "<description>"}`
pub fn relay(result: Result<UpstreamResponse, ProxyError>) -> Response<Full<Bytes>> {
    match result {
        Ok(upstream) if upstream.status.as_u16() >= 300 => relay_error(upstream),
        Ok(upstream) => relay_success(upstream),
        Err(err) => http::build_json_error(StatusCode::BAD_GATEWAY, &err.to_string()),
    }
}

fn relay_success(upstream: UpstreamResponse) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    let mut last_name: Option<HeaderName> = None;
    for (name, value) in upstream.headers {
        // HeaderMap iteration yields the name only on the first value of a header
        if let Some(name) = name {
            last_name = Some(name);
        }
        if let Some(ref name) = last_name {
            if !is_stripped(name) {
                headers.append(name.clone(), value);
            }
        }
    }

    response
}

fn relay_error(upstream: UpstreamResponse) -> Response<Full<Bytes>> {
    let body = if upstream.body.is_empty() {
        Bytes::from_static(FALLBACK_ERROR_BODY.as_bytes())
    } else {
        upstream.body
    };

    let mut response = Response::new(Full::new(body));
    *response.status_mut() = upstream.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

const fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Where a redirect response points, if it can be followed over plain HTTP
fn redirect_target(current: &Uri, headers: &HeaderMap) -> Option<Uri> {
    let location = headers.get(LOCATION)?.to_str().ok()?.trim();
    resolve_location(current, location)
}

/// Resolve a `Location` value against the URL that produced it
fn resolve_location(current: &Uri, location: &str) -> Option<Uri> {
    if let Some(rest) = location.strip_prefix("//") {
        return resolve_location(current, &format!("http://{rest}"));
    }

    if location.contains("://") {
        let uri: Uri = location.parse().ok()?;
        return (uri.scheme_str() == Some("http") && uri.authority().is_some()).then_some(uri);
    }

    let current_path = current.path();
    let path_and_query = if location.starts_with('/') {
        location.to_string()
    } else if location.starts_with('?') {
        format!("{current_path}{location}")
    } else {
        let dir = current_path.rfind('/').map_or("/", |i| &current_path[..=i]);
        format!("{dir}{location}")
    };

    Uri::builder()
        .scheme(current.scheme()?.clone())
        .authority(current.authority()?.clone())
        .path_and_query(path_and_query)
        .build()
        .ok()
}

/// `HeaderName` is always lowercase, so an exact comparison is case-insensitive
fn is_stripped(name: &HeaderName) -> bool {
    STRIPPED_HEADERS.contains(&name.as_str())
}

/// Display an error followed by its sources, e.g. `client error (Connect): tcp connect error: Connection refused`
fn error_chain(err: &dyn StdError) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.contains(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}
