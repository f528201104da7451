//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! normalization, route matching and prefix stripping.

use crate::config::AppState;
use crate::handler::static_files::FileServer;
use crate::http::cache::Conditionals;
use crate::http::{self, path, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{
    HeaderMap, HeaderName, CONTENT_LENGTH, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE,
    IF_UNMODIFIED_SINCE, RANGE, REFERER, USER_AGENT,
};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Path as seen by the handler, after the route prefix was stripped
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub conditionals: Conditionals,
    pub range_header: Option<String>,
}

impl<'a> RequestContext<'a> {
    pub fn new(path: &'a str, query: Option<&'a str>, is_head: bool, headers: &HeaderMap) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path,
            query,
            is_head,
            conditionals: Conditionals {
                if_match: header(IF_MATCH),
                if_none_match: header(IF_NONE_MATCH),
                if_modified_since: header(IF_MODIFIED_SINCE),
                if_unmodified_since: header(IF_UNMODIFIED_SINCE),
                if_range: header(IF_RANGE),
            },
            range_header: header(RANGE),
        }
    }

    /// Append the original query string to a redirect target
    pub fn with_query(&self, location: &str) -> String {
        with_query(location, self.query)
    }
}

fn with_query(location: &str, query: Option<&str>) -> String {
    match query {
        Some(q) => format!("{location}?{q}"),
        None => location.to_string(),
    }
}

/// A registered route
pub struct Route {
    /// `/x/` matches the whole subtree, `/x` only itself
    pattern: String,
    strip_prefix: Option<String>,
    files: FileServer,
}

/// Result of matching a clean path against the route table
pub enum Dispatch<'a> {
    Serve {
        files: &'a FileServer,
        path: &'a str,
    },
    Redirect(String),
    NotFound,
}

/// Path-prefix route table; the longest matching pattern wins
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `files` under `pattern`, stripping `strip_prefix` from the
    /// path before the handler sees it.
    pub fn route(&mut self, pattern: &str, strip_prefix: Option<&str>, files: FileServer) {
        self.routes.push(Route {
            pattern: pattern.to_string(),
            strip_prefix: strip_prefix.map(ToString::to_string),
            files,
        });
    }

    /// Match a clean path
    pub fn dispatch<'a>(&'a self, path: &'a str) -> Dispatch<'a> {
        let Some(route) = self.lookup(path) else {
            // `/docs` with only `/docs/` registered
            let with_slash = format!("{path}/");
            if self.routes.iter().any(|r| r.pattern == with_slash) {
                return Dispatch::Redirect(with_slash);
            }
            return Dispatch::NotFound;
        };

        let stripped = match &route.strip_prefix {
            Some(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None => return Dispatch::NotFound,
            },
            None => path,
        };

        Dispatch::Serve {
            files: &route.files,
            path: stripped,
        }
    }

    fn lookup(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| {
                if r.pattern.ends_with('/') {
                    path.starts_with(r.pattern.as_str())
                } else {
                    path == r.pattern
                }
            })
            .max_by_key(|r| r.pattern.len())
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    // Request bodies are never read
    let (parts, _) = req.into_parts();
    let response = respond(&parts, &state).await;

    if state.access_log {
        log_access(&parts, &response, remote_addr, started, &state);
    }

    Ok(response)
}

/// Produce the response for one request
pub async fn respond(req: &Parts, state: &AppState) -> Response<ResponseBody> {
    let method = &req.method;

    // 1. Only safe methods are served
    if method != Method::GET && method != Method::HEAD {
        return http::build_405_response();
    }
    let is_head = method == Method::HEAD;

    // 2. Decode and normalize the path
    let query = req.uri.query();
    let Some(decoded) = path::decode_path(req.uri.path()) else {
        return http::build_400_response();
    };
    let clean = path::clean_path(&decoded);
    if clean != decoded {
        let location = with_query(&path::encode_path(&clean), query);
        return http::build_redirect_response(&location, is_head);
    }

    // 3. Match and strip
    match state.router.dispatch(&clean) {
        Dispatch::Serve {
            files,
            path: stripped,
        } => {
            let ctx = RequestContext::new(stripped, query, is_head, &req.headers);
            files.serve(&ctx).await
        }
        Dispatch::Redirect(target) => {
            let location = with_query(&path::encode_path(&target), query);
            http::build_redirect_response(&location, is_head)
        }
        Dispatch::NotFound => http::build_404_response(),
    }
}

fn log_access(
    req: &Parts,
    response: &Response<ResponseBody>,
    remote_addr: SocketAddr,
    started: Instant,
    state: &AppState,
) {
    let header = |name: HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        remote_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_str(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = if req.method == Method::HEAD {
        0
    } else {
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    };
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
