//! Static file serving module
//!
//! Resolves request paths under a root directory and streams files back,
//! with index files, directory listings, conditional requests and ranges.

use crate::config::HttpConfig;
use crate::error::ServeError;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::cache::{self, Precondition, Validators};
use crate::http::range::{ByteRange, RangeParseResult};
use crate::http::response::{self, ResponseBody};
use crate::http::{self, mime, path};
use crate::logger;
use futures::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
};
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// A request path that names the index file directly is redirected to its directory
const INDEX_PAGE: &str = "/index.html";

/// Directory-backed file handler
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
    index_files: Vec<String>,
    directory_listing: bool,
}

impl FileServer {
    pub fn new(root: PathBuf, http: &HttpConfig) -> Self {
        Self {
            root,
            index_files: http.index_files.clone(),
            directory_listing: http.directory_listing,
        }
    }

    /// Serve the path in `ctx` relative to the root
    pub async fn serve(&self, ctx: &RequestContext<'_>) -> Response<ResponseBody> {
        let upath = if ctx.path.starts_with('/') {
            ctx.path.to_string()
        } else {
            format!("/{}", ctx.path)
        };

        if upath.ends_with(INDEX_PAGE) {
            return http::build_redirect_response(&ctx.with_query("./"), ctx.is_head);
        }

        let (file_path, meta) = match self.resolve(&path::clean_path(&upath)).await {
            Ok(found) => found,
            Err(err) => return error_response(&err, &upath),
        };

        if meta.is_dir() {
            if !upath.ends_with('/') {
                let target = format!("{}/", path::encode_path(path::base_name(&upath)));
                return http::build_redirect_response(&ctx.with_query(&target), ctx.is_head);
            }
            return self.serve_directory(ctx, &file_path, &meta, &upath).await;
        }

        if upath.ends_with('/') {
            let target = format!("../{}", path::encode_path(path::base_name(&upath)));
            return http::build_redirect_response(&ctx.with_query(&target), ctx.is_head);
        }

        serve_file(ctx, &file_path, &meta, &upath).await
    }

    /// Map a clean request path onto the filesystem
    ///
    /// The path is joined onto the root segment by segment, then both are
    /// canonicalized so a symlink cannot lead outside the root.
    async fn resolve(&self, clean: &str) -> Result<(PathBuf, Metadata), ServeError> {
        if clean.contains('\0') {
            return Err(ServeError::NotFound);
        }

        let relative = clean.trim_matches('/');
        let full = if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        };

        let meta = fs::metadata(&full).await?;
        self.ensure_contained(&full).await?;
        Ok((full, meta))
    }

    async fn ensure_contained(&self, full: &Path) -> Result<(), ServeError> {
        let root = fs::canonicalize(&self.root).await?;
        let target = fs::canonicalize(full).await?;
        if !target.starts_with(&root) {
            logger::log_warning(&format!(
                "Path escape blocked: {} -> {}",
                full.display(),
                target.display()
            ));
            return Err(ServeError::NotFound);
        }
        Ok(())
    }

    async fn serve_directory(
        &self,
        ctx: &RequestContext<'_>,
        dir: &Path,
        meta: &Metadata,
        upath: &str,
    ) -> Response<ResponseBody> {
        for index in &self.index_files {
            let candidate = dir.join(index);
            let Ok(index_meta) = fs::metadata(&candidate).await else {
                continue;
            };
            if index_meta.is_file() && self.ensure_contained(&candidate).await.is_ok() {
                return serve_file(ctx, &candidate, &index_meta, upath).await;
            }
        }

        if !self.directory_listing {
            return http::build_error_response(&ServeError::Forbidden);
        }

        let validators = Validators::from_metadata(meta.modified().ok(), meta.len());
        match cache::evaluate_preconditions(&ctx.conditionals, &validators) {
            Precondition::NotModified => return http::build_304_response(&validators),
            Precondition::Failed => return http::build_412_response(),
            Precondition::Proceed => {}
        }

        match listing::read_entries(dir).await {
            Ok(entries) => response::build_html_response(
                listing::render_listing(&entries),
                validators.last_modified_header(),
                ctx.is_head,
            ),
            Err(e) => error_response(&ServeError::from(e), upath),
        }
    }
}

/// Serve a regular file: preconditions, optional range, then the stream
async fn serve_file(
    ctx: &RequestContext<'_>,
    file_path: &Path,
    meta: &Metadata,
    upath: &str,
) -> Response<ResponseBody> {
    let mut file = match File::open(file_path).await {
        Ok(f) => f,
        Err(e) => return error_response(&ServeError::from(e), upath),
    };

    let size = meta.len();
    let validators = Validators::from_metadata(meta.modified().ok(), size);

    match cache::evaluate_preconditions(&ctx.conditionals, &validators) {
        Precondition::NotModified => return http::build_304_response(&validators),
        Precondition::Failed => return http::build_412_response(),
        Precondition::Proceed => {}
    }

    let range = if cache::if_range_allows(ctx.conditionals.if_range.as_deref(), &validators) {
        http::parse_range_header(ctx.range_header.as_deref(), size)
    } else {
        RangeParseResult::None
    };

    let (status, range) = match range {
        RangeParseResult::Valid(r) => (StatusCode::PARTIAL_CONTENT, r),
        RangeParseResult::NotSatisfiable => return http::build_416_response(size),
        RangeParseResult::None if size == 0 => {
            return build_empty_file_response(file_path, &validators);
        }
        RangeParseResult::None => (
            StatusCode::OK,
            ByteRange {
                start: 0,
                end: size - 1,
            },
        ),
    };

    let body = if ctx.is_head {
        response::empty()
    } else {
        if range.start > 0 {
            if let Err(e) = file.seek(SeekFrom::Start(range.start)).await {
                return error_response(&ServeError::Io(e), upath);
            }
        }
        file_body(file, range.content_length())
    };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, mime::content_type_for(file_path))
        .header(CONTENT_LENGTH, range.content_length())
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, &validators.etag);
    if let Some(last_modified) = validators.last_modified_header() {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }
    if status == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(CONTENT_RANGE, range.content_range(size));
    }

    builder.body(body).unwrap_or_else(|e| {
        response::log_build_error(status.as_str(), &e);
        http::build_error_response(&ServeError::Io(std::io::Error::other(e)))
    })
}

/// Zero-length files have no valid byte range to stream
fn build_empty_file_response(file_path: &Path, validators: &Validators) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime::content_type_for(file_path))
        .header(CONTENT_LENGTH, 0)
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, &validators.etag);
    if let Some(last_modified) = validators.last_modified_header() {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(response::empty()).unwrap_or_else(|e| {
        response::log_build_error("200", &e);
        http::build_error_response(&ServeError::Io(std::io::Error::other(e)))
    })
}

/// Stream `len` bytes from the file's current position
fn file_body(file: File, len: u64) -> ResponseBody {
    let stream = ReaderStream::new(file.take(len)).map_ok(Frame::data);
    StreamBody::new(stream).boxed_unsync()
}

/// Only unexpected I/O failures are worth a log line; 403/404 are routine
fn error_response(err: &ServeError, upath: &str) -> Response<ResponseBody> {
    if let ServeError::Io(e) = err {
        logger::log_error(&format!("Failed to serve '{upath}': {e}"));
    }
    http::build_error_response(err)
}
