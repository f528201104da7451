//! HTTP cache validation module
//!
//! Provides `ETag`/`Last-Modified` validators and conditional request
//! evaluation (RFC 9110 §13).

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Validators for one representation
#[derive(Debug, Clone)]
pub struct Validators {
    /// Quoted strong `ETag`, e.g. `"18c3f2a1b-2a"`
    pub etag: String,
    /// Modification time truncated to whole seconds; `None` when unknown
    pub last_modified: Option<DateTime<Utc>>,
}

impl Validators {
    /// Derive validators from file metadata without reading the content
    pub fn from_metadata(modified: Option<SystemTime>, len: u64) -> Self {
        let modified = modified.filter(|t| *t > UNIX_EPOCH);
        Self {
            etag: generate_etag(modified, len),
            last_modified: modified.map(|t| DateTime::<Utc>::from(t).trunc_subsecs(0)),
        }
    }

    /// `Last-Modified` header value, if the mtime is known
    pub fn last_modified_header(&self) -> Option<String> {
        self.last_modified.map(format_http_date)
    }
}

/// Conditional request headers copied out of the request
#[derive(Debug, Clone, Default)]
pub struct Conditionals {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_unmodified_since: Option<String>,
    pub if_range: Option<String>,
}

/// Outcome of evaluating preconditions before serving a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Proceed,
    /// 304
    NotModified,
    /// 412
    Failed,
}

/// Generate an `ETag` from modification time and size
///
/// # Returns
/// Quoted `ETag` string, e.g., `"18c3f2a1b00-2a"`
pub fn generate_etag(modified: Option<SystemTime>, len: u64) -> String {
    let nanos = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos());
    format!("\"{nanos:x}-{len:x}\"")
}

/// Format a timestamp as an IMF-fixdate (`Sun, 06 Nov 1994 08:49:37 GMT`)
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Obsolete date forms recipients must still accept (RFC 9110 §5.6.7)
const RFC850_DATE: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_DATE: &str = "%a %b %e %H:%M:%S %Y";

/// Parse an HTTP date header value: IMF-fixdate, RFC 850 or asctime
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }

    [RFC850_DATE, ASCTIME_DATE]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Evaluate `If-Match`, `If-Unmodified-Since`, `If-None-Match` and
/// `If-Modified-Since` in the order RFC 9110 §13.2.2 prescribes.
///
/// Only safe methods reach the file server, so a matching `If-None-Match`
/// always means 304.
pub fn evaluate_preconditions(cond: &Conditionals, validators: &Validators) -> Precondition {
    let unmodified_ok = match &cond.if_match {
        Some(list) => etag_list_matches(list, &validators.etag, strong_eq),
        None => match (&cond.if_unmodified_since, validators.last_modified) {
            (Some(date), Some(modified)) => {
                parse_http_date(date).map_or(true, |since| modified <= since)
            }
            _ => true,
        },
    };
    if !unmodified_ok {
        return Precondition::Failed;
    }

    match &cond.if_none_match {
        Some(list) => {
            if etag_list_matches(list, &validators.etag, weak_eq) {
                return Precondition::NotModified;
            }
        }
        None => {
            if let (Some(date), Some(modified)) = (&cond.if_modified_since, validators.last_modified)
            {
                if parse_http_date(date).is_some_and(|since| modified <= since) {
                    return Precondition::NotModified;
                }
            }
        }
    }

    Precondition::Proceed
}

/// Whether a `Range` header should be honoured given `If-Range`
///
/// Without `If-Range` the range always applies. With an entity tag it must
/// strongly match; with a date it must equal the modification time.
pub fn if_range_allows(if_range: Option<&str>, validators: &Validators) -> bool {
    let Some(value) = if_range.map(str::trim) else {
        return true;
    };

    if value.starts_with('"') || value.starts_with("W/") {
        return strong_eq(value, &validators.etag);
    }

    match (parse_http_date(value), validators.last_modified) {
        (Some(date), Some(modified)) => date == modified,
        _ => false,
    }
}

fn etag_list_matches(list: &str, etag: &str, eq: fn(&str, &str) -> bool) -> bool {
    list.split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || eq(candidate, etag))
}

fn strong_eq(a: &str, b: &str) -> bool {
    !a.starts_with("W/") && !b.starts_with("W/") && a == b
}

fn weak_eq(a: &str, b: &str) -> bool {
    a.trim_start_matches("W/") == b.trim_start_matches("W/")
}
