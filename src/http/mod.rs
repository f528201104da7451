//! HTTP protocol layer module
//!
//! Protocol helpers that know nothing about the filesystem: path
//! normalization, content types, validators, ranges and response builders.

pub mod cache;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

pub use range::parse_range_header;
pub use response::{
    build_304_response, build_400_response, build_404_response, build_405_response,
    build_412_response, build_416_response, build_error_response, build_redirect_response,
    ResponseBody,
};
