//! dirserve: serve a directory tree over HTTP/1.1
//!
//! Every request path is mapped onto a file under the configured root
//! (`./static` by default). Directories are served through their index
//! file or a generated listing.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
