//! Request handler module
//!
//! Routing dispatch and the directory-backed file responder.

pub mod listing;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
