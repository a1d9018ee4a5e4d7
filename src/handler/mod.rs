//! Request handler module
//!
//! Request routing, the gallery page, result processing and static files.

pub mod process;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
