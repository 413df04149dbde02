//! Utility functions and helpers
//!
//! Atomic file writes, logging setup and list paging.

pub mod atomic;
pub mod logger;
pub mod paging;

pub use atomic::{atomic_write_with, cleanup_temp_files, safe_rename};
pub use logger::init_logger;
pub use paging::page;
