//! Utility functions shared across the crate.
//!
//! - [`app_data`] - Configuration file location and loading (XDG-compliant)
//! - [`encoding`] - Varint and little-endian helpers for index files
//! - [`progress`] - Progress bars that compile away without the `progress` feature

pub mod app_data;
pub mod encoding;
pub mod progress;

pub use app_data::*;
pub use encoding::*;
