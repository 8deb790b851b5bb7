//! Utility re-exports.
//!
//! Shared helpers live under `crate::core`; this module gathers the ones the
//! command-line layer needs.

pub use crate::core::errors::is_broken_pipe;
pub use crate::core::fs::{make_parent_dirs, prefixed_path, require_file};
