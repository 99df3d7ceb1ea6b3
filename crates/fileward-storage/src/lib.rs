//! Fileward Storage Library
//!
//! Path layout and local filesystem primitives for attachment files.
//!
//! # Layout
//!
//! - **Primary file**: `{root}/{field}/{n}_{name}`
//! - **Variant**: `{root}/{field}_{variant}/{n}_{name}`
//!
//! Names are sanitized by [`sanitize_filename`] and variant names by
//! [`sanitize_component`] before they are joined onto the root.

pub mod layout;
pub mod local;

pub use layout::{
    directory_name, numbered_filename, parse_file_number, sanitize_component, sanitize_filename,
    FileLayout,
};
pub use local::LocalStore;
