//! Fileward Processing Library
//!
//! Variant generation for stored files. Processors are looked up by
//! operation kind in a [`ProcessorRegistry`]:
//!
//! - `thumbnail` - exact width x height, cropped to fill
//! - `fit` - scaled into width x height, aspect ratio kept
//!
//! The output format always follows the stored file's extension.

pub mod processor;
pub mod registry;
pub mod thumbnail;

pub use processor::VariantProcessor;
pub use registry::ProcessorRegistry;
pub use thumbnail::{output_format, FitProcessor, ResizeMode, ThumbnailProcessor};
