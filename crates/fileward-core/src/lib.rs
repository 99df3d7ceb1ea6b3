//! Fileward Core Library
//!
//! This crate provides the error taxonomy, configuration, and collaborator
//! traits shared by all fileward components.

pub mod config;
pub mod error;
pub mod hooks;
pub mod owner;
pub mod rules;

// Re-export commonly used types
pub use config::{
    AttachmentConfig, AttachmentConfigBuilder, PathContext, PathResolver, Settings, StorageRoot,
    VariantOptions,
};
pub use error::{ErrorMetadata, FileError, FileResult, LogLevel};
pub use hooks::{LifecyclePhase, RecordHooks};
pub use owner::{AttributeValue, NoUploads, Owner, PendingUpload, UploadSource};
pub use rules::FileRules;
