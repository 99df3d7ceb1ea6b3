//! Fileward
//!
//! File attachments for owner records: numbered storage of uploads, derived
//! image variants, link generation, rename/delete maintenance, and cleanup
//! when the owner is deleted.

pub mod lifecycle;
pub mod manager;
pub mod record;
pub mod response;
pub mod upload;

pub use fileward_core::{
    AttachmentConfig, AttributeValue, FileError, FileResult, FileRules, LifecyclePhase, NoUploads,
    Owner, PendingUpload, RecordHooks, Settings, StorageRoot, UploadSource, VariantOptions,
};
pub use fileward_processing::{ProcessorRegistry, VariantProcessor};
pub use lifecycle::Lifecycle;
pub use manager::AttachmentManager;
pub use record::MemoryRecord;
pub use response::{ErrorResponse, HttpFileError};
pub use upload::{RequestFiles, UploadedFile};
