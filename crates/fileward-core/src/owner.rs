//! Collaborator traits for the owning record and incoming uploads
//!
//! The attachment core never persists records or parses requests itself. It
//! talks to an [`Owner`] for the one attribute it manages and to an
//! [`UploadSource`] for the files bound to that attribute in a request.

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use crate::error::FileResult;

/// One incoming file, alive between capture and the post-save hook.
#[async_trait]
pub trait PendingUpload: Send + Sync + Debug {
    /// Original client-supplied filename
    fn name(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Client-declared content type, if any
    fn content_type(&self) -> Option<&str>;

    /// Write the upload to `destination`. Succeeds at most once; later calls
    /// return an error.
    async fn save_as(&self, destination: &Path) -> std::io::Result<()>;
}

/// Files bound to a request, looked up by binding name.
///
/// A single-file binding uses the attribute name (`image`), an array binding
/// the attribute name with a `[]` suffix (`image[]`).
pub trait UploadSource: Send + Sync {
    fn files(&self, binding: &str) -> Vec<Arc<dyn PendingUpload>>;
}

/// An upload source that never has files
pub struct NoUploads;

impl UploadSource for NoUploads {
    fn files(&self, _binding: &str) -> Vec<Arc<dyn PendingUpload>> {
        Vec::new()
    }
}

/// In-memory value of the managed file attribute.
///
/// Between capture and post-validation the attribute temporarily holds the
/// upload handles so validation rules can inspect them.
#[derive(Debug, Clone, Default)]
pub enum AttributeValue {
    #[default]
    Empty,
    Text(String),
    Uploads(Vec<Arc<dyn PendingUpload>>),
}

impl AttributeValue {
    pub fn text(value: impl Into<String>) -> Self {
        AttributeValue::Text(value.into())
    }

    /// The plain filename, if the attribute holds one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn uploads(&self) -> &[Arc<dyn PendingUpload>] {
        match self {
            AttributeValue::Uploads(files) => files,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Empty => true,
            AttributeValue::Text(value) => value.is_empty(),
            AttributeValue::Uploads(files) => files.is_empty(),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// The persisted record that owns the files.
#[async_trait]
pub trait Owner: Send + Sync {
    /// Record type name, e.g. `post`
    fn owner_type(&self) -> &str;

    /// Unique identifier of the record
    fn owner_id(&self) -> String;

    /// Whether the record has never been persisted
    fn is_new_record(&self) -> bool;

    /// Current in-memory value of an attribute
    fn attribute(&self, name: &str) -> AttributeValue;

    fn set_attribute(&mut self, name: &str, value: AttributeValue);

    /// Value of an attribute as last persisted
    fn persisted_attribute(&self, name: &str) -> Option<String>;

    /// Persist only the given attributes. Must not run lifecycle hooks.
    async fn update_attributes(&mut self, values: &[(&str, String)]) -> FileResult<()>;

    /// Full insert or update of the record
    async fn persist(&mut self) -> FileResult<()>;

    /// Delete the record
    async fn destroy(&mut self) -> FileResult<()>;

    /// Record-level validation rules; returns error messages
    fn validate(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Stub;

    #[async_trait]
    impl PendingUpload for Stub {
        fn name(&self) -> &str {
            "a.png"
        }

        fn size(&self) -> u64 {
            1
        }

        fn content_type(&self) -> Option<&str> {
            None
        }

        async fn save_as(&self, _destination: &Path) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_attribute_value_emptiness() {
        assert!(AttributeValue::Empty.is_empty());
        assert!(AttributeValue::text("").is_empty());
        assert!(AttributeValue::Uploads(vec![]).is_empty());
        assert!(!AttributeValue::text("1_a.png").is_empty());
        assert!(!AttributeValue::Uploads(vec![Arc::new(Stub)]).is_empty());
    }

    #[test]
    fn test_attribute_value_accessors() {
        let value = AttributeValue::from("1_a.png");
        assert_eq!(value.as_text(), Some("1_a.png"));
        assert!(value.uploads().is_empty());

        let uploads = AttributeValue::Uploads(vec![Arc::new(Stub)]);
        assert_eq!(uploads.as_text(), None);
        assert_eq!(uploads.uploads()[0].name(), "a.png");
    }

    #[test]
    fn test_no_uploads_source() {
        assert!(NoUploads.files("image").is_empty());
        assert!(NoUploads.files("image[]").is_empty());
    }
}
