use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::owner::{AttributeValue, PendingUpload};

/// Validation rules for the managed file attribute.
///
/// Rules run while the attribute holds the captured upload handles. When no
/// upload was sent the attribute keeps its filename, which satisfies
/// `required` on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRules {
    /// The attribute must hold a filename or at least one upload
    #[serde(default)]
    pub required: bool,
    /// Maximum number of files in one request
    pub max_files: Option<usize>,
    /// Maximum size in bytes of each file
    pub max_size: Option<u64>,
    /// Allowed lower-case extensions; empty allows all
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl FileRules {
    /// Check `value` for the attribute named `field`, returning error messages
    pub fn check(&self, field: &str, value: &AttributeValue) -> Vec<String> {
        let mut errors = Vec::new();

        if value.is_empty() {
            if self.required {
                errors.push(format!("{} cannot be blank.", field));
            }
            return errors;
        }

        let files = value.uploads();
        if let Some(max) = self.max_files {
            if files.len() > max {
                errors.push(format!(
                    "You can upload at most {} files to {}.",
                    max, field
                ));
            }
        }

        for file in files {
            if let Err(message) = self.check_file(file.as_ref()) {
                errors.push(message);
            }
        }

        errors
    }

    fn check_file(&self, file: &dyn PendingUpload) -> Result<(), String> {
        if file.size() == 0 {
            return Err(format!("File \"{}\" is empty.", file.name()));
        }

        if let Some(max) = self.max_size {
            if file.size() > max {
                return Err(format!(
                    "File \"{}\" is too big: {} bytes (max: {} bytes).",
                    file.name(),
                    file.size(),
                    max
                ));
            }
        }

        if !self.extensions.is_empty() {
            let extension = Path::new(file.name())
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .unwrap_or_default();
            if !self.extensions.contains(&extension) {
                return Err(format!(
                    "Only files with these extensions are allowed: {}.",
                    self.extensions.join(", ")
                ));
            }
        }

        Ok(())
    }
}
