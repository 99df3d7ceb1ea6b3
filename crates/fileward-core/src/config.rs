//! Configuration module
//!
//! [`AttachmentConfig`] holds the per-owner-type settings of the attachment
//! manager. It is built programmatically through [`AttachmentConfigBuilder`]
//! or from `FILEWARD_*` environment variables through [`Settings`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{FileError, FileResult};
use crate::rules::FileRules;

pub const DEFAULT_STORAGE_ROOT: &str = "files/{owner_type}/{owner_id}";
pub const DEFAULT_FILE_FIELD: &str = "file";

const OWNER_TYPE_PLACEHOLDER: &str = "{owner_type}";
const OWNER_ID_PLACEHOLDER: &str = "{owner_id}";

/// Base directory for an owner's files.
///
/// Both forms may contain `{owner_type}` and `{owner_id}`, expanded when the
/// root is resolved for a concrete owner.
#[derive(Clone)]
pub enum StorageRoot {
    Static(PathBuf),
    /// Resolved on every use
    Resolver(Arc<dyn Fn() -> PathBuf + Send + Sync>),
}

impl StorageRoot {
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn() -> PathBuf + Send + Sync + 'static,
    {
        StorageRoot::Resolver(Arc::new(f))
    }

    pub fn resolve(&self, owner_type: &str, owner_id: &str) -> PathBuf {
        let raw = match self {
            StorageRoot::Static(path) => path.clone(),
            StorageRoot::Resolver(resolve) => resolve(),
        };
        let text = raw.to_string_lossy();
        if !text.contains(OWNER_TYPE_PLACEHOLDER) && !text.contains(OWNER_ID_PLACEHOLDER) {
            return raw;
        }
        PathBuf::from(
            text.replace(OWNER_TYPE_PLACEHOLDER, owner_type)
                .replace(OWNER_ID_PLACEHOLDER, owner_id),
        )
    }
}

impl Debug for StorageRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageRoot::Static(path) => f.debug_tuple("Static").field(path).finish(),
            StorageRoot::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

impl From<PathBuf> for StorageRoot {
    fn from(path: PathBuf) -> Self {
        StorageRoot::Static(path)
    }
}

impl From<&Path> for StorageRoot {
    fn from(path: &Path) -> Self {
        StorageRoot::Static(path.to_path_buf())
    }
}

impl From<&str> for StorageRoot {
    fn from(path: &str) -> Self {
        StorageRoot::Static(PathBuf::from(path))
    }
}

/// Processing options of one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOptions {
    /// Operation kind, e.g. `thumbnail`
    pub method: String,
    pub width: u32,
    pub height: u32,
}

impl VariantOptions {
    pub fn new(method: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            method: method.into(),
            width,
            height,
        }
    }

    pub fn thumbnail(width: u32, height: u32) -> Self {
        Self::new("thumbnail", width, height)
    }
}

/// What a custom path resolver is asked for
#[derive(Debug, Clone, Copy)]
pub struct PathContext<'a> {
    pub owner_type: &'a str,
    pub owner_id: &'a str,
    pub file_field: &'a str,
    pub variant: Option<&'a str>,
    pub name: Option<&'a str>,
}

/// Custom path resolution; replaces the built-in layout entirely
pub type PathResolver = Arc<dyn Fn(&PathContext<'_>) -> Option<PathBuf> + Send + Sync>;

/// Per-owner-type attachment settings. Immutable once built.
#[derive(Clone)]
pub struct AttachmentConfig {
    storage: StorageRoot,
    file_field: String,
    path_resolver: Option<PathResolver>,
    variants: Vec<(String, VariantOptions)>,
    web_root: Option<PathBuf>,
    rules: Option<FileRules>,
}

impl AttachmentConfig {
    pub fn builder(file_field: impl Into<String>) -> AttachmentConfigBuilder {
        AttachmentConfigBuilder::new(file_field)
    }

    pub fn storage(&self) -> &StorageRoot {
        &self.storage
    }

    pub fn file_field(&self) -> &str {
        &self.file_field
    }

    pub fn path_resolver(&self) -> Option<&PathResolver> {
        self.path_resolver.as_ref()
    }

    /// Variants in registration order
    pub fn variants(&self) -> &[(String, VariantOptions)] {
        &self.variants
    }

    pub fn variant(&self, name: &str) -> Option<&VariantOptions> {
        self.variants
            .iter()
            .find(|(variant, _)| variant == name)
            .map(|(_, options)| options)
    }

    /// Document root that links are made relative to
    pub fn web_root(&self) -> Option<&Path> {
        self.web_root.as_deref()
    }

    pub fn rules(&self) -> Option<&FileRules> {
        self.rules.as_ref()
    }
}

impl Debug for AttachmentConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("AttachmentConfig")
            .field("storage", &self.storage)
            .field("file_field", &self.file_field)
            .field("path_resolver", &self.path_resolver.is_some())
            .field("variants", &self.variants)
            .field("web_root", &self.web_root)
            .field("rules", &self.rules)
            .finish()
    }
}

pub struct AttachmentConfigBuilder {
    storage: StorageRoot,
    file_field: String,
    path_resolver: Option<PathResolver>,
    variants: Vec<(String, VariantOptions)>,
    web_root: Option<PathBuf>,
    rules: Option<FileRules>,
}

impl AttachmentConfigBuilder {
    fn new(file_field: impl Into<String>) -> Self {
        Self {
            storage: StorageRoot::Static(PathBuf::from(DEFAULT_STORAGE_ROOT)),
            file_field: file_field.into(),
            path_resolver: None,
            variants: Vec::new(),
            web_root: None,
            rules: None,
        }
    }

    pub fn storage(mut self, storage: impl Into<StorageRoot>) -> Self {
        self.storage = storage.into();
        self
    }

    pub fn path_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&PathContext<'_>) -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.path_resolver = Some(Arc::new(resolver));
        self
    }

    /// Add a variant; a later variant with the same name replaces the earlier one
    pub fn variant(mut self, name: impl Into<String>, options: VariantOptions) -> Self {
        let name = name.into();
        match self.variants.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = options,
            None => self.variants.push((name, options)),
        }
        self
    }

    pub fn web_root(mut self, web_root: impl Into<PathBuf>) -> Self {
        self.web_root = Some(web_root.into());
        self
    }

    pub fn rules(mut self, rules: FileRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn build(self) -> FileResult<AttachmentConfig> {
        if self.file_field.is_empty() || !is_component(&self.file_field) {
            return Err(FileError::Config(format!(
                "file field must be a non-empty word, got {:?}",
                self.file_field
            )));
        }

        for (name, options) in &self.variants {
            if name.is_empty() || !is_component(name) {
                return Err(FileError::Config(format!(
                    "variant name must be a non-empty word, got {:?}",
                    name
                )));
            }
            if options.width == 0 || options.height == 0 {
                return Err(FileError::Config(format!(
                    "variant {} needs a non-zero width and height",
                    name
                )));
            }
        }

        Ok(AttachmentConfig {
            storage: self.storage,
            file_field: self.file_field,
            path_resolver: self.path_resolver,
            variants: self.variants,
            web_root: self.web_root,
            rules: self.rules,
        })
    }
}

fn is_component(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn default_storage_root() -> String {
    DEFAULT_STORAGE_ROOT.to_string()
}

fn default_file_field() -> String {
    DEFAULT_FILE_FIELD.to_string()
}

/// Environment-driven settings (`FILEWARD_*`)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_storage_root")]
    pub storage_root: String,
    #[serde(default = "default_file_field")]
    pub file_field: String,
    pub web_root: Option<String>,
    /// JSON object: variant name -> `{"method", "width", "height"}`
    pub variants: Option<String>,
    pub max_file_size: Option<u64>,
    /// Comma-separated list, e.g. `png,jpg`
    pub allowed_extensions: Option<String>,
}

impl Settings {
    pub const PREFIX: &'static str = "FILEWARD_";

    pub fn from_env() -> FileResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> FileResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(Self::PREFIX)
            .from_iter(vars)
            .map_err(|e| FileError::Config(e.to_string()))
    }

    pub fn into_config(self) -> FileResult<AttachmentConfig> {
        let mut builder = AttachmentConfig::builder(self.file_field)
            .storage(PathBuf::from(self.storage_root));

        if let Some(web_root) = self.web_root {
            builder = builder.web_root(web_root);
        }

        if let Some(raw) = self.variants.as_deref().filter(|v| !v.trim().is_empty()) {
            let variants: BTreeMap<String, VariantOptions> = serde_json::from_str(raw)?;
            for (name, options) in variants {
                builder = builder.variant(name, options);
            }
        }

        let extensions: Vec<String> = self
            .allowed_extensions
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        if self.max_file_size.is_some() || !extensions.is_empty() {
            builder = builder.rules(FileRules {
                max_size: self.max_file_size,
                extensions,
                ..Default::default()
            });
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_static_root_expands_owner_placeholders() {
        let root = StorageRoot::from("/srv/files/{owner_type}/{owner_id}");
        assert_eq!(
            root.resolve("post", "42"),
            PathBuf::from("/srv/files/post/42")
        );
        let plain = StorageRoot::from("/srv/files");
        assert_eq!(plain.resolve("post", "42"), PathBuf::from("/srv/files"));
    }

    #[test]
    fn test_resolver_root_is_called_on_each_use() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let root = StorageRoot::resolver(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            PathBuf::from("/tmp/{owner_id}")
        });

        assert_eq!(root.resolve("user", "7"), PathBuf::from("/tmp/7"));
        assert_eq!(root.resolve("user", "8"), PathBuf::from("/tmp/8"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_builder_rejects_bad_field_and_variant() {
        assert!(AttachmentConfig::builder("").build().is_err());
        assert!(AttachmentConfig::builder("../image").build().is_err());
        assert!(AttachmentConfig::builder("image")
            .variant("thumb/1", VariantOptions::thumbnail(10, 10))
            .build()
            .is_err());
        assert!(AttachmentConfig::builder("image")
            .variant("thumb", VariantOptions::thumbnail(0, 10))
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_keeps_variant_order_and_replaces_duplicates() {
        let config = AttachmentConfig::builder("image")
            .variant("small", VariantOptions::thumbnail(50, 50))
            .variant("big", VariantOptions::thumbnail(200, 200))
            .variant("small", VariantOptions::thumbnail(60, 60))
            .build()
            .unwrap();

        let names: Vec<&str> = config.variants().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["small", "big"]);
        assert_eq!(config.variant("small").unwrap().width, 60);
        assert!(config.variant("missing").is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_vars(vars(&[])).unwrap();
        assert_eq!(settings.storage_root, DEFAULT_STORAGE_ROOT);
        assert_eq!(settings.file_field, DEFAULT_FILE_FIELD);

        let config = settings.into_config().unwrap();
        assert!(config.variants().is_empty());
        assert!(config.rules().is_none());
    }

    #[test]
    fn test_settings_into_config() {
        let settings = Settings::from_vars(vars(&[
            ("FILEWARD_STORAGE_ROOT", "/data/{owner_type}/{owner_id}"),
            ("FILEWARD_FILE_FIELD", "image"),
            ("FILEWARD_WEB_ROOT", "/data"),
            (
                "FILEWARD_VARIANTS",
                r#"{"thumb":{"method":"thumbnail","width":50,"height":40}}"#,
            ),
            ("FILEWARD_MAX_FILE_SIZE", "1024"),
            ("FILEWARD_ALLOWED_EXTENSIONS", "PNG, .jpg"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        let config = settings.into_config().unwrap();
        assert_eq!(config.file_field(), "image");
        assert_eq!(config.web_root(), Some(Path::new("/data")));
        assert_eq!(
            config.variant("thumb"),
            Some(&VariantOptions::thumbnail(50, 40))
        );
        let rules = config.rules().unwrap();
        assert_eq!(rules.max_size, Some(1024));
        assert_eq!(rules.extensions, vec!["png".to_string(), "jpg".to_string()]);
    }

    #[test]
    fn test_settings_bad_variants_json() {
        let settings =
            Settings::from_vars(vars(&[("FILEWARD_VARIANTS", "{not json")])).unwrap();
        assert!(matches!(settings.into_config(), Err(FileError::Config(_))));
    }
}
