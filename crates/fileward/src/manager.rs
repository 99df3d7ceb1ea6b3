//! Attachment manager
//!
//! Binds one file attribute of an owner record to a directory tree:
//!
//! ```text
//! {root}/{field}/{n}_{name}              primary files
//! {root}/{field}_{variant}/{n}_{name}    derived variants
//! ```
//!
//! The attribute always holds the name of the first stored primary file.

use async_trait::async_trait;
use fileward_core::{
    AttachmentConfig, AttributeValue, FileError, FileResult, LifecyclePhase, Owner, PathContext,
    PendingUpload, RecordHooks, UploadSource, VariantOptions,
};
use fileward_processing::ProcessorRegistry;
use fileward_storage::{
    numbered_filename, parse_file_number, sanitize_component, sanitize_filename, FileLayout,
    LocalStore,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Manages the files attached to one attribute of an owner.
///
/// Clones share configuration and processors. The value captured before
/// validation and the uploads staged after it belong to one instance, so use
/// one manager per owner save.
#[derive(Clone, Debug)]
pub struct AttachmentManager {
    config: Arc<AttachmentConfig>,
    processors: Arc<ProcessorRegistry>,
    store: LocalStore,
    file_name: String,
    staged: Vec<Arc<dyn PendingUpload>>,
}

impl AttachmentManager {
    /// Manager using the built-in processors
    pub fn new(config: AttachmentConfig) -> FileResult<Self> {
        Self::with_processors(config, ProcessorRegistry::with_defaults())
    }

    /// Manager using a custom processor registry. Every configured variant
    /// must name a registered operation.
    pub fn with_processors(
        config: AttachmentConfig,
        processors: ProcessorRegistry,
    ) -> FileResult<Self> {
        for (name, options) in config.variants() {
            if !processors.contains(&options.method) {
                return Err(FileError::Config(format!(
                    "variant {} uses unknown operation {}",
                    name, options.method
                )));
            }
        }

        Ok(Self {
            config: Arc::new(config),
            processors: Arc::new(processors),
            store: LocalStore::new(),
            file_name: String::new(),
            staged: Vec::new(),
        })
    }

    pub fn with_store(mut self, store: LocalStore) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &AttachmentConfig {
        &self.config
    }

    /// Primary field followed by every variant
    fn fields(&self) -> impl Iterator<Item = Option<&str>> {
        std::iter::once(None).chain(
            self.config
                .variants()
                .iter()
                .map(|(name, _)| Some(name.as_str())),
        )
    }

    fn layout<O: Owner + ?Sized>(&self, owner: &O) -> FileLayout {
        let root = self.config.storage().resolve(
            &sanitize_component(owner.owner_type()),
            &sanitize_component(&owner.owner_id()),
        );
        FileLayout::new(root, self.config.file_field())
    }

    // ----- Queries -----

    /// Current attribute value when it is a non-empty file name
    pub fn first_file_name<O: Owner + ?Sized>(&self, owner: &O) -> Option<String> {
        owner
            .attribute(self.config.file_field())
            .as_text()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }

    /// Absolute path of `name` in the primary (`variant == None`) or a variant
    /// directory. Without a name the owner's first file is used; an empty name
    /// yields the directory itself.
    pub fn file_path<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        name: Option<&str>,
    ) -> FileResult<PathBuf> {
        if let Some(resolver) = self.config.path_resolver() {
            let owner_id = owner.owner_id();
            let context = PathContext {
                owner_type: owner.owner_type(),
                owner_id: &owner_id,
                file_field: self.config.file_field(),
                variant,
                name,
            };
            return resolver(&context).ok_or(FileError::NoFile);
        }

        let name = match name {
            Some(name) => name.to_string(),
            None => self.first_file_name(owner).ok_or(FileError::NoFile)?,
        };
        Ok(self.layout(owner).file(variant, &name))
    }

    /// Public link for a stored file: the path with the web root stripped, or
    /// the path itself when it lies outside the web root
    pub async fn file_link<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        name: Option<&str>,
    ) -> FileResult<String> {
        let path = self.file_path(owner, variant, name)?;
        Ok(self.link_for(&path).await)
    }

    async fn link_for(&self, path: &Path) -> String {
        if let Some(web_root) = self.config.web_root() {
            let canonical = tokio::fs::canonicalize(web_root).await.ok();
            let relative = canonical
                .as_deref()
                .and_then(|root| path.strip_prefix(root).ok())
                .or_else(|| path.strip_prefix(web_root).ok());

            if let Some(relative) = relative {
                let segments: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                return format!("/{}", segments.join("/"));
            }
        }
        path.to_string_lossy().into_owned()
    }

    /// Names in the primary or a variant directory, in directory order;
    /// empty when the directory does not exist
    pub async fn file_list<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
    ) -> FileResult<Vec<String>> {
        let dir = self.file_path(owner, variant, Some(""))?;
        Ok(self.store.list(&dir).await?)
    }

    /// Highest sequence number in use.
    ///
    /// Takes the last primary name in plain string order and reads its
    /// leading number. String order puts `9_` after `10_`, so with ten or
    /// more files this can under-count; names without a number fall back to
    /// the number of files.
    pub async fn file_count<O: Owner + ?Sized>(&self, owner: &O) -> FileResult<u64> {
        let mut names = self.file_list(owner, None).await?;
        names.sort();
        let Some(last) = names.last() else {
            return Ok(0);
        };
        Ok(parse_file_number(last).unwrap_or(names.len() as u64))
    }

    /// Link to the file at `position` in directory order
    pub async fn file_position_link<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
        position: usize,
    ) -> FileResult<Option<String>> {
        let names = self.file_list(owner, variant).await?;
        match names.get(position) {
            Some(name) => Ok(Some(self.file_link(owner, variant, Some(name)).await?)),
            None => Ok(None),
        }
    }

    /// Name to link for every file in the primary or a variant directory
    pub async fn link_list<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: Option<&str>,
    ) -> FileResult<BTreeMap<String, String>> {
        let mut links = BTreeMap::new();
        for name in self.file_list(owner, variant).await? {
            let link = self.file_link(owner, variant, Some(&name)).await?;
            links.insert(name, link);
        }
        Ok(links)
    }

    // ----- Lifecycle -----

    /// Remember the stored file name and substitute pending uploads for the
    /// attribute so validation sees them
    #[tracing::instrument(skip_all, fields(owner_type = %owner.owner_type(), field = %self.config.file_field()))]
    pub async fn before_validate<O: Owner + ?Sized>(
        &mut self,
        owner: &mut O,
        uploads: &dyn UploadSource,
    ) -> FileResult<()> {
        let field = self.config.file_field().to_string();
        // Uploads left over from a save that failed validation are dropped
        self.staged.clear();

        self.file_name = match owner.attribute(&field) {
            AttributeValue::Text(name) => name,
            _ => owner.persisted_attribute(&field).unwrap_or_default(),
        };

        let mut files = uploads.files(&field);
        files.truncate(1);
        if files.is_empty() {
            files = uploads.files(&format!("{}[]", field));
        }

        if !files.is_empty() {
            tracing::debug!(count = files.len(), "Substituting pending uploads");
            owner.set_attribute(&field, AttributeValue::Uploads(files));
        }
        Ok(())
    }

    /// Rule violations for the current attribute value
    pub fn validate<O: Owner + ?Sized>(&self, owner: &O) -> Vec<String> {
        match self.config.rules() {
            Some(rules) => {
                let field = self.config.file_field();
                rules.check(field, &owner.attribute(field))
            }
            None => Vec::new(),
        }
    }

    /// Restore the captured file name and stage any uploads for saving
    pub async fn after_validate<O: Owner + ?Sized>(&mut self, owner: &mut O) -> FileResult<()> {
        let field = self.config.file_field().to_string();
        let value = owner.attribute(&field);
        if value.is_empty() {
            self.staged.clear();
            return Ok(());
        }

        let restored = if self.file_name.is_empty() {
            AttributeValue::Empty
        } else {
            AttributeValue::Text(self.file_name.clone())
        };
        owner.set_attribute(&field, restored);

        self.staged = match value {
            AttributeValue::Uploads(files) => files,
            _ => Vec::new(),
        };
        Ok(())
    }

    /// Store staged uploads under the next sequence numbers and derive every
    /// variant. The first file ever stored becomes the attribute value.
    #[tracing::instrument(skip_all, fields(owner_type = %owner.owner_type(), owner_id = %owner.owner_id(), field = %self.config.file_field()))]
    pub async fn after_save<O: Owner + ?Sized>(&mut self, owner: &mut O) -> FileResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let staged = std::mem::take(&mut self.staged);
        let existing = self.file_count(owner).await?;
        let field = self.config.file_field().to_string();

        for (index, file) in staged.iter().enumerate() {
            let number = existing + index as u64 + 1;
            let name = numbered_filename(number, file.name());

            if number == 1 {
                owner
                    .update_attributes(&[(field.as_str(), name.clone())])
                    .await?;
            }

            let path = self.file_path(owner, None, Some(&name))?;
            self.store.ensure_parent(&path).await?;
            file.save_as(&path).await?;

            tracing::info!(
                name = %name,
                path = %path.display(),
                size_bytes = file.size(),
                "File stored"
            );

            for (variant, options) in self.config.variants() {
                self.process_image(owner, variant, options, &name).await?;
            }
        }
        Ok(())
    }

    /// Derive `variant` of the stored primary file `name`
    pub async fn process_image<O: Owner + ?Sized>(
        &self,
        owner: &O,
        variant: &str,
        options: &VariantOptions,
        name: &str,
    ) -> FileResult<()> {
        let source = self.file_path(owner, None, Some(name))?;
        let destination = self.file_path(owner, Some(variant), Some(name))?;
        self.store.ensure_parent(&destination).await?;

        let start = Instant::now();
        self.processors
            .dispatch(&source, &destination, options)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    variant = %variant,
                    method = %options.method,
                    error = %e,
                    "Variant processing failed"
                );
            })?;

        tracing::debug!(
            variant = %variant,
            method = %options.method,
            duration_ms = start.elapsed().as_millis() as u64,
            "Variant generated"
        );
        Ok(())
    }

    /// Remove the primary and every variant directory of the owner
    #[tracing::instrument(skip_all, fields(owner_type = %owner.owner_type(), owner_id = %owner.owner_id()))]
    pub async fn after_delete<O: Owner + ?Sized>(&self, owner: &O) -> FileResult<()> {
        for field in self.fields() {
            let dir = self.file_path(owner, field, Some(""))?;
            if self.store.is_dir(&dir).await {
                self.store.remove_dir_all(&dir).await?;
            }
        }
        Ok(())
    }

    // ----- Mutations -----

    /// Whether `name` refers to the file the attribute holds
    fn is_attribute<O: Owner + ?Sized>(&self, owner: &O, name: &str) -> bool {
        self.first_file_name(owner).map(|n| sanitize_filename(&n)) == Some(sanitize_filename(name))
    }

    /// Delete `name` from the primary and every variant directory. When it
    /// was the attribute value, the attribute moves to the first remaining
    /// file; with none remaining it is left unchanged.
    #[tracing::instrument(skip(self, owner), fields(owner_id = %owner.owner_id()))]
    pub async fn delete_file<O: Owner + ?Sized>(&self, owner: &mut O, name: &str) -> FileResult<()> {
        if sanitize_filename(name).is_empty() {
            return Err(FileError::NotFound(name.to_string()));
        }

        for field in self.fields() {
            let path = self.file_path(owner, field, Some(name))?;
            if self.store.is_file(&path).await {
                self.store.remove_file(&path).await?;
            }
        }

        if self.is_attribute(owner, name) {
            if let Some(first) = self.file_list(owner, None).await?.into_iter().next() {
                let field = self.config.file_field();
                owner.update_attributes(&[(field, first)]).await?;
            }
        }
        Ok(())
    }

    /// Rename `name` to `new_name` in the primary and every variant
    /// directory. Nothing is renamed when the new name is taken in any of
    /// them.
    #[tracing::instrument(skip(self, owner), fields(owner_id = %owner.owner_id()))]
    pub async fn rename_file<O: Owner + ?Sized>(
        &self,
        owner: &mut O,
        name: &str,
        new_name: &str,
    ) -> FileResult<()> {
        if sanitize_filename(name).is_empty() {
            return Err(FileError::NotFound(name.to_string()));
        }
        if !self.store.is_file(&self.file_path(owner, None, Some(name))?).await {
            return Err(FileError::NotFound(name.to_string()));
        }
        let stored_name = sanitize_filename(new_name);
        if stored_name.is_empty() {
            return Err(FileError::Validation(vec![format!(
                "\"{}\" is not a valid file name.",
                new_name
            )]));
        }

        let mut moves = Vec::new();
        for field in self.fields() {
            let from = self.file_path(owner, field, Some(name))?;
            let to = self.file_path(owner, field, Some(&stored_name))?;
            if self.store.exists(&to).await {
                return Err(FileError::Conflict(stored_name));
            }
            moves.push((from, to));
        }

        for (from, to) in moves {
            if self.store.is_file(&from).await {
                self.store.rename(&from, &to).await?;
            }
        }

        if self.is_attribute(owner, name) {
            let field = self.config.file_field();
            owner.update_attributes(&[(field, stored_name)]).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<O: Owner> RecordHooks<O> for AttachmentManager {
    fn name(&self) -> &str {
        "attachments"
    }

    fn phases(&self) -> &'static [LifecyclePhase] {
        LifecyclePhase::ALL
    }

    async fn before_validate(&mut self, owner: &mut O, uploads: &dyn UploadSource) -> FileResult<()> {
        AttachmentManager::before_validate(self, owner, uploads).await
    }

    fn validate(&self, owner: &O) -> Vec<String> {
        AttachmentManager::validate(self, owner)
    }

    async fn after_validate(&mut self, owner: &mut O) -> FileResult<()> {
        AttachmentManager::after_validate(self, owner).await
    }

    async fn after_insert(&mut self, owner: &mut O) -> FileResult<()> {
        self.after_save(owner).await
    }

    async fn after_update(&mut self, owner: &mut O) -> FileResult<()> {
        self.after_save(owner).await
    }

    async fn after_delete(&mut self, owner: &O) -> FileResult<()> {
        AttachmentManager::after_delete(self, owner).await
    }
}
