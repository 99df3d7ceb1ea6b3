#![allow(dead_code)]

pub mod fixtures;

use fileward::{AttachmentConfig, AttachmentManager, VariantOptions};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated storage tree for one test
pub struct TestStorage {
    pub dir: TempDir,
}

impl TestStorage {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of `field` (or `field_variant`) for a `post` owner
    pub fn field_dir(&self, owner_id: &str, dir_name: &str) -> PathBuf {
        self.root().join("post").join(owner_id).join(dir_name)
    }

    /// Sorted entry names of a field directory; empty when missing
    pub fn names(&self, owner_id: &str, dir_name: &str) -> Vec<String> {
        let dir = self.field_dir(owner_id, dir_name);
        let mut names: Vec<String> = match std::fs::read_dir(&dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Config for field `image` rooted at this storage, web root included
    pub fn config(&self) -> AttachmentConfig {
        AttachmentConfig::builder("image")
            .storage(self.root().join("{owner_type}/{owner_id}"))
            .web_root(self.root())
            .build()
            .expect("Failed to build config")
    }

    /// Config with a 40x40 `thumb` thumbnail variant
    pub fn config_with_thumb(&self) -> AttachmentConfig {
        AttachmentConfig::builder("image")
            .storage(self.root().join("{owner_type}/{owner_id}"))
            .web_root(self.root())
            .variant("thumb", VariantOptions::thumbnail(40, 40))
            .build()
            .expect("Failed to build config")
    }

    pub fn manager(&self) -> AttachmentManager {
        AttachmentManager::new(self.config()).expect("Failed to build manager")
    }

    pub fn manager_with_thumb(&self) -> AttachmentManager {
        AttachmentManager::new(self.config_with_thumb()).expect("Failed to build manager")
    }

    /// Write a file directly into a field directory
    pub fn put(&self, owner_id: &str, dir_name: &str, name: &str, data: &[u8]) {
        let dir = self.field_dir(owner_id, dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), data).unwrap();
    }
}

/// Run one validate/save cycle of `owner` with the manager attached
pub async fn save(
    manager: &AttachmentManager,
    owner: &mut fileward::MemoryRecord,
    files: &fileward::RequestFiles,
) -> fileward::FileResult<()> {
    let mut lifecycle = fileward::Lifecycle::new();
    lifecycle.register(manager.clone());
    lifecycle.save(owner, files).await
}

/// Run the delete cycle of `owner` with the manager attached
pub async fn delete(
    manager: &AttachmentManager,
    owner: &mut fileward::MemoryRecord,
) -> fileward::FileResult<()> {
    let mut lifecycle = fileward::Lifecycle::new();
    lifecycle.register(manager.clone());
    lifecycle.delete(owner).await
}
