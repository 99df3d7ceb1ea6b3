//! Concrete upload sources
//!
//! [`UploadedFile`] is a [`PendingUpload`] backed by a temporary file, a local
//! file to copy, or an in-memory buffer. [`RequestFiles`] groups uploads by
//! binding name the way a request carries them.

use async_trait::async_trait;
use bytes::Bytes;
use fileward_core::{PendingUpload, UploadSource};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

#[derive(Debug)]
enum Payload {
    /// Temporary file owned by the upload; moved on save
    Temporary(PathBuf),
    /// File owned by someone else; copied on save
    Copy(PathBuf),
    Memory(Bytes),
}

/// One uploaded file. [`save_as`](PendingUpload::save_as) consumes the payload.
#[derive(Debug)]
pub struct UploadedFile {
    name: String,
    content_type: Option<String>,
    size: u64,
    payload: Mutex<Option<Payload>>,
}

impl UploadedFile {
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        Self {
            content_type: guess_content_type(&name),
            size: data.len() as u64,
            name,
            payload: Mutex::new(Some(Payload::Memory(data))),
        }
    }

    /// Upload stored in a temporary file that is moved into place on save
    pub async fn temporary(name: impl Into<String>, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path).await?.len();
        let name = name.into();
        Ok(Self {
            content_type: guess_content_type(&name),
            size,
            name,
            payload: Mutex::new(Some(Payload::Temporary(path))),
        })
    }

    /// Upload of an existing local file that is copied on save; the client
    /// name is the source file name
    pub async fn copy_of(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path).await?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has no file name", path.display()),
                )
            })?;
        Ok(Self {
            content_type: guess_content_type(&name),
            size,
            name,
            payload: Mutex::new(Some(Payload::Copy(path))),
        })
    }
}

fn guess_content_type(name: &str) -> Option<String> {
    mime_guess::from_path(name).first().map(|m| m.to_string())
}

#[async_trait]
impl PendingUpload for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn save_as(&self, destination: &Path) -> io::Result<()> {
        let payload = self.payload.lock().await.take().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("upload {} was already saved", self.name),
            )
        })?;

        match payload {
            Payload::Memory(data) => {
                let mut file = fs::File::create(destination).await?;
                file.write_all(&data).await?;
                file.sync_all().await?;
            }
            Payload::Temporary(path) => {
                // rename fails across filesystems
                if fs::rename(&path, destination).await.is_err() {
                    fs::copy(&path, destination).await?;
                    fs::remove_file(&path).await?;
                }
            }
            Payload::Copy(path) => {
                fs::copy(&path, destination).await?;
            }
        }

        tracing::debug!(
            name = %self.name,
            destination = %destination.display(),
            size_bytes = self.size,
            "Upload saved"
        );
        Ok(())
    }
}

/// Uploads of one request, keyed by binding name.
///
/// `single` binds under the attribute name, `multiple` under `name[]`.
#[derive(Debug, Default, Clone)]
pub struct RequestFiles {
    bindings: HashMap<String, Vec<Arc<dyn PendingUpload>>>,
}

impl RequestFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(mut self, field: &str, file: UploadedFile) -> Self {
        self.insert(field, Arc::new(file));
        self
    }

    pub fn multiple(mut self, field: &str, files: Vec<UploadedFile>) -> Self {
        let binding = format!("{}[]", field);
        for file in files {
            self.insert(&binding, Arc::new(file));
        }
        self
    }

    pub fn insert(&mut self, binding: &str, file: Arc<dyn PendingUpload>) {
        self.bindings
            .entry(binding.to_string())
            .or_default()
            .push(file);
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.values().all(Vec::is_empty)
    }
}

impl UploadSource for RequestFiles {
    fn files(&self, binding: &str) -> Vec<Arc<dyn PendingUpload>> {
        self.bindings.get(binding).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_upload_saves_once() {
        let dir = tempdir().unwrap();
        let upload = UploadedFile::from_bytes("photo.png", b"png-bytes".to_vec());
        assert_eq!(upload.size(), 9);
        assert_eq!(upload.content_type(), Some("image/png"));

        let destination = dir.path().join("1_photo.png");
        upload.save_as(&destination).await.unwrap();
        assert_eq!(std::fs::read(&destination).unwrap(), b"png-bytes");

        let second = upload.save_as(&dir.path().join("again.png")).await;
        assert_eq!(second.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_temporary_upload_is_moved() {
        let dir = tempdir().unwrap();
        let temp = dir.path().join("php123.tmp");
        std::fs::write(&temp, b"data").unwrap();

        let upload = UploadedFile::temporary("report.pdf", &temp).await.unwrap();
        assert_eq!(upload.size(), 4);

        let destination = dir.path().join("1_report.pdf");
        upload.save_as(&destination).await.unwrap();
        assert!(destination.is_file());
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_copy_upload_keeps_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, b"hello").unwrap();

        let upload = UploadedFile::copy_of(&source).await.unwrap();
        assert_eq!(upload.name(), "notes.txt");

        let destination = dir.path().join("1_notes.txt");
        upload.save_as(&destination).await.unwrap();
        assert!(source.is_file());
        assert_eq!(std::fs::read(&destination).unwrap(), b"hello");
    }

    #[test]
    fn test_request_files_bindings() {
        let files = RequestFiles::new()
            .single("avatar", UploadedFile::from_bytes("a.png", vec![1]))
            .multiple(
                "gallery",
                vec![
                    UploadedFile::from_bytes("b.png", vec![1]),
                    UploadedFile::from_bytes("c.png", vec![1]),
                ],
            );

        assert_eq!(files.files("avatar").len(), 1);
        assert!(files.files("avatar[]").is_empty());
        assert!(files.files("gallery").is_empty());
        let gallery = files.files("gallery[]");
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[1].name(), "c.png");
        assert!(!files.is_empty());
        assert!(RequestFiles::new().is_empty());
    }
}
