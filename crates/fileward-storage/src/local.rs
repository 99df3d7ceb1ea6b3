use std::path::Path;
use tokio::fs;

/// Directory mode for created directories (unix only)
pub const DIRECTORY_MODE: u32 = 0o775;

/// Local filesystem primitives used by the attachment manager.
///
/// All paths are absolute paths produced by [`FileLayout`](crate::FileLayout);
/// this type never builds paths itself.
#[derive(Debug, Clone, Copy)]
pub struct LocalStore {
    dir_mode: u32,
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            dir_mode: DIRECTORY_MODE,
        }
    }

    pub fn with_dir_mode(dir_mode: u32) -> Self {
        Self { dir_mode }
    }

    /// Create `dir` and its parents. Idempotent.
    pub async fn ensure_dir(&self, dir: &Path) -> std::io::Result<()> {
        if self.is_dir(dir).await {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(self.dir_mode);
        builder.create(dir).await?;

        tracing::debug!(path = %dir.display(), "Created storage directory");
        Ok(())
    }

    /// Create the parent directory of `path`
    pub async fn ensure_parent(&self, path: &Path) -> std::io::Result<()> {
        match path.parent() {
            Some(parent) => self.ensure_dir(parent).await,
            None => Ok(()),
        }
    }

    /// Entry names of `dir` in OS order; empty when `dir` is not a directory
    pub async fn list(&self, dir: &Path) -> std::io::Result<Vec<String>> {
        if !self.is_dir(dir).await {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    pub async fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    pub async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    pub async fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        fs::rename(from, to).await?;
        tracing::info!(
            from = %from.display(),
            to = %to.display(),
            "Local storage rename successful"
        );
        Ok(())
    }

    pub async fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        fs::remove_file(path).await?;
        tracing::info!(path = %path.display(), "Local storage delete successful");
        Ok(())
    }

    /// Remove `dir` and everything below it
    pub async fn remove_dir_all(&self, dir: &Path) -> std::io::Result<()> {
        let start = std::time::Instant::now();
        fs::remove_dir_all(dir).await?;
        tracing::info!(
            path = %dir.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage directory removed"
        );
        Ok(())
    }
}
