use async_trait::async_trait;
use fileward_core::{FileResult, VariantOptions};
use std::fmt::Debug;
use std::path::Path;

/// Produces a variant file from a stored primary file.
///
/// Implementations are registered in a
/// [`ProcessorRegistry`](crate::ProcessorRegistry) under their [`kind`](VariantProcessor::kind),
/// which is matched against [`VariantOptions::method`].
#[async_trait]
pub trait VariantProcessor: Send + Sync + Debug {
    /// Operation kind identifier, e.g. `thumbnail`
    fn kind(&self) -> &str;

    /// Write the processed copy of `source` to `destination`. The destination
    /// directory already exists.
    async fn process(
        &self,
        source: &Path,
        destination: &Path,
        options: &VariantOptions,
    ) -> FileResult<()>;
}
