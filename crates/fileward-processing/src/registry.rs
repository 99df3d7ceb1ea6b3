//! Registry of variant processors keyed by operation kind

use fileward_core::{FileError, FileResult, VariantOptions};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::processor::VariantProcessor;
use crate::thumbnail::{FitProcessor, ThumbnailProcessor};

/// Dispatch table from operation kind to processor.
///
/// New operation kinds are added with [`register`](ProcessorRegistry::register);
/// the dispatch site never changes.
#[derive(Clone, Debug)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn VariantProcessor>>,
}

impl ProcessorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            processors: HashMap::new(),
        }
    }

    /// Registry with the built-in `thumbnail` and `fit` processors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ThumbnailProcessor));
        registry.register(Arc::new(FitProcessor));
        registry
    }

    /// Register a processor under its kind, returning the one it replaced
    pub fn register(
        &mut self,
        processor: Arc<dyn VariantProcessor>,
    ) -> Option<Arc<dyn VariantProcessor>> {
        let kind = processor.kind().to_string();
        tracing::debug!(kind = %kind, "Registering variant processor");
        self.processors.insert(kind, processor)
    }

    pub fn get(&self, kind: &str) -> FileResult<Arc<dyn VariantProcessor>> {
        self.processors
            .get(kind)
            .cloned()
            .ok_or_else(|| FileError::UnknownOperation(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.processors.contains_key(kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.processors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Run the processor registered for `options.method`
    pub async fn dispatch(
        &self,
        source: &Path,
        destination: &Path,
        options: &VariantOptions,
    ) -> FileResult<()> {
        let processor = self.get(&options.method)?;
        processor.process(source, destination, options).await
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
