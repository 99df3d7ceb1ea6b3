//! Record lifecycle hooks
//!
//! Behaviors attach to an owner's lifecycle by implementing [`RecordHooks`].
//! The set of phases is closed; a hook declares which phases it listens to
//! and the lifecycle driver only dispatches those.

use async_trait::async_trait;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::FileResult;
use crate::owner::{Owner, UploadSource};

/// Lifecycle phases of an owner record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    BeforeValidate,
    AfterValidate,
    AfterInsert,
    AfterUpdate,
    AfterDelete,
}

impl LifecyclePhase {
    pub const ALL: &'static [LifecyclePhase] = &[
        LifecyclePhase::BeforeValidate,
        LifecyclePhase::AfterValidate,
        LifecyclePhase::AfterInsert,
        LifecyclePhase::AfterUpdate,
        LifecyclePhase::AfterDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::BeforeValidate => "before_validate",
            LifecyclePhase::AfterValidate => "after_validate",
            LifecyclePhase::AfterInsert => "after_insert",
            LifecyclePhase::AfterUpdate => "after_update",
            LifecyclePhase::AfterDelete => "after_delete",
        }
    }
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Callbacks run around an owner's validate/save/delete sequence.
///
/// Every callback has a no-op default, so implementors only write the phases
/// they list in [`RecordHooks::phases`].
#[async_trait]
pub trait RecordHooks<O: Owner>: Send {
    /// Hook name for logging
    fn name(&self) -> &str;

    /// Phases this hook is registered for
    fn phases(&self) -> &'static [LifecyclePhase] {
        LifecyclePhase::ALL
    }

    async fn before_validate(&mut self, _owner: &mut O, _uploads: &dyn UploadSource) -> FileResult<()> {
        Ok(())
    }

    /// Extra validation contributed by the hook; runs while `before_validate`
    /// substitutions are in place
    fn validate(&self, _owner: &O) -> Vec<String> {
        Vec::new()
    }

    async fn after_validate(&mut self, _owner: &mut O) -> FileResult<()> {
        Ok(())
    }

    async fn after_insert(&mut self, _owner: &mut O) -> FileResult<()> {
        Ok(())
    }

    async fn after_update(&mut self, _owner: &mut O) -> FileResult<()> {
        Ok(())
    }

    async fn after_delete(&mut self, _owner: &O) -> FileResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::BeforeValidate.to_string(), "before_validate");
        assert_eq!(LifecyclePhase::AfterDelete.as_str(), "after_delete");
        assert_eq!(LifecyclePhase::ALL.len(), 5);
    }
}
