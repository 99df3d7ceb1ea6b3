//! Record lifecycle driver
//!
//! Runs registered [`RecordHooks`] around an owner's validate, save and delete
//! steps, in registration order, dispatching each phase only to the hooks
//! that listen for it.

use fileward_core::{FileError, FileResult, LifecyclePhase, Owner, RecordHooks, UploadSource};
use std::time::Instant;

pub struct Lifecycle<O: Owner> {
    hooks: Vec<Box<dyn RecordHooks<O>>>,
}

impl<O: Owner> Default for Lifecycle<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Owner> Lifecycle<O> {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook; hooks run in registration order
    pub fn register<H>(&mut self, hook: H) -> &mut Self
    where
        H: RecordHooks<O> + 'static,
    {
        tracing::debug!(
            hook = hook.name(),
            phases = ?hook.phases(),
            "Registering lifecycle hook"
        );
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    fn listening(
        &mut self,
        phase: LifecyclePhase,
    ) -> impl Iterator<Item = &mut Box<dyn RecordHooks<O>>> {
        self.hooks
            .iter_mut()
            .filter(move |hook| hook.phases().contains(&phase))
    }

    /// Run validation with hook substitutions in place. Returns all error
    /// messages from the owner and the hooks.
    pub async fn validate(&mut self, owner: &mut O, uploads: &dyn UploadSource) -> FileResult<Vec<String>> {
        for hook in self.listening(LifecyclePhase::BeforeValidate) {
            hook.before_validate(owner, uploads).await?;
        }

        let mut errors = owner.validate();
        for hook in &self.hooks {
            errors.extend(hook.validate(owner));
        }

        for hook in self.listening(LifecyclePhase::AfterValidate) {
            hook.after_validate(owner).await?;
        }
        Ok(errors)
    }

    /// Validate, persist and run the after-insert or after-update hooks.
    /// Nothing is persisted when validation fails.
    #[tracing::instrument(skip_all, fields(owner_type = %owner.owner_type(), owner_id = %owner.owner_id()))]
    pub async fn save(&mut self, owner: &mut O, uploads: &dyn UploadSource) -> FileResult<()> {
        let start = Instant::now();

        let errors = self.validate(owner, uploads).await?;
        if !errors.is_empty() {
            tracing::debug!(errors = ?errors, "Validation failed");
            return Err(FileError::Validation(errors));
        }

        let inserting = owner.is_new_record();
        owner.persist().await?;

        let phase = if inserting {
            LifecyclePhase::AfterInsert
        } else {
            LifecyclePhase::AfterUpdate
        };
        for hook in self.listening(phase) {
            if inserting {
                hook.after_insert(owner).await?;
            } else {
                hook.after_update(owner).await?;
            }
        }

        tracing::debug!(
            phase = %phase,
            duration_ms = start.elapsed().as_millis() as u64,
            "Owner saved"
        );
        Ok(())
    }

    /// Destroy the owner and run the after-delete hooks
    #[tracing::instrument(skip_all, fields(owner_type = %owner.owner_type(), owner_id = %owner.owner_id()))]
    pub async fn delete(&mut self, owner: &mut O) -> FileResult<()> {
        owner.destroy().await?;
        for hook in self.listening(LifecyclePhase::AfterDelete) {
            hook.after_delete(owner).await?;
        }
        Ok(())
    }
}
