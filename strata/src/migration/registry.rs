use super::MigrationStep;
use crate::common::INITIAL_SCHEMA_VERSION;
use crate::errors::{ErrorKind, StrataError, StrataResult};
use crate::store::SchemaStore;
use itertools::Itertools;
use std::sync::Arc;

/// Validated, immutable, ascending list of migration steps.
///
/// Thresholds start at 1 and are strictly increasing in declaration order.
/// Gaps are allowed. A registry that fails these rules is never built.
///
/// # Examples
///
/// ```rust,ignore
/// let registry = MigrationRegistry::builder()
///     .step(1, "baseline", |session: &mut MemorySession| session.create_table("sms"))
///     .step(2, "drafts", |session: &mut MemorySession| session.create_table("drafts"))
///     .build()?;
/// assert_eq!(registry.latest_version(), 2);
/// ```
pub struct MigrationRegistry<S: SchemaStore> {
    steps: Arc<Vec<MigrationStep<S>>>,
}

impl<S: SchemaStore> MigrationRegistry<S> {
    pub fn builder() -> MigrationRegistryBuilder<S> {
        MigrationRegistryBuilder::new()
    }

    /// Validates `steps` and wraps them into a registry.
    pub fn new(steps: Vec<MigrationStep<S>>) -> StrataResult<Self> {
        validate(&steps)?;
        Ok(MigrationRegistry {
            steps: Arc::new(steps),
        })
    }

    /// A registry without steps.
    pub fn empty() -> Self {
        MigrationRegistry {
            steps: Arc::new(Vec::new()),
        }
    }

    pub fn steps(&self) -> &[MigrationStep<S>] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Highest threshold, or 0 when the registry is empty.
    pub fn latest_version(&self) -> u32 {
        self.steps.last().map_or(INITIAL_SCHEMA_VERSION, |step| step.threshold())
    }

    /// Steps with `from < threshold <= to`, in ascending order.
    pub fn pending(&self, from: u32, to: u32) -> Vec<&MigrationStep<S>> {
        self.steps
            .iter()
            .skip_while(|step| step.threshold() <= from)
            .take_while(|step| step.threshold() <= to)
            .collect()
    }
}

impl<S: SchemaStore> Clone for MigrationRegistry<S> {
    fn clone(&self) -> Self {
        MigrationRegistry {
            steps: self.steps.clone(),
        }
    }
}

impl<S: SchemaStore> Default for MigrationRegistry<S> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<S: SchemaStore> std::fmt::Debug for MigrationRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.steps.iter()).finish()
    }
}

fn validate<S: SchemaStore>(steps: &[MigrationStep<S>]) -> StrataResult<()> {
    if let Some(step) = steps.iter().find(|step| step.threshold() == 0) {
        log::error!("Migration step {} has threshold 0", step.name());
        return Err(StrataError::new(
            &format!(
                "Migration step {} has threshold 0, thresholds start at 1",
                step.name()
            ),
            ErrorKind::ConfigurationError,
        ));
    }

    for (previous, next) in steps.iter().tuple_windows() {
        if next.threshold() == previous.threshold() {
            log::error!("Duplicate migration threshold {}", next.threshold());
            return Err(StrataError::new(
                &format!(
                    "Duplicate migration threshold {} ({} and {})",
                    next.threshold(),
                    previous.name(),
                    next.name()
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        if next.threshold() < previous.threshold() {
            log::error!(
                "Migration threshold {} declared after {}",
                next.threshold(),
                previous.threshold()
            );
            return Err(StrataError::new(
                &format!(
                    "Migration thresholds out of order: {} declared after {}",
                    next.threshold(),
                    previous.threshold()
                ),
                ErrorKind::ConfigurationError,
            ));
        }
    }
    Ok(())
}

/// Fluent builder for a [`MigrationRegistry`].
pub struct MigrationRegistryBuilder<S: SchemaStore> {
    steps: Vec<MigrationStep<S>>,
}

impl<S: SchemaStore> MigrationRegistryBuilder<S> {
    pub fn new() -> Self {
        MigrationRegistryBuilder { steps: Vec::new() }
    }

    pub fn step<F>(mut self, threshold: u32, name: &str, action: F) -> Self
    where
        F: Fn(&mut S::Session) -> StrataResult<()> + Send + Sync + 'static,
    {
        self.steps.push(MigrationStep::new(threshold, name, action));
        self
    }

    pub fn add_step(mut self, step: MigrationStep<S>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn build(self) -> StrataResult<MigrationRegistry<S>> {
        MigrationRegistry::new(self.steps)
    }
}

impl<S: SchemaStore> Default for MigrationRegistryBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
