use crate::errors::StrataResult;
use crate::store::SchemaStore;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// The body of a migration step.
pub type StepAction<S> =
    Arc<dyn Fn(&mut <S as SchemaStore>::Session) -> StrataResult<()> + Send + Sync>;

/// One rung of the upgrade ladder.
///
/// A step with threshold `t` is the change that brings a store from schema
/// version `t - 1` to `t`. It runs inside the session shared by every step of
/// the same run, so it sees what earlier steps did and its changes are
/// committed or discarded together with theirs.
pub struct MigrationStep<S: SchemaStore> {
    threshold: u32,
    name: String,
    action: StepAction<S>,
}

impl<S: SchemaStore> MigrationStep<S> {
    pub fn new<F>(threshold: u32, name: &str, action: F) -> Self
    where
        F: Fn(&mut S::Session) -> StrataResult<()> + Send + Sync + 'static,
    {
        MigrationStep {
            threshold,
            name: name.to_string(),
            action: Arc::new(action),
        }
    }

    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn apply(&self, session: &mut S::Session) -> StrataResult<()> {
        (self.action)(session)
    }
}

impl<S: SchemaStore> Clone for MigrationStep<S> {
    fn clone(&self) -> Self {
        MigrationStep {
            threshold: self.threshold,
            name: self.name.clone(),
            action: self.action.clone(),
        }
    }
}

impl<S: SchemaStore> Debug for MigrationStep<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("threshold", &self.threshold)
            .field("name", &self.name)
            .finish()
    }
}
