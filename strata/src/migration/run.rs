use super::{MigrationRegistry, MigrationStep};
use crate::errors::{StrataError, StrataResult};
use crate::store::SchemaStore;

/// The steps one upgrade from `from` to `to` has to execute.
pub struct MigrationRun<'a, S: SchemaStore> {
    from: u32,
    to: u32,
    steps: Vec<&'a MigrationStep<S>>,
}

impl<'a, S: SchemaStore> MigrationRun<'a, S> {
    /// Plans an upgrade. Fails when `to` is below `from`.
    pub fn plan(registry: &'a MigrationRegistry<S>, from: u32, to: u32) -> StrataResult<Self> {
        if to < from {
            log::error!("Refusing to migrate store from version {} down to {}", from, to);
            return Err(StrataError::unsupported_downgrade(from, to));
        }

        Ok(MigrationRun {
            from,
            to,
            steps: registry.pending(from, to),
        })
    }

    pub fn from(&self) -> u32 {
        self.from
    }

    pub fn to(&self) -> u32 {
        self.to
    }

    pub fn steps(&self) -> &[&'a MigrationStep<S>] {
        &self.steps
    }

    /// True when the store is already at the target version.
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }
}
