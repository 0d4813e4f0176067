use super::{MigrationRegistry, MigrationReport, MigrationRun, MigrationStep, StepReport};
use crate::errors::{StrataError, StrataResult};
use crate::store::{SchemaStore, StoreSession};
use std::time::Instant;

/// Brings a store from its current schema version up to a target version.
///
/// A run executes every registered step with `from < threshold <= to` in
/// ascending order inside one [`StoreSession`], writes the target version as
/// the last change of that session and commits. Either all of it becomes
/// durable or none of it does.
pub struct Migrator<S: SchemaStore> {
    registry: MigrationRegistry<S>,
}

impl<S: SchemaStore> Migrator<S> {
    pub fn new(registry: MigrationRegistry<S>) -> Self {
        Migrator { registry }
    }

    pub fn registry(&self) -> &MigrationRegistry<S> {
        &self.registry
    }

    /// Reads the committed version of `store` and migrates it to `to`.
    pub fn migrate_to(&self, store: &S, to: u32) -> StrataResult<MigrationReport> {
        let from = store.schema_version()?;
        self.migrate(store, from, to)
    }

    /// Migrates `store` from version `from` to version `to`.
    ///
    /// # Errors
    ///
    /// * `UnsupportedDowngrade` when `to < from`; the store is not touched.
    /// * `MigrationFailed { threshold }` when a step fails, with the step's
    ///   error as cause. A failure to write the version or to commit is
    ///   reported against the last step of the run. The store keeps its
    ///   previous version and contents.
    pub fn migrate(&self, store: &S, from: u32, to: u32) -> StrataResult<MigrationReport> {
        let run = MigrationRun::plan(&self.registry, from, to)?;
        if run.is_noop() {
            log::debug!("Store {} is already at version {}", store.store_id(), to);
            return Ok(MigrationReport::noop(to));
        }

        log::info!(
            "Migrating store {} from version {} to {} ({} pending steps)",
            store.store_id(),
            from,
            to,
            run.steps().len()
        );

        let started = Instant::now();
        let mut session = store.begin()?;
        let mut executed = Vec::with_capacity(run.steps().len());

        for step in run.steps() {
            match self.execute_step(step, &mut session) {
                Ok(report) => executed.push(report),
                Err(err) => {
                    self.abort(session, from);
                    return Err(StrataError::migration_failed(step.threshold(), err));
                }
            }
        }

        let last_threshold = run.steps().last().map_or(to, |step| step.threshold());
        if let Err(err) = session.set_schema_version(to) {
            log::error!("Failed to record schema version {}: {}", to, err);
            self.abort(session, from);
            return Err(StrataError::migration_failed(last_threshold, err));
        }

        if let Err(err) = session.commit() {
            log::error!("Failed to commit migration to version {}: {}", to, err);
            return Err(StrataError::migration_failed(last_threshold, err));
        }

        let elapsed = started.elapsed();
        log::info!(
            "Migrated store {} to version {} in {} ms",
            store.store_id(),
            to,
            elapsed.as_millis()
        );

        Ok(MigrationReport {
            from_version: from,
            to_version: to,
            steps: executed,
            elapsed,
        })
    }

    fn execute_step(
        &self,
        step: &MigrationStep<S>,
        session: &mut S::Session,
    ) -> StrataResult<StepReport> {
        log::info!("Running migration step {} ({})", step.threshold(), step.name());
        let started = Instant::now();

        if let Err(err) = step.apply(session) {
            log::error!(
                "Migration step {} ({}) failed: {}",
                step.threshold(),
                step.name(),
                err
            );
            return Err(err);
        }

        let elapsed = started.elapsed();
        log::info!(
            "Migration step {} ({}) finished in {} ms",
            step.threshold(),
            step.name(),
            elapsed.as_millis()
        );
        Ok(StepReport {
            threshold: step.threshold(),
            name: step.name().to_string(),
            elapsed,
        })
    }

    fn abort(&self, session: S::Session, from: u32) {
        log::warn!("Rolling back migration, store stays at version {}", from);
        if let Err(err) = session.rollback() {
            log::error!("Rollback failed: {}", err);
        }
    }
}

impl<S: SchemaStore> Clone for Migrator<S> {
    fn clone(&self) -> Self {
        Migrator {
            registry: self.registry.clone(),
        }
    }
}
