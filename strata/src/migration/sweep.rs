use crate::errors::StrataResult;
use crate::store::SchemaStore;
use std::fs;
use std::io::ErrorKind as IoErrorKind;

/// Removes files that committed migration steps scheduled for deletion.
///
/// Steps never delete files themselves. They queue paths in their session,
/// and the queue only becomes visible once the session commits. The sweeper
/// drains it afterwards. A path that is already gone counts as removed. A
/// path that cannot be removed stays queued for the next sweep, so running
/// the sweeper again is always safe.
pub struct FileSweeper<'a, S: SchemaStore> {
    store: &'a S,
}

/// Counts of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SweepReport {
    pub removed: usize,
    pub already_gone: usize,
    pub failed: usize,
}

impl SweepReport {
    /// True when nothing is left in the queue because of a failure.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

impl<'a, S: SchemaStore> FileSweeper<'a, S> {
    pub fn new(store: &'a S) -> Self {
        FileSweeper { store }
    }

    pub fn sweep(&self) -> StrataResult<SweepReport> {
        let mut report = SweepReport::default();

        for removal in self.store.pending_removals()? {
            match fs::remove_file(&removal.path) {
                Ok(()) => {
                    log::debug!("Removed {}", removal.path.display());
                    report.removed += 1;
                }
                Err(err) if err.kind() == IoErrorKind::NotFound => {
                    log::debug!("{} is already gone", removal.path.display());
                    report.already_gone += 1;
                }
                Err(err) => {
                    log::warn!(
                        "Failed to remove {}, will retry on next sweep: {}",
                        removal.path.display(),
                        err
                    );
                    report.failed += 1;
                    continue;
                }
            }
            self.store.clear_removal(removal.id)?;
        }

        if report != SweepReport::default() {
            log::info!(
                "File sweep on store {}: {} removed, {} already gone, {} failed",
                self.store.store_id(),
                report.removed,
                report.already_gone,
                report.failed
            );
        }
        Ok(report)
    }
}
