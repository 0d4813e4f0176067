use std::time::Duration;

/// Outcome of a committed migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub steps: Vec<StepReport>,
    pub elapsed: Duration,
}

/// Timing of one executed step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepReport {
    pub threshold: u32,
    pub name: String,
    pub elapsed: Duration,
}

impl MigrationReport {
    /// Report of a run that found the store already at its target.
    pub fn noop(version: u32) -> Self {
        MigrationReport {
            from_version: version,
            to_version: version,
            steps: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn executed_thresholds(&self) -> Vec<u32> {
        self.steps.iter().map(|step| step.threshold).collect()
    }

    pub fn is_noop(&self) -> bool {
        self.from_version == self.to_version
    }
}
