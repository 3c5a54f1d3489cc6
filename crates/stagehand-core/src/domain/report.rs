//! Run results: per-feature outcomes and the final report.
//!
//! The report is the sole interface the engine exposes to its callers
//! (CLI, logging, packaging). It carries every feature's terminal state,
//! any attached errors with the originating stage, and the answer map the
//! run used. The execution model is non-transactional: mutations written
//! by completed stages remain on disk after a later failure, and the
//! report says so rather than hiding it.

use crate::domain::answers::AnswerMap;
use crate::error::EngineError;

// ── Run mode ─────────────────────────────────────────────────────────────────

/// Caller-selected failure policy across features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Stop processing further features after the first Failed feature.
    #[default]
    FailFast,
    /// Record the failure and continue with the next independent feature.
    Continue,
}

// ── Feature state machine ────────────────────────────────────────────────────

/// Feature lifecycle: Pending → (Skipped | Running) → (Completed | Failed).
///
/// `Skipped` and `Completed` are terminal successes. `Failed` is terminal
/// with an attached error. `Pending` appears in reports only for features
/// never attempted because a fail-fast run stopped earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureStatus {
    Pending,
    Skipped,
    Running,
    Completed,
    Failed,
}

impl FeatureStatus {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Skipped | Self::Completed | Self::Failed)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Skipped => "skipped",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────────────

/// Terminal record for one feature.
#[derive(Debug, Clone)]
pub struct FeatureOutcome {
    pub feature: String,
    pub status: FeatureStatus,
    /// Present iff `status == Failed`.
    pub error: Option<EngineError>,
    /// Stage where the failure occurred, when known.
    pub failed_stage: Option<String>,
    /// Stage names never attempted because an earlier stage failed.
    pub unattempted_stages: Vec<String>,
}

impl FeatureOutcome {
    pub fn skipped(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            status: FeatureStatus::Skipped,
            error: None,
            failed_stage: None,
            unattempted_stages: Vec::new(),
        }
    }

    pub fn completed(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            status: FeatureStatus::Completed,
            error: None,
            failed_stage: None,
            unattempted_stages: Vec::new(),
        }
    }

    pub fn pending(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            status: FeatureStatus::Pending,
            error: None,
            failed_stage: None,
            unattempted_stages: Vec::new(),
        }
    }

    pub fn failed(
        feature: impl Into<String>,
        error: EngineError,
        failed_stage: impl Into<String>,
        unattempted_stages: Vec<String>,
    ) -> Self {
        Self {
            feature: feature.into(),
            status: FeatureStatus::Failed,
            error: Some(error),
            failed_stage: Some(failed_stage.into()),
            unattempted_stages,
        }
    }
}

// ── RunReport ────────────────────────────────────────────────────────────────

/// The full result of one engine run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One outcome per registry feature, in resolver order (Pending
    /// outcomes for features a fail-fast run never reached).
    pub outcomes: Vec<FeatureOutcome>,
    /// The answer map the run executed against.
    pub answers: AnswerMap,
    pub mode: RunMode,
}

impl RunReport {
    /// True when no feature failed. Note: completed features' mutations
    /// stay on disk even when this is false — there is no rollback.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status != FeatureStatus::Failed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &FeatureOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == FeatureStatus::Completed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &FeatureOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == FeatureStatus::Failed)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FeatureOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == FeatureStatus::Skipped)
    }

    pub fn outcome_for(&self, feature: &str) -> Option<&FeatureOutcome> {
        self.outcomes.iter().find(|o| o.feature == feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;

    fn sample_error() -> EngineError {
        DomainError::InvalidDeclaration("boom".into()).into()
    }

    #[test]
    fn status_terminality() {
        assert!(FeatureStatus::Skipped.is_terminal());
        assert!(FeatureStatus::Completed.is_terminal());
        assert!(FeatureStatus::Failed.is_terminal());
        assert!(!FeatureStatus::Pending.is_terminal());
        assert!(!FeatureStatus::Running.is_terminal());
    }

    #[test]
    fn report_success_ignores_skips() {
        let report = RunReport {
            outcomes: vec![
                FeatureOutcome::completed("a"),
                FeatureOutcome::skipped("b"),
            ],
            answers: AnswerMap::empty(),
            mode: RunMode::FailFast,
        };
        assert!(report.is_success());
        assert_eq!(report.completed().count(), 1);
        assert_eq!(report.skipped().count(), 1);
    }

    #[test]
    fn failed_outcome_carries_stage_and_remainder() {
        let outcome = FeatureOutcome::failed(
            "docker",
            sample_error(),
            "install",
            vec!["configure".into(), "finalize".into()],
        );
        assert_eq!(outcome.status, FeatureStatus::Failed);
        assert_eq!(outcome.failed_stage.as_deref(), Some("install"));
        assert_eq!(outcome.unattempted_stages.len(), 2);

        let report = RunReport {
            outcomes: vec![outcome, FeatureOutcome::pending("later")],
            answers: AnswerMap::empty(),
            mode: RunMode::FailFast,
        };
        assert!(!report.is_success());
        assert_eq!(report.failed().count(), 1);
        assert_eq!(
            report.outcome_for("later").unwrap().status,
            FeatureStatus::Pending
        );
    }
}
