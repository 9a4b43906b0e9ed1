//! Pipeline state model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::batch::BatchId;
use crate::error::PipelineError;

/// State of a pipeline run
///
/// `WaitingForFile -> SubmittingJob -> {Succeeded, Failed}`. Any stage failure
/// moves straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    WaitingForFile,
    SubmittingJob,
    Succeeded,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        matches!(
            (self, next),
            (Self::WaitingForFile, Self::SubmittingJob)
                | (Self::WaitingForFile, Self::Failed)
                | (Self::SubmittingJob, Self::Succeeded)
                | (Self::SubmittingJob, Self::Failed)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::WaitingForFile => write!(f, "WAITING_FOR_FILE"),
            PipelineState::SubmittingJob => write!(f, "SUBMITTING_JOB"),
            PipelineState::Succeeded => write!(f, "SUCCEEDED"),
            PipelineState::Failed => write!(f, "FAILED"),
        }
    }
}

/// How the Arrival Watcher holds its worker slot while waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    /// Hold the slot for the entire wait
    #[default]
    Poke,
    /// Take the slot for each check and release it in between
    Reschedule,
}

impl FromStr for WaitMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "poke" => Ok(WaitMode::Poke),
            "reschedule" => Ok(WaitMode::Reschedule),
            other => Err(PipelineError::invalid(
                "wait_mode",
                format!("expected 'poke' or 'reschedule', got '{}'", other),
            )),
        }
    }
}

impl fmt::Display for WaitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitMode::Poke => write!(f, "poke"),
            WaitMode::Reschedule => write!(f, "reschedule"),
        }
    }
}

/// Fixed-count, fixed-delay retry budget applied to every stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total attempts a stage may make
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(300))
    }
}

/// A recorded state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub at: DateTime<Utc>,
}

/// Outcome of a complete pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: PipelineState,
    /// Stage that was active when the run failed
    pub failed_stage: Option<PipelineState>,
    /// Serialized as the error's message
    #[serde(serialize_with = "error_message", skip_deserializing)]
    pub error: Option<PipelineError>,
    /// Every batch identifier used for a submission attempt, in order
    pub batch_ids: Vec<BatchId>,
    pub watch_attempts: u32,
    pub submit_attempts: u32,
    pub transitions: Vec<Transition>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            state: PipelineState::WaitingForFile,
            failed_stage: None,
            error: None,
            batch_ids: Vec::new(),
            watch_attempts: 0,
            submit_attempts: 0,
            transitions: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Moves to `next`, recording the transition
    ///
    /// Transitions the state machine does not allow are ignored and return `false`.
    pub fn advance(&mut self, next: PipelineState) -> bool {
        if !self.state.can_transition_to(next) {
            return false;
        }

        self.transitions.push(Transition {
            from: self.state,
            to: next,
            at: Utc::now(),
        });
        self.state = next;

        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        true
    }

    /// Marks the run failed in its current stage
    pub fn fail(&mut self, error: PipelineError) {
        if self.state.is_terminal() {
            return;
        }
        self.failed_stage = Some(self.state);
        self.error = Some(error);
        self.advance(PipelineState::Failed);
    }

    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Succeeded
    }
}

fn error_message<S: Serializer>(
    error: &Option<PipelineError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use PipelineState::*;

        assert!(WaitingForFile.can_transition_to(SubmittingJob));
        assert!(WaitingForFile.can_transition_to(Failed));
        assert!(SubmittingJob.can_transition_to(Succeeded));
        assert!(SubmittingJob.can_transition_to(Failed));

        assert!(!WaitingForFile.can_transition_to(Succeeded));
        assert!(!SubmittingJob.can_transition_to(WaitingForFile));
        assert!(!Succeeded.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(SubmittingJob));
    }

    #[test]
    fn test_report_records_transitions() {
        let mut report = RunReport::new(Uuid::new_v4());

        assert!(report.advance(PipelineState::SubmittingJob));
        assert!(!report.advance(PipelineState::WaitingForFile));
        assert!(report.advance(PipelineState::Succeeded));

        assert!(report.succeeded());
        assert_eq!(report.transitions.len(), 2);
        assert!(report.finished_at.is_some());
    }

    #[test]
    fn test_fail_keeps_stage() {
        let mut report = RunReport::new(Uuid::new_v4());
        report.fail(PipelineError::Cancelled);

        assert_eq!(report.state, PipelineState::Failed);
        assert_eq!(report.failed_stage, Some(PipelineState::WaitingForFile));
        assert_eq!(report.error, Some(PipelineError::Cancelled));

        // a terminal report is not overwritten
        report.fail(PipelineError::SubmissionRejected("late".to_string()));
        assert_eq!(report.error, Some(PipelineError::Cancelled));
    }

    #[test]
    fn test_report_json_carries_error() {
        let mut report = RunReport::new(Uuid::new_v4());
        report.fail(PipelineError::TriggerTimeout {
            object: "gs://b/airflow-project/source-dev/flight_booking.csv".to_string(),
            timeout_secs: 300,
        });

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["error"],
            "Trigger object gs://b/airflow-project/source-dev/flight_booking.csv did not appear within 300s"
        );

        let succeeded = serde_json::to_value(RunReport::new(Uuid::new_v4())).unwrap();
        assert!(succeeded["error"].is_null());
    }

    #[test]
    fn test_wait_mode_parsing() {
        assert_eq!("poke".parse::<WaitMode>().unwrap(), WaitMode::Poke);
        assert_eq!(" Reschedule ".parse::<WaitMode>().unwrap(), WaitMode::Reschedule);
        assert!("block".parse::<WaitMode>().is_err());
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay, Duration::from_secs(300));
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }
}
