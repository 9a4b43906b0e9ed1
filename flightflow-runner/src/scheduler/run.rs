//! Pipeline run controller
//!
//! Drives one run through `WAITING_FOR_FILE -> SUBMITTING_JOB -> {SUCCEEDED, FAILED}`.
//! Each stage gets the same fixed retry budget; the submission stage mints a
//! fresh batch identifier for every attempt after the first.

use flightflow_core::PipelineError;
use flightflow_core::domain::batch::BatchId;
use flightflow_core::domain::context::{EnvironmentContext, VariableSource};
use flightflow_core::domain::job::{JobSpecification, SubmissionSettings};
use flightflow_core::domain::pipeline::{PipelineState, RetryPolicy, RunReport};
use flightflow_core::domain::trigger::TriggerCondition;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::service::{ArrivalWatcher, JobSubmitter};

/// One instantiated pipeline run
///
/// Everything the run needs is derived up front from configuration, so a
/// bad configuration fails here before any external call is made.
pub struct PipelineRun {
    run_id: Uuid,
    context: EnvironmentContext,
    trigger: TriggerCondition,
    spec: JobSpecification,
    /// Identifier for the first submission attempt
    initial_batch_id: Option<BatchId>,
    watcher: ArrivalWatcher,
    submitter: JobSubmitter,
    retry: RetryPolicy,
}

impl PipelineRun {
    /// Instantiates a run from the variable store
    ///
    /// # Errors
    /// `ConfigurationMissing` or `ConfigurationInvalid` when the variables
    /// cannot be resolved into an Environment Context.
    pub fn prepare(
        variables: &dyn VariableSource,
        settings: &SubmissionSettings,
        watcher: ArrivalWatcher,
        submitter: JobSubmitter,
        retry: RetryPolicy,
    ) -> Result<Self, PipelineError> {
        let context = EnvironmentContext::resolve(variables)?;
        let trigger = TriggerCondition::for_context(&context, &settings.object_prefix);
        let spec = JobSpecification::build(&context, settings);
        let initial_batch_id = BatchId::generate(&context.env)?;

        Ok(Self {
            run_id: Uuid::new_v4(),
            context,
            trigger,
            spec,
            initial_batch_id: Some(initial_batch_id),
            watcher,
            submitter,
            retry,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn trigger(&self) -> &TriggerCondition {
        &self.trigger
    }

    /// Runs both stages to a terminal state
    ///
    /// The submitter is never invoked unless the watcher reported success.
    pub async fn run(mut self, cancel: CancellationToken) -> RunReport {
        let mut report = RunReport::new(self.run_id);

        info!(
            run_id = %self.run_id,
            env = %self.context.env,
            "Starting pipeline run, waiting for {}",
            self.trigger
        );

        if let Err(e) = self.watch_stage(&mut report, &cancel).await {
            return self.finish_failed(report, e);
        }

        report.advance(PipelineState::SubmittingJob);
        info!(run_id = %self.run_id, "Trigger satisfied, submitting job");

        if let Err(e) = self.submit_stage(&mut report, &cancel).await {
            return self.finish_failed(report, e);
        }

        report.advance(PipelineState::Succeeded);
        info!(run_id = %self.run_id, "Pipeline run succeeded");
        report
    }

    async fn watch_stage(
        &self,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        loop {
            report.watch_attempts += 1;

            match self.watcher.wait(&self.trigger, cancel).await {
                Ok(_) => return Ok(()),
                Err(e) => self.retry_or_fail(e, report.watch_attempts, cancel).await?,
            }
        }
    }

    async fn submit_stage(
        &mut self,
        report: &mut RunReport,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        loop {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let batch_id = match self.initial_batch_id.take() {
                Some(id) => id,
                None => BatchId::generate(&self.context.env)?,
            };

            report.submit_attempts += 1;
            report.batch_ids.push(batch_id.clone());
            info!(
                run_id = %self.run_id,
                batch_id = %batch_id,
                "Submission attempt {}",
                report.submit_attempts
            );

            match self
                .submitter
                .submit_and_wait(&self.spec, &batch_id, cancel)
                .await
            {
                Ok(_) => return Ok(()),
                Err(e) => self.retry_or_fail(e, report.submit_attempts, cancel).await?,
            }
        }
    }

    /// Waits out the retry delay, or hands the error back when the budget is spent
    async fn retry_or_fail(
        &self,
        error: PipelineError,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        if !error.is_retryable() || attempt >= self.retry.max_attempts() {
            return Err(error);
        }

        warn!(
            run_id = %self.run_id,
            "Attempt {}/{} failed: {}; retrying in {:?}",
            attempt,
            self.retry.max_attempts(),
            error,
            self.retry.delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = time::sleep(self.retry.delay) => Ok(()),
        }
    }

    fn finish_failed(&self, mut report: RunReport, error: PipelineError) -> RunReport {
        error!(
            run_id = %self.run_id,
            stage = %report.state,
            "Pipeline run failed: {}",
            error
        );
        report.fail(error);
        report
    }
}
