//! Scheduler layer for the runner
//!
//! This layer sequences the pipeline stages for a run: it waits for the
//! trigger, submits the job, applies the retry budget and records every
//! state transition.

pub mod run;

pub use run::PipelineRun;
