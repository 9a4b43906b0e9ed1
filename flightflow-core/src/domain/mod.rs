//! Core domain types
//!
//! These types are rebuilt from configuration for every pipeline run and
//! are shared between the runner (executes a run) and the CLI (inspects one).

pub mod batch;
pub mod context;
pub mod job;
pub mod pipeline;
pub mod trigger;
