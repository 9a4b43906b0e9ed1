//! Flightflow Core
//!
//! Core types and abstractions for the flight booking ingestion pipeline.
//!
//! This crate contains:
//! - Domain types: Environment Context, Batch Identifier, Trigger Condition,
//!   Job Specification and the pipeline state model
//! - DTOs: Wire representations of the serverless batch service
//! - Error taxonomy shared by the runner and the CLI

pub mod domain;
pub mod dto;
pub mod error;

pub use error::{PipelineError, Result};
