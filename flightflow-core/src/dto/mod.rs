//! Data Transfer Objects for the serverless batch service
//!
//! Lightweight representations of the resources the batch API returns.
//! Only the fields the pipeline reads are modelled; unknown fields are ignored.

pub mod batch;
