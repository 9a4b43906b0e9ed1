//! Repository layer
//!
//! Repositories are thin adapters over the cloud client that expose only
//! what the pipeline stages need, without any business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod batches;
mod objects;

// Re-export traits
pub use batches::BatchRepository;
pub use objects::ObjectRepository;

// Re-export implementations
pub use batches::HttpBatchRepository;
pub use objects::HttpObjectRepository;
