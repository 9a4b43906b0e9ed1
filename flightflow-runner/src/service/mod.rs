//! Service layer
//!
//! Services contain the logic of the two pipeline stages. They use
//! repositories for every external call so they can be driven by fakes
//! in tests.

mod slots;
mod submitter;
mod watcher;

pub use slots::WorkerSlots;
pub use submitter::JobSubmitter;
pub use watcher::ArrivalWatcher;
