//! Run-level orchestration over the collaborator seams.

pub mod batch;

pub use batch::{BatchError, BatchRunner, BatchSummary};
