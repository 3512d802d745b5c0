//! Batch execution: item producers, the step-wise runner and interactive preview history.

/// Per-item rendering for procedural and photo-edit batches.
pub mod producer;
/// Interactive single-shot generation with history.
pub mod preview;
/// Step-wise batch runner with progress and cancellation.
pub mod runner;
