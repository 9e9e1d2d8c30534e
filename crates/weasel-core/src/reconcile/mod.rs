//! Reconciliation between the two locations of a link
//!
//! - [`drift`]: classify how the locations relate
//! - [`engine`]: the clone, sync, up, push, pull and status operations
//! - [`report`]: what the operations return

pub mod drift;
pub mod engine;
pub mod report;

pub use drift::{Drift, DriftDetector, DriftInputs, DriftReport, LinkState, classify};
pub use engine::{CloneOptions, Reconciler};
pub use report::{Operation, OperationReport, StatusReport};
