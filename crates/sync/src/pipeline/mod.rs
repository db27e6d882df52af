//! The reconciliation pipeline.
//!
//! Per file: resolve the filename key to an entity, sweep any prior asset
//! occupying the slot, run the staged-transfer handshake, poll readiness,
//! attach through the fallback chain. The orchestrator runs files through a
//! bounded worker pool and reorders each touched entity's media once the
//! batch drains.

mod orchestrator;
mod poller;
mod reconcile;
mod resolver;

pub use orchestrator::{BatchRunner, RunOptions};
pub use poller::{Readiness, poll_readiness};
pub use reconcile::{assign_alt, occupies, plan_reorder};
pub use resolver::resolve;
