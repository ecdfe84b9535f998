//! Serial execution primitives for isolation domains.
//!
//! This crate provides the scheduling side of pluggable actor execution:
//!
//! - [`Job`] - one opaque unit of isolated work, run exactly once.
//! - [`SerialExecutor`] - the capability accepting jobs and guaranteeing
//!   non-overlapping, in-order, eventual execution.
//! - [`ExecutorId`] and [`current_executor`] - comparable identities used to
//!   elide redundant hops onto an executor the caller is already on.
//! - [`SerialQueue`] - a bounded serial work queue drained by one dedicated
//!   worker thread.
//! - [`QueueExecutor`] - the bridge implementing [`SerialExecutor`] on top
//!   of one [`SerialQueue`].
//!
//! The binding of isolated state to an executor lives in `strand-isolate`.

mod bridge;
mod current;
mod executor;
mod job;
mod queue;

pub use bridge::{Handoff, QueueExecutor};
pub use current::{ExecutorScope, current_executor};
pub use executor::{ExecutorId, SerialExecutor};
pub use job::Job;
pub use queue::{QueueSpec, QueueSubmitError, SerialQueue};
