//! # Execution Fiber Scheduler
//!
//! A priority-scheduled cooperative runtime: pinned contexts stick to one
//! worker's local FIFO, migratable contexts compete on a shared global
//! priority queue, and both kinds of fiber suspend only at well-defined
//! points (channel send/receive, future wait, I/O completion, explicit
//! yield) rather than being preempted. Generalizes the rest of the
//! workspace's batch-parallel (`rayon`-style) dispatch into genuine
//! priority-ordered scheduling with suspend/resume via [`Dependency`].

pub mod context;
pub mod dependency;
pub mod pool;
pub mod queue;
pub mod worker;

pub use context::{Context, Priority};
pub use dependency::{pair as dependency_pair, Completer, Dependency};
pub use pool::{PoolConfig, PriorityPool};
