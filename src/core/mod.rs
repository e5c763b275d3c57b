//! Runtime core: per-profile scheduling and multi-profile supervision.
//!
//! Public API: [`Scheduler`], [`SchedulerBuilder`], [`SchedulerHandle`],
//! [`Supervisor`], [`SupervisorBuilder`], the two config structs and
//! [`TaskQueue`].
//!
//! Internal modules:
//! - [`worker`]: the per-profile loop (execute, recover, cooldown, idle);
//! - [`runner`]: executes one run with timeout and panic containment;
//! - [`reconnect`]: re-armable reconnect timer;
//! - [`helper`]: alliance-help side ticker;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod config;
mod handle;
mod helper;
mod queue;
mod reconnect;
mod runner;
mod scheduler;
mod shutdown;
mod supervisor;
mod worker;

pub use builder::{SchedulerBuilder, SupervisorBuilder};
pub use config::{SchedulerConfig, SupervisorConfig};
pub use handle::SchedulerHandle;
pub use queue::TaskQueue;
pub use scheduler::Scheduler;
pub use supervisor::Supervisor;
