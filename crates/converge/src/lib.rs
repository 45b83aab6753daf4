//! Converge
//!
//! Drives cloud resources to a desired lifecycle state. Control-plane
//! mutations are accepted immediately but complete later, and every provider
//! reports progress with its own status vocabulary. This crate folds those
//! vocabularies onto one [`LifecycleState`] and offers bounded, cancellable
//! waits on top of it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               caller (CLI, service)              │
//! │      submit mutation  ──▶  wait / track task     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                    converge                      │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │ TaskTracker  │─▶│ Poller (+ Predicate)      │ │
//! │  └──────────────┘  └────────────┬─────────────┘ │
//! │  ┌──────────────┐  ┌────────────▼─────────────┐ │
//! │  │   Monitor    │  │ StatusTable / Registry   │ │
//! │  └──────────────┘  └──────────────────────────┘ │
//! └───────┬─────────────────────────────────────────┘
//!         │ trait ResourceAccessor / TaskAccessor
//! ┌───────▼───────┐ ┌───────────────┐
//! │ sakura-cloud  │ │  any provider │
//! │   (usacloud)  │ │    client     │
//! └───────────────┘ └───────────────┘
//! ```

pub mod accessor;
pub mod await_spec;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod poller;
pub mod predicate;
pub mod snapshot;
pub mod status;
pub mod tracker;

// Re-exports
pub use accessor::{Fetched, ResourceAccessor, TaskAccessor};
pub use await_spec::AwaitSpec;
pub use error::{ConvergeError, Result};
pub use lifecycle::LifecycleState;
pub use monitor::{Monitor, MonitorEvent, MonitorHandle};
pub use poller::{ConvergenceOutcome, Poller};
pub use predicate::{ConvergencePredicate, LifecyclePredicate, Verdict, predicate_fn};
pub use snapshot::{
    NativeStatus, Observed, ResourceId, ResourceKind, ResourceSnapshot, Task, TaskId,
};
pub use status::{Normalize, StatusRegistry, StatusTable, Translate, translate};
pub use tracker::TaskTracker;
pub use tokio_util::sync::CancellationToken;
