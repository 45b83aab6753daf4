//! Provider seams
//!
//! Provider clients implement these traits; the engine only ever reads
//! through them. Submitting mutations stays with the caller.

use crate::error::Result;
use crate::snapshot::{ResourceId, ResourceSnapshot, Task, TaskId};
use async_trait::async_trait;

/// Result of a single fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    /// The provider reported the resource as nonexistent
    NotFound,
}

impl<T> Fetched<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Fetched::Found(value) => Some(value),
            Fetched::NotFound => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Fetched::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Found(value) => Fetched::Found(f(value)),
            Fetched::NotFound => Fetched::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Fetched<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Fetched::Found(value),
            None => Fetched::NotFound,
        }
    }
}

/// Reads the current state of a resource
///
/// Transport failures are returned as `Err`; "does not exist" is
/// `Ok(Fetched::NotFound)`.
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Provider name, matching the status table used to translate results
    fn provider(&self) -> &str;

    async fn fetch_resource(&self, id: &ResourceId) -> Result<Fetched<ResourceSnapshot>>;
}

/// Reads the current state of a provider task
#[async_trait]
pub trait TaskAccessor: Send + Sync {
    fn provider(&self) -> &str;

    async fn fetch_task(&self, id: &TaskId) -> Result<Task>;
}
