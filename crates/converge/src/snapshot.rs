//! Point-in-time observations of resources and tasks
//!
//! A fresh [`ResourceSnapshot`] or [`Task`] is produced by an accessor on
//! every poll. Nothing in the engine mutates one after it has been read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Opaque identifier of a resource within a provider and region/zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a provider-side task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Status value exactly as the provider reported it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeStatus {
    Text(String),
    Code(i64),
}

impl NativeStatus {
    /// Key used for table lookups; integer codes use their decimal form.
    pub fn as_key(&self) -> std::borrow::Cow<'_, str> {
        match self {
            NativeStatus::Text(s) => std::borrow::Cow::Borrowed(s.as_str()),
            NativeStatus::Code(c) => std::borrow::Cow::Owned(c.to_string()),
        }
    }
}

impl std::fmt::Display for NativeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeStatus::Text(s) => f.write_str(s),
            NativeStatus::Code(c) => write!(f, "{}", c),
        }
    }
}

impl From<&str> for NativeStatus {
    fn from(s: &str) -> Self {
        NativeStatus::Text(s.to_string())
    }
}

impl From<String> for NativeStatus {
    fn from(s: String) -> Self {
        NativeStatus::Text(s)
    }
}

impl From<i64> for NativeStatus {
    fn from(c: i64) -> Self {
        NativeStatus::Code(c)
    }
}

impl From<i32> for NativeStatus {
    fn from(c: i32) -> Self {
        NativeStatus::Code(c as i64)
    }
}

/// Kind of resource a status table applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Server,
    LoadBalancer,
    Volume,
    Disk,
    VApp,
    Task,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Server => write!(f, "server"),
            ResourceKind::LoadBalancer => write!(f, "load-balancer"),
            ResourceKind::Volume => write!(f, "volume"),
            ResourceKind::Disk => write!(f, "disk"),
            ResourceKind::VApp => write!(f, "vapp"),
            ResourceKind::Task => write!(f, "task"),
        }
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server" | "vm" | "virtual-machine" | "instance" => Ok(ResourceKind::Server),
            "load-balancer" | "lb" => Ok(ResourceKind::LoadBalancer),
            "volume" => Ok(ResourceKind::Volume),
            "disk" => Ok(ResourceKind::Disk),
            "vapp" => Ok(ResourceKind::VApp),
            "task" | "operation" | "job" => Ok(ResourceKind::Task),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// Anything the poller can observe: a resource or a task
pub trait Observed: std::fmt::Debug + Clone + Send + Sync {
    /// Identifier used in logs and errors
    fn subject(&self) -> &str;

    fn native_status(&self) -> &NativeStatus;

    /// Provider-reported failure detail that makes the observation fatal
    /// regardless of its status.
    fn failure(&self) -> Option<&str> {
        None
    }
}

/// A point-in-time read of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: ResourceId,

    pub kind: ResourceKind,

    pub status: NativeStatus,

    /// Kind-specific fields (addresses, sizes, virtual IPs, ...)
    pub attributes: HashMap<String, serde_json::Value>,

    pub observed_at: DateTime<Utc>,
}

impl ResourceSnapshot {
    pub fn new(
        id: impl Into<ResourceId>,
        kind: ResourceKind,
        status: impl Into<NativeStatus>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            status: status.into(),
            attributes: HashMap::new(),
            observed_at: Utc::now(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn get_attribute<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.attributes
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|v| !v.is_null())
    }
}

impl Observed for ResourceSnapshot {
    fn subject(&self) -> &str {
        self.id.as_str()
    }

    fn native_status(&self) -> &NativeStatus {
        &self.status
    }
}

/// An in-flight mutating operation tracked separately from its resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub status: NativeStatus,

    /// Resource the operation acts upon
    pub target: ResourceId,

    /// Operation name (e.g. "deploy", "powerOn")
    pub operation: String,

    /// Error detail attached by the provider, if any
    pub error: Option<String>,

    /// Completion percentage, when the provider reports one
    pub progress: Option<u8>,
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        status: impl Into<NativeStatus>,
        target: impl Into<ResourceId>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            target: target.into(),
            operation: operation.into(),
            error: None,
            progress: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }
}

impl Observed for Task {
    fn subject(&self) -> &str {
        self.id.as_str()
    }

    fn native_status(&self) -> &NativeStatus {
        &self.status
    }

    fn failure(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
