//! Scripted accessors shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use converge::{
    Fetched, NativeStatus, ResourceAccessor, ResourceId, ResourceKind, ResourceSnapshot, Result,
    Task, TaskAccessor, TaskId,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Replays a fixed sequence of fetch results; the last one repeats forever.
pub struct ScriptedResource {
    kind: ResourceKind,
    script: Mutex<VecDeque<Option<NativeStatus>>>,
    calls: AtomicU32,
}

impl ScriptedResource {
    /// `None` entries are served as `NotFound`.
    pub fn new(kind: ResourceKind, script: Vec<Option<NativeStatus>>) -> Self {
        assert!(!script.is_empty());
        Self {
            kind,
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn statuses(kind: ResourceKind, statuses: &[&str]) -> Self {
        Self::new(
            kind,
            statuses.iter().map(|s| Some(NativeStatus::from(*s))).collect(),
        )
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Option<NativeStatus> {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl ResourceAccessor for ScriptedResource {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn fetch_resource(&self, id: &ResourceId) -> Result<Fetched<ResourceSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .next()
            .map(|status| ResourceSnapshot::new(id.clone(), self.kind, status))
            .into())
    }
}

/// Replays task statuses the same way
pub struct ScriptedTask {
    target: ResourceId,
    operation: String,
    script: Mutex<VecDeque<NativeStatus>>,
    calls: AtomicU32,
}

impl ScriptedTask {
    pub fn new(target: &str, operation: &str, statuses: &[&str]) -> Self {
        assert!(!statuses.is_empty());
        Self {
            target: target.into(),
            operation: operation.to_string(),
            script: Mutex::new(statuses.iter().map(|s| NativeStatus::from(*s)).collect()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The task as returned by the submitting call
    pub fn submitted(&self, id: &str, status: &str) -> Task {
        Task::new(id, status, self.target.clone(), self.operation.clone())
    }
}

#[async_trait]
impl TaskAccessor for ScriptedTask {
    fn provider(&self) -> &str {
        "scripted"
    }

    async fn fetch_task(&self, id: &TaskId) -> Result<Task> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let status = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        };
        Ok(Task::new(
            id.clone(),
            status,
            self.target.clone(),
            self.operation.clone(),
        ))
    }
}
