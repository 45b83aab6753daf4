//! Convergence error types

use crate::lifecycle::LifecycleState;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the convergence engine
#[derive(Error, Debug)]
pub enum ConvergeError {
    #[error(
        "Timed out waiting for {resource} after {attempts} attempts ({elapsed:?}), last state: {}",
        describe_state(.last_state)
    )]
    Timeout {
        resource: String,
        last_state: Option<LifecycleState>,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("{resource} reached fatal state {state} (native status: {native})")]
    FatalState {
        resource: String,
        state: LifecycleState,
        native: String,
    },

    #[error("{operation} on {resource} finished but resource is {actual}, expected {expected}")]
    UnexpectedState {
        resource: String,
        actual: LifecycleState,
        expected: LifecycleState,
        operation: String,
    },

    #[error("failed to {operation} (task {task}): last status {last_status}")]
    OperationFailed {
        operation: String,
        task: String,
        last_status: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Wait for {resource} was cancelled")]
    Cancelled { resource: String },

    #[error("Invalid await spec: {0}")]
    InvalidSpec(String),
}

// Both surface as transport failures from accessors.
impl From<std::io::Error> for ConvergeError {
    fn from(e: std::io::Error) -> Self {
        ConvergeError::Transport(format!("IO error: {}", e))
    }
}

impl From<serde_json::Error> for ConvergeError {
    fn from(e: serde_json::Error) -> Self {
        ConvergeError::Transport(format!("JSON error: {}", e))
    }
}

impl ConvergeError {
    /// Whether retrying the wait with a larger budget could help
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConvergeError::Timeout { .. })
    }
}

fn describe_state(state: &Option<LifecycleState>) -> String {
    match state {
        Some(state) => state.to_string(),
        None => "not found".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ConvergeError>;
