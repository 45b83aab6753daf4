//! Provider-neutral lifecycle vocabulary
//!
//! Every native status a provider reports is folded onto one of these
//! states by a [`StatusTable`](crate::status::StatusTable).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse lifecycle state shared by every provider and resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Resource exists but is not usable yet (creating, building, resizing)
    Pending,
    /// Resource is usable for its primary purpose
    Active,
    /// Resource exists but is paused or stopped, and can be resumed
    Suspended,
    /// Terminal failure, not resumable
    Error,
    /// Resource no longer exists
    Deleted,
    /// Native status present but unmapped; treated as still converging
    Unrecognized,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 6] = [
        LifecycleState::Pending,
        LifecycleState::Active,
        LifecycleState::Suspended,
        LifecycleState::Error,
        LifecycleState::Deleted,
        LifecycleState::Unrecognized,
    ];

    /// Whether the state is stable, i.e. polling past it is pointless unless
    /// another mutation is submitted.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            LifecycleState::Active
                | LifecycleState::Suspended
                | LifecycleState::Error
                | LifecycleState::Deleted
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "pending"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Suspended => write!(f, "suspended"),
            LifecycleState::Error => write!(f, "error"),
            LifecycleState::Deleted => write!(f, "deleted"),
            LifecycleState::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

impl FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(LifecycleState::Pending),
            "active" | "running" | "available" => Ok(LifecycleState::Active),
            "suspended" | "stopped" => Ok(LifecycleState::Suspended),
            "error" | "failed" => Ok(LifecycleState::Error),
            "deleted" | "terminated" => Ok(LifecycleState::Deleted),
            "unrecognized" => Ok(LifecycleState::Unrecognized),
            other => Err(format!("unknown lifecycle state: {}", other)),
        }
    }
}
