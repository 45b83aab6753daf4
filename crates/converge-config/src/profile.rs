//! Named wait profiles
//!
//! ```yaml
//! profiles:
//!   server-boot:
//!     interval_ms: 5000
//!     timeout_secs: 600
//!   lb-build:
//!     interval_ms: 30000
//!     max_attempts: 40
//!     fail_on: [deleted]
//! ```

use crate::error::{ConfigError, Result};
use converge::{AwaitSpec, LifecycleState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Polling bounds for one kind of wait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitProfile {
    pub interval_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,

    /// Extra fatal states on top of `error`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail_on: Vec<LifecycleState>,
}

impl WaitProfile {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Build an [`AwaitSpec`] waiting for `accept` with these bounds.
    pub fn to_spec(&self, accept: impl IntoIterator<Item = LifecycleState>) -> AwaitSpec {
        let mut spec = AwaitSpec::new(accept, self.interval());
        spec.max_attempts = self.max_attempts;
        spec.max_elapsed = self.timeout_secs.map(Duration::from_secs);
        for state in &self.fail_on {
            spec = spec.fail_on(*state);
        }
        spec
    }

    /// Same bounds, waiting for deletion
    pub fn to_deleted_spec(&self) -> AwaitSpec {
        let mut spec = self.to_spec([LifecycleState::Deleted]);
        spec.absence_is_success = true;
        spec
    }
}

/// All profiles from one config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitProfiles {
    #[serde(default)]
    pub profiles: BTreeMap<String, WaitProfile>,
}

impl WaitProfiles {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let profiles: WaitProfiles = serde_yaml::from_str(content)?;
        profiles.validate()?;
        Ok(profiles)
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Loading wait profiles from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load from the first config file found by [`find_config_file`](crate::find_config_file).
    pub fn discover() -> Result<Self> {
        let path = crate::find_config_file()?;
        Self::load(&path)
    }

    pub fn profile(&self, name: &str) -> Result<&WaitProfile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Every profile must bound its waits; the engine has no fallback.
    fn validate(&self) -> Result<()> {
        for (name, profile) in &self.profiles {
            let invalid = |reason: &str| ConfigError::InvalidProfile {
                name: name.clone(),
                reason: reason.to_string(),
            };
            if profile.timeout_secs.is_none() && profile.max_attempts.is_none() {
                return Err(invalid("set timeout_secs or max_attempts"));
            }
            if profile.max_attempts == Some(0) {
                return Err(invalid("max_attempts must be at least 1"));
            }
        }
        Ok(())
    }
}
