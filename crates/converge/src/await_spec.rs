//! Per-call polling parameters

use crate::error::{ConvergeError, Result};
use crate::lifecycle::LifecycleState;
use std::time::Duration;

/// Bounds and target of a single convergence call
///
/// There are no engine-wide defaults: each call site states how often to
/// poll and how long to keep trying, because a load balancer may take minutes
/// to build while a power cycle takes seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct AwaitSpec {
    /// Maximum number of fetches
    pub max_attempts: Option<u32>,

    /// Maximum wall-clock time since the first fetch
    pub max_elapsed: Option<Duration>,

    /// Fixed delay between fetches
    pub interval: Duration,

    /// States that end the wait successfully
    pub accept: Vec<LifecycleState>,

    /// States that end the wait with a failure
    pub fatal: Vec<LifecycleState>,

    /// Treat "resource not found" as success (delete convergence)
    pub absence_is_success: bool,
}

impl AwaitSpec {
    /// Wait until the resource reaches one of `accept`.
    ///
    /// A budget still has to be set with [`max_attempts`](Self::max_attempts)
    /// or [`timeout`](Self::timeout).
    pub fn new(accept: impl IntoIterator<Item = LifecycleState>, interval: Duration) -> Self {
        Self {
            max_attempts: None,
            max_elapsed: None,
            interval,
            accept: accept.into_iter().collect(),
            fatal: vec![LifecycleState::Error],
            absence_is_success: false,
        }
    }

    pub fn active(interval: Duration) -> Self {
        Self::new([LifecycleState::Active], interval)
    }

    /// Wait until the resource is gone, either listed as deleted or not found
    pub fn deleted(interval: Duration) -> Self {
        Self {
            absence_is_success: true,
            ..Self::new([LifecycleState::Deleted], interval)
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.max_elapsed = Some(timeout);
        self
    }

    /// Also stop with a failure when `state` is observed
    pub fn fail_on(mut self, state: LifecycleState) -> Self {
        if !self.fatal.contains(&state) {
            self.fatal.push(state);
        }
        self
    }

    pub fn absence_is_success(mut self, yes: bool) -> Self {
        self.absence_is_success = yes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts.is_none() && self.max_elapsed.is_none() {
            return Err(ConvergeError::InvalidSpec(
                "either max_attempts or a timeout is required".to_string(),
            ));
        }
        if self.max_attempts == Some(0) {
            return Err(ConvergeError::InvalidSpec(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.accept.is_empty() && !self.absence_is_success {
            return Err(ConvergeError::InvalidSpec(
                "no acceptable state given".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_acceptable(&self, state: LifecycleState) -> bool {
        self.accept.contains(&state)
    }

    /// Acceptable states win over fatal ones, so waiting *for* `Error` works.
    pub fn is_fatal(&self, state: LifecycleState) -> bool {
        !self.is_acceptable(state) && self.fatal.contains(&state)
    }

    /// Whether another fetch is allowed after `attempts` fetches and `elapsed` time
    pub fn is_exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        let attempts_spent = self.max_attempts.is_some_and(|max| attempts >= max);
        let time_spent = self.max_elapsed.is_some_and(|max| elapsed >= max);
        attempts_spent || time_spent
    }

    /// Delay before the next fetch; never sleeps past the deadline
    pub fn next_delay(&self, elapsed: Duration) -> Duration {
        match self.max_elapsed {
            Some(max) => self.interval.min(max.saturating_sub(elapsed)),
            None => self.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_required() {
        let spec = AwaitSpec::active(Duration::from_secs(1));
        assert!(matches!(spec.validate(), Err(ConvergeError::InvalidSpec(_))));
        assert!(spec.clone().max_attempts(3).validate().is_ok());
        assert!(spec.timeout(Duration::from_secs(5)).validate().is_ok());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let spec = AwaitSpec::active(Duration::ZERO).max_attempts(0);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_empty_accept_needs_absence() {
        let spec = AwaitSpec::new([], Duration::ZERO).max_attempts(1);
        assert!(spec.validate().is_err());
        assert!(spec.absence_is_success(true).validate().is_ok());
    }

    #[test]
    fn test_acceptable_wins_over_fatal() {
        let spec = AwaitSpec::new([LifecycleState::Error], Duration::ZERO);
        assert!(spec.is_acceptable(LifecycleState::Error));
        assert!(!spec.is_fatal(LifecycleState::Error));

        let spec = AwaitSpec::active(Duration::ZERO).fail_on(LifecycleState::Deleted);
        assert!(spec.is_fatal(LifecycleState::Error));
        assert!(spec.is_fatal(LifecycleState::Deleted));
        assert!(!spec.is_fatal(LifecycleState::Unrecognized));
    }

    #[test]
    fn test_exhaustion() {
        let spec = AwaitSpec::active(Duration::from_secs(1))
            .max_attempts(3)
            .timeout(Duration::from_secs(60));
        assert!(!spec.is_exhausted(2, Duration::from_secs(2)));
        assert!(spec.is_exhausted(3, Duration::from_secs(2)));
        assert!(spec.is_exhausted(1, Duration::from_secs(60)));
    }

    #[test]
    fn test_next_delay_clamped_to_deadline() {
        let spec = AwaitSpec::active(Duration::from_secs(10)).timeout(Duration::from_secs(25));
        assert_eq!(spec.next_delay(Duration::from_secs(0)), Duration::from_secs(10));
        assert_eq!(spec.next_delay(Duration::from_secs(20)), Duration::from_secs(5));
    }

    #[test]
    fn test_deleted_spec() {
        let spec = AwaitSpec::deleted(Duration::from_secs(2));
        assert!(spec.absence_is_success);
        assert!(spec.is_acceptable(LifecycleState::Deleted));
    }
}
