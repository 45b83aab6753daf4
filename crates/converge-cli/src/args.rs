use clap::{Args, ValueEnum};
use converge::{AwaitSpec, LifecycleState};
use converge_config::WaitProfiles;
use std::time::Duration;

const DEFAULT_INTERVAL_MS: u64 = 5_000;
const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Server,
    Disk,
}

/// Polling bounds shared by every waiting command
#[derive(Debug, Clone, Default, Args)]
pub struct WaitArgs {
    /// Named wait profile from converge.yaml
    #[arg(short, long, env = "CONVERGE_PROFILE")]
    pub profile: Option<String>,

    /// Delay between polls
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Give up after this many polls
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

impl WaitArgs {
    /// Build the `AwaitSpec`: profile first, then explicit flags on top.
    /// Without either, poll every 5s for up to 10 minutes.
    pub fn to_spec(&self, accept: LifecycleState) -> anyhow::Result<AwaitSpec> {
        let mut spec = match &self.profile {
            Some(name) => WaitProfiles::discover()?.profile(name)?.to_spec([accept]),
            None => AwaitSpec::new([accept], Duration::from_millis(DEFAULT_INTERVAL_MS)),
        };

        if let Some(ms) = self.interval_ms {
            spec.interval = Duration::from_millis(ms);
        }
        if let Some(secs) = self.timeout_secs {
            spec.max_elapsed = Some(Duration::from_secs(secs));
        }
        if let Some(attempts) = self.max_attempts {
            spec.max_attempts = Some(attempts);
        }
        if spec.max_elapsed.is_none() && spec.max_attempts.is_none() {
            spec.max_elapsed = Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        }

        spec.validate()?;
        Ok(spec)
    }

    pub fn to_deleted_spec(&self) -> anyhow::Result<AwaitSpec> {
        let mut spec = self.to_spec(LifecycleState::Deleted)?;
        spec.absence_is_success = true;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_bounded() {
        let spec = WaitArgs::default().to_spec(LifecycleState::Active).unwrap();
        assert_eq!(spec.interval, Duration::from_secs(5));
        assert_eq!(spec.max_elapsed, Some(Duration::from_secs(600)));
        assert_eq!(spec.max_attempts, None);
    }

    #[test]
    fn test_flags_override() {
        let args = WaitArgs {
            interval_ms: Some(250),
            max_attempts: Some(4),
            ..Default::default()
        };
        let spec = args.to_spec(LifecycleState::Suspended).unwrap();
        assert_eq!(spec.interval, Duration::from_millis(250));
        assert_eq!(spec.max_attempts, Some(4));
        assert_eq!(spec.max_elapsed, None);
        assert!(spec.is_acceptable(LifecycleState::Suspended));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let args = WaitArgs {
            max_attempts: Some(0),
            ..Default::default()
        };
        assert!(args.to_spec(LifecycleState::Active).is_err());
    }

    #[test]
    fn test_deleted_spec() {
        let spec = WaitArgs::default().to_deleted_spec().unwrap();
        assert!(spec.absence_is_success);
        assert_eq!(spec.accept, vec![LifecycleState::Deleted]);
    }
}
