//! Background monitoring
//!
//! [`Monitor`] runs waits as tokio tasks and publishes their outcome on a
//! broadcast channel, so callers can submit a mutation, hand the resource to
//! the monitor and react to events instead of blocking on each wait.

use crate::accessor::ResourceAccessor;
use crate::await_spec::AwaitSpec;
use crate::error::ConvergeError;
use crate::lifecycle::LifecycleState;
use crate::poller::{ConvergenceOutcome, Poller};
use crate::snapshot::{ResourceId, ResourceSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

/// Final outcome of one monitored wait
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Reached an acceptable state; `snapshot` is `None` when the resource is gone
    Completed {
        resource: ResourceId,
        snapshot: Option<ResourceSnapshot>,
    },
    Failed {
        resource: ResourceId,
        state: LifecycleState,
        snapshot: ResourceSnapshot,
    },
    TimedOut {
        resource: ResourceId,
        last_state: Option<LifecycleState>,
        attempts: u32,
        elapsed: Duration,
    },
    Cancelled {
        resource: ResourceId,
    },
    /// The wait itself failed (transport error, invalid spec, panic)
    Errored {
        resource: ResourceId,
        message: String,
    },
}

impl MonitorEvent {
    pub fn resource(&self) -> &ResourceId {
        match self {
            MonitorEvent::Completed { resource, .. }
            | MonitorEvent::Failed { resource, .. }
            | MonitorEvent::TimedOut { resource, .. }
            | MonitorEvent::Cancelled { resource }
            | MonitorEvent::Errored { resource, .. } => resource,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, MonitorEvent::Completed { .. })
    }

    fn from_wait(
        resource: ResourceId,
        result: crate::error::Result<ConvergenceOutcome<ResourceSnapshot>>,
    ) -> Self {
        match result {
            Ok(ConvergenceOutcome::Converged(snapshot)) => {
                MonitorEvent::Completed { resource, snapshot }
            }
            Ok(ConvergenceOutcome::Failed { state, snapshot }) => MonitorEvent::Failed {
                resource,
                state,
                snapshot,
            },
            Ok(ConvergenceOutcome::TimedOut {
                last_state,
                attempts,
                elapsed,
                ..
            }) => MonitorEvent::TimedOut {
                resource,
                last_state,
                attempts,
                elapsed,
            },
            Err(ConvergeError::Cancelled { .. }) => MonitorEvent::Cancelled { resource },
            Err(e) => MonitorEvent::Errored {
                resource,
                message: e.to_string(),
            },
        }
    }
}

/// Spawns waits against one accessor and broadcasts their outcome
///
/// Dropping the monitor cancels the waits it started.
pub struct Monitor {
    poller: Poller,
    accessor: Arc<dyn ResourceAccessor>,
    events: broadcast::Sender<MonitorEvent>,
    root: CancellationToken,
}

impl Monitor {
    pub fn new(poller: Poller, accessor: Arc<dyn ResourceAccessor>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let root = poller.cancellation_token().child_token();
        Self {
            poller,
            accessor,
            events,
            root,
        }
    }

    /// Receive events of waits started after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }

    /// Start waiting for `id` in the background.
    pub fn watch(&self, id: ResourceId, spec: AwaitSpec) -> MonitorHandle {
        let token = self.root.child_token();
        let poller = self.poller.clone().with_cancellation(token.clone());
        let accessor = Arc::clone(&self.accessor);
        let events = self.events.clone();
        let resource = id.clone();

        tracing::debug!(resource = %id, provider = accessor.provider(), "Start monitoring");

        let join = tokio::spawn(async move {
            let result = poller.wait_for_resource(accessor.as_ref(), &id, &spec).await;
            let event = MonitorEvent::from_wait(id, result);
            tracing::debug!(resource = %event.resource(), ?event, "Monitoring finished");
            // no subscribers is fine
            let _ = events.send(event.clone());
            event
        });

        MonitorHandle {
            resource,
            token,
            join,
        }
    }

    /// Start waiting for `id` to disappear in the background.
    pub fn watch_deleted(&self, id: ResourceId, spec: AwaitSpec) -> MonitorHandle {
        let spec = AwaitSpec {
            accept: vec![LifecycleState::Deleted],
            absence_is_success: true,
            ..spec
        };
        self.watch(id, spec)
    }

    /// Cancel every wait started by this monitor.
    pub fn shutdown(&self) {
        tracing::info!("Stopping all monitors");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Handle to one background wait
#[derive(Debug)]
pub struct MonitorHandle {
    resource: ResourceId,
    token: CancellationToken,
    join: JoinHandle<MonitorEvent>,
}

impl MonitorHandle {
    pub fn resource(&self) -> &ResourceId {
        &self.resource
    }

    /// Stop this wait; it finishes with [`MonitorEvent::Cancelled`].
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the final event.
    pub async fn wait(self) -> MonitorEvent {
        match self.join.await {
            Ok(event) => event,
            Err(e) => MonitorEvent::Errored {
                resource: self.resource,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::Fetched;
    use crate::error::Result;
    use crate::snapshot::ResourceKind;
    use crate::status::RACKSPACE_LOAD_BALANCER;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves a fixed status per id; unknown ids are not found
    struct FixedStatus(Mutex<HashMap<String, &'static str>>);

    #[async_trait]
    impl ResourceAccessor for FixedStatus {
        fn provider(&self) -> &str {
            "rackspace-cloudloadbalancers"
        }

        async fn fetch_resource(&self, id: &ResourceId) -> Result<Fetched<ResourceSnapshot>> {
            let status = self.0.lock().unwrap().get(id.as_str()).copied();
            Ok(status
                .map(|s| ResourceSnapshot::new(id.clone(), ResourceKind::LoadBalancer, s))
                .into())
        }
    }

    fn monitor(entries: &[(&str, &'static str)]) -> Monitor {
        let map = entries.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        Monitor::new(
            Poller::new(&RACKSPACE_LOAD_BALANCER),
            Arc::new(FixedStatus(Mutex::new(map))),
        )
    }

    fn spec() -> AwaitSpec {
        AwaitSpec::active(Duration::from_secs(5)).max_attempts(3)
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_are_broadcast() {
        let monitor = monitor(&[("lb-1", "ACTIVE"), ("lb-2", "ERROR")]);
        let mut rx = monitor.subscribe();

        let first = monitor.watch("lb-1".into(), spec());
        let second = monitor.watch("lb-2".into(), spec());

        assert!(first.wait().await.is_completed());
        assert!(matches!(
            second.wait().await,
            MonitorEvent::Failed {
                state: LifecycleState::Error,
                ..
            }
        ));

        let mut seen = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        seen.sort_by(|a, b| a.resource().as_str().cmp(b.resource().as_str()));
        assert_eq!(seen[0].resource().as_str(), "lb-1");
        assert_eq!(seen[1].resource().as_str(), "lb-2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_event() {
        let monitor = monitor(&[("lb-1", "BUILD")]);
        let event = monitor.watch("lb-1".into(), spec()).wait().await;
        match event {
            MonitorEvent::TimedOut {
                attempts,
                last_state,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_state, Some(LifecycleState::Pending));
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_shutdown() {
        let monitor = monitor(&[("lb-1", "BUILD"), ("lb-2", "BUILD")]);
        let long = AwaitSpec::active(Duration::from_secs(5)).max_attempts(1000);

        let stopped = monitor.watch("lb-1".into(), long.clone());
        stopped.stop();
        assert!(matches!(stopped.wait().await, MonitorEvent::Cancelled { .. }));

        let other = monitor.watch("lb-2".into(), long);
        monitor.shutdown();
        assert!(monitor.is_shut_down());
        assert!(matches!(other.wait().await, MonitorEvent::Cancelled { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_deleted() {
        let monitor = monitor(&[]);
        let event = monitor.watch_deleted("lb-9".into(), spec()).wait().await;
        match event {
            MonitorEvent::Completed { snapshot, .. } => assert!(snapshot.is_none()),
            other => panic!("expected Completed, got {:?}", other),
        }
    }
}
