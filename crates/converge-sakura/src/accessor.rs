//! Resource accessors over usacloud

use crate::error::SakuraError;
use crate::usacloud::{DiskInfo, ServerInfo, Usacloud};
use async_trait::async_trait;
use converge::status::{SAKURA_DISK, SAKURA_SERVER};
use converge::{
    ConvergeError, Fetched, Poller, ResourceAccessor, ResourceId, ResourceKind, ResourceSnapshot,
};

pub const PROVIDER: &str = "sakura-cloud";

/// Map a read result, turning "not found" into `Fetched::NotFound`.
fn fetched<T>(
    result: crate::error::Result<T>,
    to_snapshot: impl FnOnce(T) -> ResourceSnapshot,
) -> converge::Result<Fetched<ResourceSnapshot>> {
    match result {
        Ok(info) => Ok(Fetched::Found(to_snapshot(info))),
        Err(SakuraError::NotFound(detail)) => {
            tracing::debug!("Sakura resource not found: {}", detail);
            Ok(Fetched::NotFound)
        }
        Err(e) => Err(ConvergeError::from(e)),
    }
}

impl From<ServerInfo> for ResourceSnapshot {
    fn from(info: ServerInfo) -> Self {
        let snapshot = ResourceSnapshot::new(info.id.clone(), ResourceKind::Server, info.status())
            .with_attribute("name", serde_json::json!(info.name));
        let snapshot = match info.ip_address() {
            Some(ip) => snapshot.with_attribute("ip_address", serde_json::json!(ip)),
            None => snapshot,
        };
        snapshot
            .with_attribute("availability", serde_json::json!(info.availability))
            .with_attribute("instance_status", serde_json::json!(info.instance_status))
    }
}

impl From<DiskInfo> for ResourceSnapshot {
    fn from(info: DiskInfo) -> Self {
        ResourceSnapshot::new(info.id.clone(), ResourceKind::Disk, info.status())
            .with_attribute("name", serde_json::json!(info.name))
            .with_attribute("size_mb", serde_json::json!(info.size_mb))
    }
}

/// Sakura Cloud servers in one zone
#[derive(Debug, Clone)]
pub struct SakuraServers {
    usacloud: Usacloud,
}

impl SakuraServers {
    pub fn new(usacloud: Usacloud) -> Self {
        Self { usacloud }
    }

    pub fn usacloud(&self) -> &Usacloud {
        &self.usacloud
    }

    /// Poller translating server statuses
    pub fn poller() -> Poller {
        Poller::new(&SAKURA_SERVER)
    }
}

#[async_trait]
impl ResourceAccessor for SakuraServers {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn fetch_resource(
        &self,
        id: &ResourceId,
    ) -> converge::Result<Fetched<ResourceSnapshot>> {
        fetched(
            self.usacloud.read_server(id.as_str()).await,
            ResourceSnapshot::from,
        )
    }
}

/// Sakura Cloud disks in one zone
#[derive(Debug, Clone)]
pub struct SakuraDisks {
    usacloud: Usacloud,
}

impl SakuraDisks {
    pub fn new(usacloud: Usacloud) -> Self {
        Self { usacloud }
    }

    pub fn poller() -> Poller {
        Poller::new(&SAKURA_DISK)
    }
}

#[async_trait]
impl ResourceAccessor for SakuraDisks {
    fn provider(&self) -> &str {
        PROVIDER
    }

    async fn fetch_resource(
        &self,
        id: &ResourceId,
    ) -> converge::Result<Fetched<ResourceSnapshot>> {
        fetched(
            self.usacloud.read_disk(id.as_str()).await,
            ResourceSnapshot::from,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usacloud::InterfaceInfo;
    use converge::LifecycleState;

    fn server(availability: &str, instance: &str) -> ServerInfo {
        ServerInfo {
            id: "113000000001".to_string(),
            name: "web".to_string(),
            availability: Some(availability.to_string()),
            instance_status: Some(instance.to_string()),
            interfaces: Some(vec![InterfaceInfo {
                ip_address: Some("203.0.113.10".to_string()),
            }]),
        }
    }

    #[test]
    fn test_server_snapshot() {
        let snapshot = ResourceSnapshot::from(server("available", "up"));
        assert_eq!(snapshot.id.as_str(), "113000000001");
        assert_eq!(
            snapshot.get_attribute::<String>("ip_address").as_deref(),
            Some("203.0.113.10")
        );
        assert_eq!(
            SAKURA_SERVER.translate(&snapshot.status),
            LifecycleState::Active
        );
    }

    #[test]
    fn test_server_lifecycle_follows_availability_first() {
        let migrating = ResourceSnapshot::from(server("migrating", "down"));
        assert_eq!(SAKURA_SERVER.translate(&migrating.status), LifecycleState::Pending);

        let stopped = ResourceSnapshot::from(server("available", "down"));
        assert_eq!(SAKURA_SERVER.translate(&stopped.status), LifecycleState::Suspended);

        let broken = ResourceSnapshot::from(server("failed", "down"));
        assert_eq!(SAKURA_SERVER.translate(&broken.status), LifecycleState::Error);
    }

    #[test]
    fn test_not_found_maps_to_fetched_not_found() {
        let result = fetched::<ServerInfo>(
            Err(SakuraError::NotFound("server 1".to_string())),
            ResourceSnapshot::from,
        );
        assert!(result.unwrap().is_not_found());
    }

    #[test]
    fn test_command_failure_is_transport_error() {
        let result = fetched::<ServerInfo>(
            Err(SakuraError::CommandFailed("timeout".to_string())),
            ResourceSnapshot::from,
        );
        assert!(matches!(result, Err(ConvergeError::Transport(msg)) if msg.contains("timeout")));
    }

    #[cfg(unix)]
    mod through_cli {
        use super::*;
        use crate::test_support::script;
        use converge::{AwaitSpec, ConvergenceOutcome};
        use std::time::Duration;

        #[tokio::test]
        async fn test_outage_mentioning_404_id_is_not_a_delete() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(
                &dir,
                r#"echo x >> "$(dirname "$0")/calls"
echo 'Error: 503 Service Unavailable: server 113000404001 is under maintenance' >&2
exit 1"#,
            );
            let servers = SakuraServers::new(Usacloud::new("is1a").with_binary(binary));
            let spec = AwaitSpec::deleted(Duration::from_millis(10)).max_attempts(3);
            let id = ResourceId::from("113000404001");

            let result = SakuraServers::poller()
                .wait_for_deleted(
                    || servers.fetch_resource(&id),
                    &spec,
                )
                .await;

            assert!(matches!(result, Err(ConvergeError::Transport(msg)) if msg.contains("503")));
            let calls = std::fs::read_to_string(dir.path().join("calls")).unwrap();
            assert_eq!(calls.lines().count(), 1);
        }

        #[tokio::test]
        async fn test_deleted_server_converges() {
            let dir = tempfile::tempdir().unwrap();
            let binary = script(
                &dir,
                "echo 'Error: 404 Not Found: server 113000404001' >&2\nexit 1",
            );
            let servers = SakuraServers::new(Usacloud::new("is1a").with_binary(binary));
            let spec = AwaitSpec::deleted(Duration::from_millis(10)).max_attempts(3);
            let id = ResourceId::from("113000404001");

            let outcome = tokio_test::assert_ok!(
                SakuraServers::poller()
                    .wait_for_deleted(
                        || servers.fetch_resource(&id),
                        &spec,
                    )
                    .await
            );
            assert!(matches!(outcome, ConvergenceOutcome::Converged(None)));
        }
    }
}
