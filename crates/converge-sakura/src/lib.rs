//! Sakura Cloud accessors for converge
//!
//! Implements `ResourceAccessor` for Sakura Cloud servers and disks on top
//! of the usacloud CLI, plus the mutating calls (power on, shutdown, delete)
//! whose effect callers then wait for.
//!
//! # Requirements
//!
//! - `usacloud` CLI must be installed and configured
//! - Authentication is managed through usacloud configuration
//!
//! # Example
//!
//! ```ignore
//! use converge::{AwaitSpec, ResourceId};
//! use converge_sakura::{SakuraServers, Usacloud};
//! use std::time::Duration;
//!
//! let usacloud = Usacloud::new("tk1a");
//! let servers = SakuraServers::new(usacloud.clone());
//! let id = ResourceId::from("113000000001");
//!
//! usacloud.power_on(id.as_str()).await?;
//! let spec = AwaitSpec::active(Duration::from_secs(5)).timeout(Duration::from_secs(300));
//! let outcome = SakuraServers::poller().wait_for_resource(&servers, &id, &spec).await?;
//! ```

pub mod accessor;
pub mod error;
pub mod usacloud;

#[cfg(all(test, unix))]
mod test_support;

pub use accessor::{PROVIDER, SakuraDisks, SakuraServers};
pub use error::{Result, SakuraError};
pub use usacloud::{DiskInfo, ServerInfo, Usacloud, UsacloudAuth};
