//! Status translation tables
//!
//! Each provider's native status vocabulary is described as data: a
//! [`StatusTable`] lists native values and the [`LifecycleState`] they fold
//! onto. Adding a provider means adding a table, never a new branch in the
//! poller. Lookups are total: anything a table does not list translates to
//! [`LifecycleState::Unrecognized`].

use crate::lifecycle::LifecycleState;
use crate::snapshot::{NativeStatus, ResourceKind};
use std::collections::HashMap;
use std::sync::LazyLock;

use LifecycleState::{Active, Deleted, Error, Pending, Suspended, Unrecognized};

/// How a native value is rewritten before it is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalize {
    /// Compare as-is
    Exact,
    /// ASCII uppercase
    Uppercase,
    /// `Running` / `pre-running` / `preRunning` become `RUNNING` / `PRE_RUNNING`
    UpperSnake,
    /// Drop a trailing `(detail)` such as Nova's `BUILD(spawning)`, then uppercase
    StripDetail,
}

impl Normalize {
    pub fn apply(&self, raw: &str) -> String {
        match self {
            Normalize::Exact => raw.to_string(),
            Normalize::Uppercase => raw.trim().to_ascii_uppercase(),
            Normalize::UpperSnake => to_upper_snake(raw.trim()),
            Normalize::StripDetail => {
                let head = raw.split('(').next().unwrap_or(raw);
                head.trim().to_ascii_uppercase()
            }
        }
    }
}

fn to_upper_snake(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for c in raw.chars() {
        if c == '-' || c == ' ' || c == '_' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_uppercase());
    }
    out
}

/// Translation table for one (provider, resource kind) pair
#[derive(Debug)]
pub struct StatusTable {
    provider: &'static str,
    kind: ResourceKind,
    normalize: Normalize,
    entries: &'static [(&'static str, LifecycleState)],
}

impl StatusTable {
    pub const fn new(
        provider: &'static str,
        kind: ResourceKind,
        normalize: Normalize,
        entries: &'static [(&'static str, LifecycleState)],
    ) -> Self {
        Self {
            provider,
            kind,
            normalize,
            entries,
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn entries(&self) -> &'static [(&'static str, LifecycleState)] {
        self.entries
    }

    /// Translate a native status. Never fails.
    pub fn translate(&self, native: &NativeStatus) -> LifecycleState {
        let key = match native {
            NativeStatus::Code(_) => native.as_key().into_owned(),
            NativeStatus::Text(text) => self.normalize.apply(text),
        };
        self.entries
            .iter()
            .find(|(value, _)| *value == key)
            .map(|(_, state)| *state)
            .unwrap_or(Unrecognized)
    }
}

/// Something that turns native statuses into lifecycle states
pub trait Translate: Send + Sync {
    fn translate(&self, native: &NativeStatus) -> LifecycleState;
}

impl Translate for StatusTable {
    fn translate(&self, native: &NativeStatus) -> LifecycleState {
        StatusTable::translate(self, native)
    }
}

impl<T: Translate + ?Sized> Translate for &T {
    fn translate(&self, native: &NativeStatus) -> LifecycleState {
        (**self).translate(native)
    }
}

// OpenStack Nova servers
pub static NOVA_SERVER: StatusTable = StatusTable::new(
    "openstack-nova",
    ResourceKind::Server,
    Normalize::StripDetail,
    &[
        ("ACTIVE", Active),
        ("BUILD", Pending),
        ("REBUILD", Pending),
        ("RESIZE", Pending),
        ("VERIFY_RESIZE", Pending),
        ("REVERT_RESIZE", Pending),
        ("PASSWORD", Pending),
        ("REBOOT", Pending),
        ("HARD_REBOOT", Pending),
        ("SUSPENDED", Suspended),
        ("PAUSED", Suspended),
        ("DELETED", Deleted),
        ("ERROR", Error),
        ("UNKNOWN", Unrecognized),
    ],
);

pub static CLOUDSTACK_SERVER: StatusTable = StatusTable::new(
    "cloudstack",
    ResourceKind::Server,
    Normalize::UpperSnake,
    &[
        ("STARTING", Pending),
        ("RUNNING", Active),
        ("STOPPING", Pending),
        ("STOPPED", Suspended),
        ("DESTROYED", Deleted),
        ("EXPUNGING", Deleted),
        ("MIGRATING", Pending),
        ("ERROR", Error),
        ("UNKNOWN", Unrecognized),
        ("SHUTDOWNED", Pending),
    ],
);

pub static CLOUDSTACK_VOLUME: StatusTable = StatusTable::new(
    "cloudstack",
    ResourceKind::Volume,
    Normalize::UpperSnake,
    &[
        ("ALLOCATED", Pending),
        ("CREATING", Pending),
        ("READY", Active),
        ("DESTROYED", Deleted),
        ("FAILED", Error),
    ],
);

// CloudStack async job status codes
pub static CLOUDSTACK_TASK: StatusTable = StatusTable::new(
    "cloudstack",
    ResourceKind::Task,
    Normalize::Exact,
    &[("0", Pending), ("1", Active), ("2", Error)],
);

pub static RACKSPACE_LOAD_BALANCER: StatusTable = StatusTable::new(
    "rackspace-cloudloadbalancers",
    ResourceKind::LoadBalancer,
    Normalize::Uppercase,
    &[
        ("BUILD", Pending),
        ("ACTIVE", Active),
        ("PENDING_UPDATE", Pending),
        ("SUSPENDED", Suspended),
        ("PENDING_DELETE", Pending),
        ("DELETED", Deleted),
        ("ERROR", Error),
    ],
);

pub static SOFTLAYER_SERVER: StatusTable = StatusTable::new(
    "softlayer",
    ResourceKind::Server,
    Normalize::UpperSnake,
    &[
        ("RUNNING", Active),
        ("HALTED", Suspended),
        ("PAUSED", Suspended),
    ],
);

// GCE reports a stopped instance as TERMINATED; it can be started again.
pub static GOOGLE_COMPUTE_SERVER: StatusTable = StatusTable::new(
    "google-compute",
    ResourceKind::Server,
    Normalize::Uppercase,
    &[
        ("PROVISIONING", Pending),
        ("STAGING", Pending),
        ("RUNNING", Active),
        ("STOPPING", Pending),
        ("STOPPED", Suspended),
        ("TERMINATED", Suspended),
    ],
);

pub static GOOGLE_COMPUTE_TASK: StatusTable = StatusTable::new(
    "google-compute",
    ResourceKind::Task,
    Normalize::Uppercase,
    &[("PENDING", Pending), ("RUNNING", Pending), ("DONE", Active)],
);

// vCloud Director entity status codes
pub static VCLOUD_DIRECTOR_VAPP: StatusTable = StatusTable::new(
    "vcloud-director",
    ResourceKind::VApp,
    Normalize::Exact,
    &[
        ("-1", Error),
        ("0", Pending),
        ("1", Pending),
        ("2", Pending),
        ("3", Suspended),
        ("4", Active),
        ("5", Pending),
        ("6", Unrecognized),
        ("8", Suspended),
        ("9", Pending),
        ("10", Pending),
    ],
);

pub static VCLOUD_DIRECTOR_TASK: StatusTable = StatusTable::new(
    "vcloud-director",
    ResourceKind::Task,
    Normalize::UpperSnake,
    &[
        ("QUEUED", Pending),
        ("PRE_RUNNING", Pending),
        ("RUNNING", Pending),
        ("SUCCESS", Active),
        ("ERROR", Error),
        ("CANCELED", Error),
        ("ABORTED", Error),
    ],
);

pub static SAKURA_SERVER: StatusTable = StatusTable::new(
    "sakura-cloud",
    ResourceKind::Server,
    Normalize::Exact,
    &[
        ("up", Active),
        ("down", Suspended),
        ("cleaning", Pending),
        ("migrating", Pending),
        ("failed", Error),
    ],
);

pub static SAKURA_DISK: StatusTable = StatusTable::new(
    "sakura-cloud",
    ResourceKind::Disk,
    Normalize::Exact,
    &[
        ("available", Active),
        ("uploading", Pending),
        ("migrating", Pending),
        ("transferring", Pending),
        ("failed", Error),
        ("discontinued", Deleted),
    ],
);

static BUILTIN: LazyLock<StatusRegistry> = LazyLock::new(|| {
    StatusRegistry::new()
        .with_table(&NOVA_SERVER)
        .with_table(&CLOUDSTACK_SERVER)
        .with_table(&CLOUDSTACK_VOLUME)
        .with_table(&CLOUDSTACK_TASK)
        .with_table(&RACKSPACE_LOAD_BALANCER)
        .with_table(&SOFTLAYER_SERVER)
        .with_table(&GOOGLE_COMPUTE_SERVER)
        .with_table(&GOOGLE_COMPUTE_TASK)
        .with_table(&VCLOUD_DIRECTOR_VAPP)
        .with_table(&VCLOUD_DIRECTOR_TASK)
        .with_table(&SAKURA_SERVER)
        .with_table(&SAKURA_DISK)
});

/// Index of status tables by provider and resource kind
#[derive(Debug, Default, Clone)]
pub struct StatusRegistry {
    tables: HashMap<&'static str, HashMap<ResourceKind, &'static StatusTable>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every table shipped with this crate
    pub fn builtin() -> &'static StatusRegistry {
        &BUILTIN
    }

    /// Register a table, replacing any table for the same pair
    pub fn with_table(mut self, table: &'static StatusTable) -> Self {
        self.tables
            .entry(table.provider)
            .or_default()
            .insert(table.kind, table);
        self
    }

    pub fn table(&self, provider: &str, kind: ResourceKind) -> Option<&'static StatusTable> {
        self.tables.get(provider)?.get(&kind).copied()
    }

    /// Translate a native status; unknown pairs and values yield `Unrecognized`.
    pub fn translate(
        &self,
        provider: &str,
        kind: ResourceKind,
        native: &NativeStatus,
    ) -> LifecycleState {
        match self.table(provider, kind) {
            Some(table) => table.translate(native),
            None => {
                tracing::debug!("No status table for {}/{}", provider, kind);
                Unrecognized
            }
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &'static StatusTable> + '_ {
        self.tables.values().flat_map(|kinds| kinds.values().copied())
    }

    pub fn providers(&self) -> Vec<&'static str> {
        let mut providers: Vec<_> = self.tables.keys().copied().collect();
        providers.sort_unstable();
        providers
    }
}

/// Translate using the built-in tables
pub fn translate(provider: &str, kind: ResourceKind, native: &NativeStatus) -> LifecycleState {
    StatusRegistry::builtin().translate(provider, kind, native)
}
