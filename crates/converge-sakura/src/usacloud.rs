//! usacloud CLI wrapper
//!
//! Reads and mutates Sakura Cloud servers and disks through the usacloud CLI.

use crate::error::{Result, SakuraError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;

const DEFAULT_BINARY: &str = "usacloud";

/// usacloud CLI wrapper bound to one zone
#[derive(Debug, Clone)]
pub struct Usacloud {
    zone: String,
    binary: String,
}

impl Usacloud {
    pub fn new(zone: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            binary: DEFAULT_BINARY.to_string(),
        }
    }

    /// Use a different executable (a wrapper script, a pinned version)
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    /// Check if usacloud is installed and authenticated
    pub async fn check_auth(&self) -> Result<UsacloudAuth> {
        let output = self
            .run_command(&["auth-status", "--output-type", "json"])
            .await
            .map_err(|e| match e {
                SakuraError::CommandFailed(msg) => SakuraError::AuthenticationFailed(msg),
                other => other,
            })?;

        let auth: UsacloudAuth = serde_json::from_str(&output)?;
        Ok(auth)
    }

    /// Run a usacloud command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--zone").arg(&self.zone);
        cmd.args(args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} --zone {} {}", self.binary, self.zone, args.join(" "));

        let output = cmd.output().await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SakuraError::UsacloudNotFound,
            _ => SakuraError::IoError(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if is_not_found(&stderr) {
                return Err(SakuraError::NotFound(stderr));
            }
            return Err(SakuraError::CommandFailed(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Read one server
    pub async fn read_server(&self, id: &str) -> Result<ServerInfo> {
        let output = self
            .run_command(&["server", "read", id, "--output-type", "json"])
            .await?;
        parse_single(&output, id)
    }

    /// Read one disk
    pub async fn read_disk(&self, id: &str) -> Result<DiskInfo> {
        let output = self
            .run_command(&["disk", "read", id, "--output-type", "json"])
            .await?;
        parse_single(&output, id)
    }

    /// Power on a server
    pub async fn power_on(&self, id: &str) -> Result<()> {
        self.run_command(&["server", "power-on", id, "--yes"]).await?;
        Ok(())
    }

    /// Shut a server down; `force` pulls the plug instead of ACPI shutdown
    pub async fn shutdown(&self, id: &str, force: bool) -> Result<()> {
        let mut args = vec!["server", "shutdown", id, "--yes"];
        if force {
            args.push("--force");
        }
        self.run_command(&args).await?;
        Ok(())
    }

    /// Delete a server
    pub async fn delete_server(&self, id: &str, with_disks: bool) -> Result<()> {
        let mut args = vec!["server", "delete", id, "--yes"];
        if with_disks {
            args.push("--with-disks");
        }
        self.run_command(&args).await?;
        Ok(())
    }

    /// Delete a disk
    pub async fn delete_disk(&self, id: &str) -> Result<()> {
        self.run_command(&["disk", "delete", id, "--yes"]).await?;
        Ok(())
    }
}

/// usacloud reports a missing resource as an HTTP 404 or a "not found"
/// message. Both must stand alone: resource IDs are long digit runs that
/// can contain `404` anywhere.
fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    contains_word(&lower, "not found") || contains_word(&lower, "404")
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(|c| c.is_ascii_alphanumeric())
            && !after.is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// `read` prints either one object or a one-element array depending on the
/// usacloud version.
fn parse_single<T: DeserializeOwned>(output: &str, id: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(output.trim())?;
    match value {
        serde_json::Value::Array(mut items) => match items.len() {
            0 => Err(SakuraError::NotFound(id.to_string())),
            1 => Ok(serde_json::from_value(items.remove(0))?),
            n => Err(SakuraError::UnexpectedOutput(format!(
                "{} results for {}",
                n, id
            ))),
        },
        object => Ok(serde_json::from_value(object)?),
    }
}

/// Newer usacloud releases print IDs as JSON numbers
fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid ID: {}", other))),
    }
}

/// Authentication status from usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsacloudAuth {
    #[serde(rename = "Account")]
    pub account: Option<AccountInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Server information from usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(rename = "ID", deserialize_with = "id_from_string_or_number")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    /// Provisioning state of the server record (`available`, `migrating`, ...)
    #[serde(rename = "Availability")]
    pub availability: Option<String>,

    /// Power state (`up`, `down`, `cleaning`)
    #[serde(rename = "InstanceStatus")]
    pub instance_status: Option<String>,

    #[serde(rename = "Interfaces")]
    pub interfaces: Option<Vec<InterfaceInfo>>,
}

impl ServerInfo {
    /// Get the first IP address
    pub fn ip_address(&self) -> Option<String> {
        self.interfaces
            .as_ref()?
            .iter()
            .find_map(|i| i.ip_address.clone())
    }

    /// Status to translate: the availability while the record itself is not
    /// ready, otherwise the power state.
    pub fn status(&self) -> &str {
        match (self.availability.as_deref(), self.instance_status.as_deref()) {
            (Some(availability), _) if availability != "available" => availability,
            (_, Some(instance)) => instance,
            (Some(availability), None) => availability,
            (None, None) => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceInfo {
    #[serde(rename = "IPAddress")]
    pub ip_address: Option<String>,
}

/// Disk information from usacloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInfo {
    #[serde(rename = "ID", deserialize_with = "id_from_string_or_number")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Availability")]
    pub availability: Option<String>,

    #[serde(rename = "SizeMB")]
    pub size_mb: Option<i64>,
}

impl DiskInfo {
    pub fn status(&self) -> &str {
        self.availability.as_deref().unwrap_or("unknown")
    }
}
