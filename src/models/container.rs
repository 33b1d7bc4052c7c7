// Container listing records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State string the runtime reports for a running container.
pub const RUNNING_STATE: &str = "running";

/// Length of the short container id shown when a container has no name.
const SHORT_ID_LEN: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerRecord {
    #[serde(rename = "ID")]
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    #[serde(rename = "ImageID")]
    pub image_id: String,
    pub status: String,
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    pub labels: HashMap<String, String>,
    pub ports: Vec<PortBinding>,
    pub mounts: Vec<Mount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_config: Option<HostConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortBinding {
    pub private_port: u16,
    pub public_port: u16,
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "IP")]
    pub ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mount {
    #[serde(rename = "Type")]
    pub kind: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    pub network_mode: String,
}

impl ContainerRecord {
    /// True only for the exact runtime "running" state; paused, restarting etc. count as stopped.
    pub fn is_running(&self) -> bool {
        self.state == RUNNING_STATE
    }

    /// First declared name without its leading '/', else the 12-char id prefix.
    pub fn display_name(&self) -> String {
        match self.names.first() {
            Some(name) if !name.is_empty() => name.strip_prefix('/').unwrap_or(name).to_string(),
            _ => short_id(&self.id).to_string(),
        }
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}
