// Host-level summary returned by GET /api/system/summary

use serde::{Deserialize, Serialize};

use super::metrics::is_zero;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMemoryEntry {
    pub id: String,
    pub name: String,
    pub memory_usage: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetricsEntry {
    pub id: String,
    pub name: String,
    pub cpu_percentage: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSummary {
    pub containers_total: usize,
    pub containers_running: usize,
    pub containers_stopped: usize,
    pub cpu_percent_total: f64,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
    pub images_count: usize,
    pub volumes_count: usize,
    /// Ranked by memory usage, highest first.
    pub top_containers_by_memory: Vec<ContainerMemoryEntry>,
    /// One entry per successfully sampled running container, in no particular order.
    pub container_metrics: Vec<ContainerMetricsEntry>,
}
