// Resource usage: raw runtime counters and displayable metrics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One resource-usage reading as reported by the runtime. CPU counters are cumulative
/// nanoseconds, sampled at the current and the previous read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawUsageSample {
    pub container_cpu_total: u64,
    pub container_cpu_prev: u64,
    pub system_cpu_total: u64,
    pub system_cpu_prev: u64,
    /// None when the runtime does not report it.
    pub online_cpus: Option<u32>,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub read: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub cpu_percentage: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory_percent: f64,
    pub timestamp: DateTime<Utc>,
}

pub(crate) fn is_zero(v: &f64) -> bool {
    *v == 0.0
}
