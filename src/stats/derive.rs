// Raw usage counters into displayable percentages. Pure; never fails.

use crate::models::{DerivedMetrics, RawUsageSample};

pub fn derive(raw: &RawUsageSample) -> DerivedMetrics {
    DerivedMetrics {
        cpu_percentage: round2(cpu_percent(raw)),
        memory_usage: raw.memory_usage,
        memory_limit: raw.memory_limit,
        memory_percent: round2(percent_of(raw.memory_usage, raw.memory_limit)),
        timestamp: raw.read,
    }
}

/// Share of host CPU time used since the previous reading, divided across online CPUs
/// when known. Zero when the host counter did not advance (first read, counter reset).
fn cpu_percent(raw: &RawUsageSample) -> f64 {
    if raw.system_cpu_total <= raw.system_cpu_prev {
        return 0.0;
    }
    let system_delta = (raw.system_cpu_total - raw.system_cpu_prev) as f64;
    let cpu_delta = raw.container_cpu_total.saturating_sub(raw.container_cpu_prev) as f64;
    let mut percent = cpu_delta / system_delta * 100.0;
    if let Some(n) = raw.online_cpus.filter(|n| *n > 0) {
        percent /= n as f64;
    }
    percent
}

/// `part / whole * 100`, or 0 when `whole` is 0. Not clamped.
pub(crate) fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Round half up to 2 decimals (1.005 -> 1.01, 2.345 -> 2.35).
///
/// The scaled value is first snapped to 9 decimals so binary representation error
/// (1.005 * 100 == 100.49999999999999) does not push a half down, while values
/// genuinely below the half (1.0049999996) still round down.
pub fn round2(v: f64) -> f64 {
    let scaled = (v * 100.0 * 1e9).round() / 1e9;
    (scaled + 0.5).floor() / 100.0
}
