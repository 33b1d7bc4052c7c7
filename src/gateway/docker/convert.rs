// Map bollard API responses into domain records.

use bollard::models::{ContainerStatsResponse, ContainerSummary, ImageSummary, Volume};
use chrono::{DateTime, Utc};

use crate::models::{
    ContainerRecord, HostConfig, ImageRecord, Mount, PortBinding, RawUsageSample, VolumeRecord,
};

/// Raw stats frame into a usage sample. Missing counters read as zero, so the
/// deriver sees a non-positive system delta and reports 0% CPU.
pub(crate) fn usage_sample(s: &ContainerStatsResponse) -> RawUsageSample {
    let cpu = s.cpu_stats.as_ref();
    let precpu = s.precpu_stats.as_ref();
    let total_usage = |stats: Option<&bollard::models::ContainerCpuStats>| {
        stats
            .and_then(|c| c.cpu_usage.as_ref())
            .and_then(|u| u.total_usage)
            .unwrap_or(0)
    };

    RawUsageSample {
        container_cpu_total: total_usage(cpu),
        container_cpu_prev: total_usage(precpu),
        system_cpu_total: cpu.and_then(|c| c.system_cpu_usage).unwrap_or(0),
        system_cpu_prev: precpu.and_then(|c| c.system_cpu_usage).unwrap_or(0),
        online_cpus: cpu.and_then(|c| c.online_cpus).filter(|n| *n > 0),
        memory_usage: s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0),
        memory_limit: s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0),
        read: s.read.unwrap_or_default(),
    }
}

fn from_unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}

pub(crate) fn container_record(c: ContainerSummary) -> ContainerRecord {
    let ports = c
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| PortBinding {
            private_port: p.private_port,
            public_port: p.public_port.unwrap_or(0),
            kind: p.typ.map(|t| t.to_string()).unwrap_or_default(),
            ip: p.ip.unwrap_or_default(),
        })
        .collect();
    let mounts = c
        .mounts
        .unwrap_or_default()
        .into_iter()
        .map(|m| Mount {
            kind: m.typ.map(|t| t.to_string()).unwrap_or_default(),
            source: m.source.unwrap_or_default(),
            target: m.destination.unwrap_or_default(),
        })
        .collect();
    let host_config = c
        .host_config
        .and_then(|h| h.network_mode)
        .filter(|mode| !mode.is_empty())
        .map(|network_mode| HostConfig { network_mode });

    ContainerRecord {
        id: c.id.unwrap_or_default(),
        names: c.names.unwrap_or_default(),
        image: c.image.unwrap_or_default(),
        image_id: c.image_id.unwrap_or_default(),
        status: c.status.unwrap_or_default(),
        state: c.state.map(|s| s.to_string()).unwrap_or_default(),
        created_at: c.created.and_then(from_unix_seconds),
        labels: c.labels.unwrap_or_default(),
        ports,
        mounts,
        host_config,
    }
}

pub(crate) fn image_record(img: ImageSummary) -> ImageRecord {
    ImageRecord {
        id: img.id,
        repo_tags: img.repo_tags,
        repo_digests: img.repo_digests,
        created_at: from_unix_seconds(img.created),
        size: img.size,
        shared_size: img.shared_size,
        labels: img.labels,
        parent_id: img.parent_id,
    }
}

pub(crate) fn volume_record(v: Volume) -> VolumeRecord {
    VolumeRecord {
        name: v.name,
        driver: v.driver,
        mountpoint: v.mountpoint,
        labels: v.labels,
        scope: v.scope.map(|s| s.to_string()).unwrap_or_default(),
        created_at: v.created_at.map(|t| t.to_string()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats};

    fn cpu_stats(total_usage: u64, system_cpu_usage: u64, online: u32) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(online),
            throttling_data: None,
        }
    }

    #[test]
    fn usage_sample_reads_both_cpu_readings_and_memory() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_stats(100_000_000, 1_000_000_000, 2)),
            precpu_stats: Some(cpu_stats(50_000_000, 500_000_000, 2)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                ..Default::default()
            }),
            ..Default::default()
        };
        let raw = usage_sample(&s);
        assert_eq!(raw.container_cpu_total, 100_000_000);
        assert_eq!(raw.container_cpu_prev, 50_000_000);
        assert_eq!(raw.system_cpu_total, 1_000_000_000);
        assert_eq!(raw.system_cpu_prev, 500_000_000);
        assert_eq!(raw.online_cpus, Some(2));
        assert_eq!(raw.memory_usage, 256 * 1024 * 1024);
        assert_eq!(raw.memory_limit, 512 * 1024 * 1024);
    }

    #[test]
    fn usage_sample_defaults_missing_sections_to_zero() {
        let raw = usage_sample(&ContainerStatsResponse::default());
        assert_eq!(raw.system_cpu_total, 0);
        assert_eq!(raw.system_cpu_prev, 0);
        assert_eq!(raw.online_cpus, None);
        assert_eq!(raw.memory_limit, 0);
    }

    #[test]
    fn usage_sample_treats_zero_online_cpus_as_unknown() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_stats(10, 10, 0)),
            ..Default::default()
        };
        assert_eq!(usage_sample(&s).online_cpus, None);
    }

    #[test]
    fn container_record_maps_summary_fields() {
        let c = ContainerSummary {
            id: Some("abc123".into()),
            names: Some(vec!["/web".into()]),
            image: Some("nginx:latest".into()),
            status: Some("Up 2 minutes".into()),
            created: Some(1_700_000_000),
            ..Default::default()
        };
        let r = container_record(c);
        assert_eq!(r.id, "abc123");
        assert_eq!(r.display_name(), "web");
        assert_eq!(r.image, "nginx:latest");
        assert_eq!(r.created_at.map(|t| t.timestamp()), Some(1_700_000_000));
        assert!(r.host_config.is_none());
        assert!(r.ports.is_empty());
    }
}
