// Fleet summary: lists, fan-out snapshots over running containers, totals and ranking.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::derive::{percent_of, round2};
use super::stream::snapshot;
use crate::error::{Error, Result};
use crate::gateway::RuntimeGateway;
use crate::models::{ContainerMemoryEntry, ContainerMetricsEntry, DerivedMetrics, FleetSummary};

pub const TOP_CONTAINERS_BY_MEMORY: usize = 10;

/// A running container that returned a usable snapshot.
#[derive(Debug, Clone)]
pub(crate) struct Sampled {
    pub id: String,
    pub name: String,
    pub metrics: DerivedMetrics,
}

pub struct SummaryAggregator<G> {
    gateway: Arc<G>,
}

impl<G> Clone for SummaryAggregator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<G: RuntimeGateway> SummaryAggregator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Builds a fresh summary. Container, image or volume list failures abort with the
    /// collaborator's error; host memory and per-container snapshot failures are absorbed.
    #[instrument(skip(self, cancel), fields(operation = "get_summary"))]
    pub async fn get_summary(&self, cancel: &CancellationToken) -> Result<FleetSummary> {
        let g = self.gateway.as_ref();
        let (containers, images, volumes, mem_total) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            lists = async {
                tokio::join!(
                    g.list_containers(true),
                    g.list_images(),
                    g.list_volumes(),
                    g.host_memory_total(),
                )
            } => lists,
        };
        let containers = containers?;
        let images = images?;
        let volumes = volumes?;
        let mem_total = mem_total.unwrap_or_else(|e| {
            warn!(error = %e, "could not get host mem total, using sum of containers");
            0
        });

        let (running, stopped): (Vec<_>, Vec<_>) =
            containers.into_iter().partition(|c| c.is_running());

        let mut out = FleetSummary {
            containers_total: running.len() + stopped.len(),
            containers_running: running.len(),
            containers_stopped: stopped.len(),
            memory_limit_bytes: mem_total,
            images_count: images.len(),
            volumes_count: volumes.len(),
            ..Default::default()
        };
        if running.is_empty() {
            return Ok(out);
        }

        // Sized to the batch: a worker never blocks, even after the caller stopped listening.
        let (tx, mut rx) = mpsc::channel(running.len());
        for c in running {
            let gateway = self.gateway.clone();
            let tx = tx.clone();
            let name = c.display_name();
            let id = c.id;
            tokio::spawn(async move {
                let result = snapshot(gateway.as_ref(), &id).await;
                let _ = tx.send((id, name, result)).await;
            });
        }
        drop(tx);

        let mut sampled = Vec::new();
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                received = rx.recv() => received,
            };
            // None once every worker has reported (or died).
            let Some((id, name, result)) = received else {
                break;
            };
            match result {
                Ok(Some(metrics)) => sampled.push(Sampled { id, name, metrics }),
                Ok(None) => debug!(container_id = %id, "stats snapshot empty"),
                Err(e) => debug!(container_id = %id, error = %e, "stats snapshot failed"),
            }
        }

        fill_metrics(&mut out, sampled);
        Ok(out)
    }
}

/// Totals, memory-limit fallback, per-container list and top-N ranking.
pub(crate) fn fill_metrics(out: &mut FleetSummary, mut sampled: Vec<Sampled>) {
    out.cpu_percent_total = sampled.iter().map(|s| s.metrics.cpu_percentage).sum();
    out.memory_usage_bytes = sampled.iter().map(|s| s.metrics.memory_usage).sum();
    if out.memory_limit_bytes == 0 {
        out.memory_limit_bytes = out.memory_usage_bytes;
    }

    out.container_metrics = sampled
        .iter()
        .map(|s| ContainerMetricsEntry {
            id: s.id.clone(),
            name: s.name.clone(),
            cpu_percentage: s.metrics.cpu_percentage,
            memory_usage: s.metrics.memory_usage,
            memory_limit: s.metrics.memory_limit,
            memory_percent: s.metrics.memory_percent,
        })
        .collect();

    sampled.sort_by(|a, b| b.metrics.memory_usage.cmp(&a.metrics.memory_usage));
    let limit = out.memory_limit_bytes;
    out.top_containers_by_memory = sampled
        .into_iter()
        .take(TOP_CONTAINERS_BY_MEMORY)
        .map(|s| ContainerMemoryEntry {
            memory_percent: round2(percent_of(s.metrics.memory_usage, limit)),
            memory_usage: s.metrics.memory_usage,
            id: s.id,
            name: s.name,
        })
        .collect();
}
