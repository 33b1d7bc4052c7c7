// Shared test helpers: scripted in-memory gateway and sinks
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use dockscope::control::ContainerAction;
use dockscope::error::{Error, Result};
use dockscope::gateway::{Feed, RuntimeGateway};
use dockscope::models::*;
use dockscope::stats::Sink;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub fn not_found() -> Error {
    Error::NotFound("abc".into())
}

pub fn conflict() -> Error {
    Error::Conflict("container already started".into())
}

pub fn container(id: &str, name: &str, state: &str) -> ContainerRecord {
    ContainerRecord {
        id: id.into(),
        names: if name.is_empty() {
            vec![]
        } else {
            vec![format!("/{name}")]
        },
        state: state.into(),
        ..Default::default()
    }
}

/// Raw sample deriving to `cpu_delta / system_delta * 100` percent CPU (one online CPU unknown).
pub fn raw_sample(
    cpu_delta: u64,
    system_delta: u64,
    memory_usage: u64,
    memory_limit: u64,
) -> RawUsageSample {
    RawUsageSample {
        container_cpu_total: 1_000 + cpu_delta,
        container_cpu_prev: 1_000,
        system_cpu_total: 10_000 + system_delta,
        system_cpu_prev: 10_000,
        online_cpus: None,
        memory_usage,
        memory_limit,
        read: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[derive(Clone)]
pub enum Snapshot {
    Sample(RawUsageSample),
    Empty,
    Fail(fn() -> Error),
}

pub enum Step<T> {
    Item(T),
    Fail(fn() -> Error),
    /// Never resolves; the stream only ends by cancellation.
    Stall,
}

pub struct MockFeed<T> {
    steps: VecDeque<Step<T>>,
    released: Arc<AtomicBool>,
}

impl<T: Send> Feed<T> for MockFeed<T> {
    async fn next(&mut self) -> Result<Option<T>> {
        match self.steps.pop_front() {
            Some(Step::Item(item)) => Ok(Some(item)),
            Some(Step::Fail(err)) => Err(err()),
            Some(Step::Stall) => std::future::pending().await,
            None => Ok(None),
        }
    }
}

impl<T> Drop for MockFeed<T> {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub containers: Vec<ContainerRecord>,
    pub images: Vec<ImageRecord>,
    pub volumes: Vec<VolumeRecord>,
    pub host_memory: u64,
    pub fail_containers: Option<fn() -> Error>,
    pub fail_images: Option<fn() -> Error>,
    pub fail_volumes: Option<fn() -> Error>,
    pub fail_host_memory: Option<fn() -> Error>,
    /// Replies per container id; ids without an entry fail with NotFound.
    pub snapshots: HashMap<String, Snapshot>,
    pub snapshot_delay: Option<Duration>,
    pub snapshot_calls: AtomicUsize,
    pub snapshots_finished: AtomicUsize,
    pub fail_open: Option<fn() -> Error>,
    pub usage_steps: Mutex<Option<Vec<Step<RawUsageSample>>>>,
    pub log_steps: Mutex<Option<Vec<Step<String>>>>,
    pub feed_released: Arc<AtomicBool>,
    pub fail_action: Option<fn() -> Error>,
    pub actions: Mutex<Vec<(String, ContainerAction)>>,
}

impl MockGateway {
    pub fn with_usage_steps(steps: Vec<Step<RawUsageSample>>) -> Self {
        Self {
            usage_steps: Mutex::new(Some(steps)),
            ..Default::default()
        }
    }

    pub fn with_log_steps(steps: Vec<Step<String>>) -> Self {
        Self {
            log_steps: Mutex::new(Some(steps)),
            ..Default::default()
        }
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn feed_released(&self) -> bool {
        self.feed_released.load(Ordering::SeqCst)
    }

    fn feed<T>(&self, steps: &Mutex<Option<Vec<Step<T>>>>) -> Result<MockFeed<T>> {
        if let Some(err) = self.fail_open {
            return Err(err());
        }
        let steps = steps.lock().unwrap().take().unwrap_or_default();
        Ok(MockFeed {
            steps: steps.into(),
            released: self.feed_released.clone(),
        })
    }
}

fn reply<T>(value: &T, fail: Option<fn() -> Error>) -> Result<T>
where
    T: Clone,
{
    match fail {
        Some(err) => Err(err()),
        None => Ok(value.clone()),
    }
}

impl RuntimeGateway for MockGateway {
    type UsageFeed = MockFeed<RawUsageSample>;
    type LogFeed = MockFeed<String>;

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerRecord>> {
        let list = reply(&self.containers, self.fail_containers)?;
        Ok(list.into_iter().filter(|c| all || c.is_running()).collect())
    }

    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        reply(&self.images, self.fail_images)
    }

    async fn list_volumes(&self) -> Result<Vec<VolumeRecord>> {
        reply(&self.volumes, self.fail_volumes)
    }

    async fn host_memory_total(&self) -> Result<u64> {
        reply(&self.host_memory, self.fail_host_memory)
    }

    async fn open_usage_feed(&self, _container_id: &str) -> Result<Self::UsageFeed> {
        self.feed(&self.usage_steps)
    }

    async fn one_shot_usage_sample(&self, container_id: &str) -> Result<Option<RawUsageSample>> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.snapshot_delay {
            tokio::time::sleep(delay).await;
        }
        let out = match self.snapshots.get(container_id) {
            Some(Snapshot::Sample(raw)) => Ok(Some(raw.clone())),
            Some(Snapshot::Empty) => Ok(None),
            Some(Snapshot::Fail(err)) => Err(err()),
            None => Err(not_found()),
        };
        self.snapshots_finished.fetch_add(1, Ordering::SeqCst);
        out
    }

    async fn open_log_feed(&self, _container_id: &str) -> Result<Self::LogFeed> {
        self.feed(&self.log_steps)
    }

    async fn execute_action(&self, container_id: &str, action: ContainerAction) -> Result<()> {
        if let Some(err) = self.fail_action {
            return Err(err());
        }
        self.actions
            .lock()
            .unwrap()
            .push((container_id.to_string(), action));
        Ok(())
    }
}

/// Collects delivered items; optionally fails the delivery with index `fail_at`,
/// never completes the delivery with index `stall_at`, or cancels `cancel` once
/// `cancel_after` items were delivered.
pub struct VecSink<T> {
    pub items: Vec<T>,
    pub fail_at: Option<usize>,
    pub stall_at: Option<usize>,
    pub cancel_after: Option<(usize, CancellationToken)>,
}

impl<T> Default for VecSink<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            fail_at: None,
            stall_at: None,
            cancel_after: None,
        }
    }
}

impl<T: Send> Sink<T> for VecSink<T> {
    async fn deliver(&mut self, item: T) -> Result<()> {
        if self.fail_at == Some(self.items.len()) {
            return Err(Error::Sink("peer closed".into()));
        }
        if self.stall_at == Some(self.items.len()) {
            return std::future::pending().await;
        }
        self.items.push(item);
        if let Some((n, cancel)) = &self.cancel_after
            && self.items.len() >= *n
        {
            cancel.cancel();
        }
        Ok(())
    }
}
