// Container runtime gateway: the only component that talks to the runtime.

pub mod docker;

use std::future::Future;

use crate::control::ContainerAction;
use crate::error::Result;
use crate::models::{ContainerRecord, ImageRecord, RawUsageSample, VolumeRecord};

pub use docker::DockerGateway;

/// A long-lived sequence of items pushed by the runtime over one open connection.
/// `Ok(None)` marks a clean end of stream. Dropping the feed releases the connection.
pub trait Feed<T>: Send {
    fn next(&mut self) -> impl Future<Output = Result<Option<T>>> + Send;
}

/// Raw runtime calls. One handle is shared by every fan-out worker and stream session,
/// so implementations must be safe for concurrent use.
pub trait RuntimeGateway: Send + Sync + 'static {
    type UsageFeed: Feed<RawUsageSample> + 'static;
    type LogFeed: Feed<String> + 'static;

    fn list_containers(
        &self,
        all: bool,
    ) -> impl Future<Output = Result<Vec<ContainerRecord>>> + Send;

    fn list_images(&self) -> impl Future<Output = Result<Vec<ImageRecord>>> + Send;

    fn list_volumes(&self) -> impl Future<Output = Result<Vec<VolumeRecord>>> + Send;

    fn host_memory_total(&self) -> impl Future<Output = Result<u64>> + Send;

    fn open_usage_feed(
        &self,
        container_id: &str,
    ) -> impl Future<Output = Result<Self::UsageFeed>> + Send;

    /// Single reading; `Ok(None)` when the runtime returned nothing.
    fn one_shot_usage_sample(
        &self,
        container_id: &str,
    ) -> impl Future<Output = Result<Option<RawUsageSample>>> + Send;

    /// Followed stdout + stderr of the container.
    fn open_log_feed(
        &self,
        container_id: &str,
    ) -> impl Future<Output = Result<Self::LogFeed>> + Send;

    fn execute_action(
        &self,
        container_id: &str,
        action: ContainerAction,
    ) -> impl Future<Output = Result<()>> + Send;
}
