// Docker implementation of the runtime gateway via bollard

mod convert;
mod feed;

use bollard::Docker;
use bollard::query_parameters::{
    ListContainersOptions, ListImagesOptions, ListVolumesOptions, LogsOptions,
    RestartContainerOptions, StartContainerOptions, StatsOptions, StopContainerOptions,
};
use futures_util::StreamExt;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

pub use feed::ChannelFeed;

use super::RuntimeGateway;
use crate::config::DockerConfig;
use crate::control::ContainerAction;
use crate::error::Result;
use crate::models::{ContainerRecord, ImageRecord, RawUsageSample, VolumeRecord};

/// Environment variable consulted when no host is configured.
pub const ENV_DOCKER_HOST: &str = "DOCKER_HOST";

const CONNECT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct DockerGateway {
    docker: Docker,
    stop_timeout_secs: u32,
    feed_capacity: usize,
}

impl DockerGateway {
    /// Connects to the configured host (or `DOCKER_HOST`, or the local socket) and pings it.
    pub async fn connect(config: &DockerConfig, feed_capacity: usize) -> anyhow::Result<Self> {
        let host = config
            .host
            .clone()
            .or_else(|| std::env::var(ENV_DOCKER_HOST).ok())
            .filter(|h| !h.is_empty());
        let docker = match host.as_deref() {
            None => Docker::connect_with_local_defaults()?,
            Some(h) if h.starts_with("unix://") => {
                let path = resolve_socket_path(h);
                Docker::connect_with_unix(
                    &path,
                    CONNECT_TIMEOUT_SECS,
                    bollard::API_DEFAULT_VERSION,
                )?
            }
            Some(h) => {
                Docker::connect_with_http(h, CONNECT_TIMEOUT_SECS, bollard::API_DEFAULT_VERSION)?
            }
        };
        if let Err(e) = docker.ping().await {
            error!(
                host = host.as_deref().unwrap_or("local"),
                error = %e,
                "docker daemon ping failed"
            );
            return Err(e.into());
        }
        info!(host = host.as_deref().unwrap_or("local"), "docker client connected");
        Ok(Self {
            docker,
            stop_timeout_secs: config.stop_timeout_secs,
            feed_capacity,
        })
    }
}

/// `unix://relative/path` into an absolute socket path (prefix stripped).
fn resolve_socket_path(host: &str) -> String {
    let path = host.trim_start_matches("unix://");
    if path.is_empty() || path.starts_with('/') {
        return path.to_string();
    }
    match std::path::absolute(Path::new(path)) {
        Ok(abs) => abs.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(path, error = %e, "resolving docker socket path");
            path.to_string()
        }
    }
}

impl RuntimeGateway for DockerGateway {
    type UsageFeed = ChannelFeed<RawUsageSample>;
    type LogFeed = ChannelFeed<String>;

    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerRecord>> {
        let options = ListContainersOptions {
            all,
            ..Default::default()
        };
        let raw = self.docker.list_containers(Some(options)).await.map_err(|e| {
            error!(error = %e, "container list failed");
            e
        })?;
        let out: Vec<ContainerRecord> = raw.into_iter().map(convert::container_record).collect();
        debug!(count = out.len(), all, "containers listed");
        Ok(out)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "list_images"))]
    async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let raw = self
            .docker
            .list_images(Some(ListImagesOptions::default()))
            .await
            .map_err(|e| {
                error!(error = %e, "image list failed");
                e
            })?;
        let out: Vec<ImageRecord> = raw.into_iter().map(convert::image_record).collect();
        debug!(count = out.len(), "images listed");
        Ok(out)
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "list_volumes"))]
    async fn list_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let raw = self
            .docker
            .list_volumes(None::<ListVolumesOptions>)
            .await
            .map_err(|e| {
                error!(error = %e, "volume list failed");
                e
            })?;
        let out: Vec<VolumeRecord> = raw
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(convert::volume_record)
            .collect();
        debug!(count = out.len(), "volumes listed");
        Ok(out)
    }

    async fn host_memory_total(&self) -> Result<u64> {
        let info = self.docker.info().await?;
        Ok(info.mem_total.unwrap_or(0).max(0) as u64)
    }

    async fn open_usage_feed(&self, container_id: &str) -> Result<Self::UsageFeed> {
        let docker = self.docker.clone();
        let id = container_id.to_string();
        let feed = ChannelFeed::spawn(self.feed_capacity, move |tx| async move {
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let stream = docker.stats(&id, Some(options));
            feed::pump(stream, tx, |s| convert::usage_sample(&s)).await;
            debug!(container_id = %id, "stats feed closed");
        });
        feed.primed().await.map_err(|e| {
            error!(container_id, error = %e, "container stats stream failed");
            e
        })
    }

    async fn one_shot_usage_sample(&self, container_id: &str) -> Result<Option<RawUsageSample>> {
        // stream=false still waits one runtime cycle, so the previous CPU reading is populated.
        let options = StatsOptions {
            stream: false,
            one_shot: false,
            ..Default::default()
        };
        let stream = self.docker.stats(container_id, Some(options));
        let mut stream = std::pin::pin!(stream);
        match stream.next().await {
            Some(Ok(s)) => Ok(Some(convert::usage_sample(&s))),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    async fn open_log_feed(&self, container_id: &str) -> Result<Self::LogFeed> {
        let docker = self.docker.clone();
        let id = container_id.to_string();
        let feed = ChannelFeed::spawn(self.feed_capacity, move |tx| async move {
            let options = LogsOptions {
                follow: true,
                stdout: true,
                stderr: true,
                timestamps: false,
                tail: "all".to_string(),
                ..Default::default()
            };
            let stream = docker.logs(&id, Some(options));
            feed::pump(stream, tx, |chunk| chunk.to_string()).await;
            debug!(container_id = %id, "log feed closed");
        });
        feed.primed().await.map_err(|e| {
            error!(container_id, error = %e, "container logs failed");
            e
        })
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "execute_action"))]
    async fn execute_action(&self, container_id: &str, action: ContainerAction) -> Result<()> {
        let t = Some(self.stop_timeout_secs as i32);
        match action {
            ContainerAction::Start => {
                self.docker
                    .start_container(container_id, None::<StartContainerOptions>)
                    .await?
            }
            ContainerAction::Stop => {
                let options = StopContainerOptions {
                    t,
                    ..Default::default()
                };
                self.docker.stop_container(container_id, Some(options)).await?
            }
            ContainerAction::Restart => {
                let options = RestartContainerOptions {
                    t,
                    ..Default::default()
                };
                self.docker
                    .restart_container(container_id, Some(options))
                    .await?
            }
            ContainerAction::Pause => self.docker.pause_container(container_id).await?,
            ContainerAction::Unpause => self.docker.unpause_container(container_id).await?,
        }
        Ok(())
    }
}
