// Listing and lifecycle control: thin pass-through over the runtime gateway.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::gateway::RuntimeGateway;
use crate::models::{ContainerRecord, ImageRecord, VolumeRecord};
use crate::stats::{Sink, forward};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Pause,
    Unpause,
}

impl ContainerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ContainerAction::Start => "start",
            ContainerAction::Stop => "stop",
            ContainerAction::Restart => "restart",
            ContainerAction::Pause => "pause",
            ContainerAction::Unpause => "unpause",
        }
    }
}

impl FromStr for ContainerAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(ContainerAction::Start),
            "stop" => Ok(ContainerAction::Stop),
            "restart" => Ok(ContainerAction::Restart),
            "pause" => Ok(ContainerAction::Pause),
            "unpause" => Ok(ContainerAction::Unpause),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ContainerControl<G> {
    gateway: Arc<G>,
}

impl<G> Clone for ContainerControl<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<G: RuntimeGateway> ContainerControl<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerRecord>> {
        let list = self.gateway.list_containers(all).await.map_err(|e| {
            error!(error = %e, "list containers failed");
            e
        })?;
        debug!(count = list.len(), all, "list containers ok");
        Ok(list)
    }

    pub async fn list_images(&self) -> Result<Vec<ImageRecord>> {
        let list = self.gateway.list_images().await.map_err(|e| {
            error!(error = %e, "list images failed");
            e
        })?;
        debug!(count = list.len(), "list images ok");
        Ok(list)
    }

    pub async fn list_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let list = self.gateway.list_volumes().await.map_err(|e| {
            error!(error = %e, "list volumes failed");
            e
        })?;
        debug!(count = list.len(), "list volumes ok");
        Ok(list)
    }

    /// Validates the id and action name, then forwards to the runtime.
    pub async fn execute_action(&self, container_id: &str, action: &str) -> Result<()> {
        if container_id.is_empty() {
            return Err(Error::MissingContainerId);
        }
        let action: ContainerAction = action.parse()?;
        if let Err(e) = self.gateway.execute_action(container_id, action).await {
            error!(container_id, %action, error = %e, "container action failed");
            return Err(e);
        }
        info!(container_id, %action, "container action ok");
        Ok(())
    }

    /// Follows the container's logs into `sink` with the same termination rules as stats streams.
    pub async fn stream_logs<S: Sink<String>>(
        &self,
        cancel: &CancellationToken,
        container_id: &str,
        sink: &mut S,
    ) -> Result<()> {
        if container_id.is_empty() {
            return Err(Error::MissingContainerId);
        }
        let mut feed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            opened = self.gateway.open_log_feed(container_id) => opened?,
        };
        forward(cancel, &mut feed, sink, |chunk| chunk).await
    }
}
