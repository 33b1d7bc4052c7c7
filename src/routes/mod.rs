// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{AppConfig, StreamingConfig};
use crate::control::ContainerControl;
use crate::gateway::RuntimeGateway;
use crate::stats::SummaryAggregator;

pub(crate) struct AppState<G> {
    pub(crate) gateway: Arc<G>,
    pub(crate) control: ContainerControl<G>,
    pub(crate) summary: SummaryAggregator<G>,
    /// Parent of every stream session's token; cancelled on process shutdown.
    pub(crate) shutdown: CancellationToken,
    pub(crate) streaming: StreamingConfig,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            control: self.control.clone(),
            summary: self.summary.clone(),
            shutdown: self.shutdown.clone(),
            streaming: self.streaming.clone(),
        }
    }
}

pub fn app<G: RuntimeGateway>(
    gateway: Arc<G>,
    shutdown: CancellationToken,
    config: AppConfig,
) -> Router {
    let state = AppState {
        control: ContainerControl::new(gateway.clone()),
        summary: SummaryAggregator::new(gateway.clone()),
        gateway,
        shutdown,
        streaming: config.streaming,
    };
    Router::new()
        .route("/version", get(http::version_handler))
        .route("/api/health", get(http::health_handler))
        .route("/api/containers", get(http::list_containers::<G>))
        .route("/api/containers/{id}/action", post(http::container_action::<G>))
        .route("/api/system/summary", get(http::system_summary::<G>))
        .route("/api/images", get(http::list_images::<G>))
        .route("/api/volumes", get(http::list_volumes::<G>))
        .route("/api/stats/{id}", get(ws::ws_stats::<G>))
        .route("/api/logs/{id}", get(ws::ws_logs::<G>))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}
