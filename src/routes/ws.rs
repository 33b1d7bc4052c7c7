// WebSocket handlers: live container stats and logs

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, timeout};
use tokio_util::sync::CancellationToken;

use super::AppState;
use crate::error::{Error, Result};
use crate::gateway::RuntimeGateway;
use crate::models::DerivedMetrics;
use crate::stats::{self, Sink};

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Sends stream items as text frames. Shared with the keepalive pinger.
struct WsSink {
    sender: WsSender,
    send_timeout: Duration,
}

impl WsSink {
    async fn send(&self, message: Message) -> Result<()> {
        send_with_timeout(&self.sender, self.send_timeout, message).await
    }
}

async fn send_with_timeout(
    sender: &WsSender,
    send_timeout: Duration,
    message: Message,
) -> Result<()> {
    let mut sender = sender.lock().await;
    match timeout(send_timeout, sender.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Sink(Box::new(e))),
        Err(elapsed) => Err(Error::Sink(Box::new(elapsed))),
    }
}

impl Sink<DerivedMetrics> for WsSink {
    async fn deliver(&mut self, item: DerivedMetrics) -> Result<()> {
        let json = serde_json::to_string(&item).map_err(|e| Error::Sink(Box::new(e)))?;
        self.send(Message::Text(json.into())).await
    }
}

impl Sink<String> for WsSink {
    async fn deliver(&mut self, item: String) -> Result<()> {
        if item.is_empty() {
            return Ok(());
        }
        self.send(Message::Text(item.into())).await
    }
}

/// Everything a stream session owns besides the sink: its token and helper tasks.
struct Session {
    cancel: CancellationToken,
    reader: tokio::task::JoinHandle<()>,
    pinger: tokio::task::JoinHandle<()>,
}

impl Session {
    /// Splits the socket; the read half cancels the session when the client goes away and
    /// a pinger keeps the connection alive.
    fn start<G>(socket: WebSocket, state: &AppState<G>) -> (Self, WsSink) {
        let (sender, receiver) = socket.split();
        let sender: WsSender = Arc::new(Mutex::new(sender));
        let cancel = state.shutdown.child_token();
        let send_timeout = Duration::from_secs(state.streaming.ws_send_timeout_secs);
        let ping_every = Duration::from_secs(state.streaming.ws_ping_interval_secs);

        let reader = tokio::spawn(watch_client(receiver, cancel.clone()));
        let pinger = tokio::spawn(keepalive(
            sender.clone(),
            send_timeout,
            ping_every,
            cancel.clone(),
        ));
        let sink = WsSink {
            sender,
            send_timeout,
        };
        (
            Self {
                cancel,
                reader,
                pinger,
            },
            sink,
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.reader.abort();
        self.pinger.abort();
    }
}

async fn watch_client(mut receiver: SplitStream<WebSocket>, cancel: CancellationToken) {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    cancel.cancel();
}

async fn keepalive(
    sender: WsSender,
    send_timeout: Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ping_interval = tokio::time::interval(every);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ping_interval.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ping_interval.tick() => {
                let ping = Message::Ping(Bytes::new());
                if send_with_timeout(&sender, send_timeout, ping).await.is_err() {
                    cancel.cancel();
                    break;
                }
            }
        }
    }
}

pub(super) async fn ws_stats<G: RuntimeGateway>(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState<G>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        tracing::debug!(container_id = %id, "client connected to stats stream");
        let (session, mut sink) = Session::start(socket, &state);
        let result =
            stats::stream_one(state.gateway.as_ref(), &session.cancel, &id, &mut sink).await;
        if let Err(e) = result
            && !e.is_cancelled()
        {
            tracing::debug!(container_id = %id, error = %e, "stats stream ended");
        }
    })
}

pub(super) async fn ws_logs<G: RuntimeGateway>(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState<G>>,
) -> impl IntoResponse {
    tracing::info!(container_id = %id, "logs websocket request");
    ws.on_upgrade(move |socket| async move {
        let (session, mut sink) = Session::start(socket, &state);
        // Empty first frame tells the client the stream is open.
        if sink.send(Message::Text(String::new().into())).await.is_err() {
            return;
        }
        let result = state
            .control
            .stream_logs(&session.cancel, &id, &mut sink)
            .await;
        match result {
            Ok(()) | Err(Error::Cancelled) | Err(Error::Sink(_)) => {}
            Err(e) => {
                tracing::debug!(container_id = %id, error = %e, "logs stream ended");
                let msg = serde_json::json!({ "error": e.to_string() }).to_string();
                let _ = sink.send(Message::Text(msg.into())).await;
            }
        }
    })
}
