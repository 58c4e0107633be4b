//! Remote record store client
//!
//! WebSocket-based client for an ordo record server. A background task
//! owns the connection and reconnects automatically with exponential
//! backoff; store operations are forwarded to it over a command channel
//! and resolved when the server acknowledges the request.
//!
//! Snapshots pushed by the server are fanned out to every open
//! subscription. The latest snapshot is cached so a new subscription (or
//! one surviving a reconnect) starts from known state immediately.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::message::{ClientId, ClientMessage, ServerMessage};
use super::{RecordStore, StoreError, StoreResult, Subscription};
use crate::auth::AccessMode;
use crate::models::Item;

use async_trait::async_trait;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected, waiting to retry
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Connected and ready
    Connected,
}

/// Configuration for the remote store connection
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// WebSocket URL (ws:// or wss://)
    pub url: String,
    /// Access claim presented in the handshake
    pub access: AccessMode,
    /// Initial reconnect delay
    pub initial_reconnect_delay: Duration,
    /// Maximum reconnect delay
    pub max_reconnect_delay: Duration,
    /// How long to wait for a write acknowledgement
    pub request_timeout: Duration,
}

impl RemoteConfig {
    /// Configuration with default timing for the given server and access
    pub fn new(url: impl Into<String>, access: AccessMode) -> Self {
        Self {
            url: url.into(),
            access,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(30),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Commands sent to the connection task
enum Command {
    Write {
        request_id: Uuid,
        message: ClientMessage,
        reply: oneshot::Sender<StoreResult<Option<Item>>>,
    },
    Subscribe {
        reply: oneshot::Sender<Subscription>,
    },
    Shutdown,
}

/// WebSocket implementation of [`RecordStore`]
pub struct RemoteStore {
    command_tx: mpsc::Sender<Command>,
    status_rx: watch::Receiver<ConnectionStatus>,
    request_timeout: Duration,
}

impl RemoteStore {
    /// Spawn the connection task and return a handle to it
    ///
    /// Connection establishment happens in the background; operations
    /// issued before the first successful handshake fail fast with a
    /// connection error rather than queueing.
    pub fn connect(config: RemoteConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let request_timeout = config.request_timeout;

        tokio::spawn(connection_task(config, command_rx, status_tx));

        Self {
            command_tx,
            status_rx,
            request_timeout,
        }
    }

    /// Get the current connection status
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// Subscribe to connection status changes
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Ask the connection task to shut down
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(Command::Shutdown).await;
    }

    /// Send a write request and wait for the server's acknowledgement
    async fn request(
        &self,
        request_id: Uuid,
        message: ClientMessage,
    ) -> StoreResult<Option<Item>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Write {
                request_id,
                message,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StoreError::Closed)?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Err(_) => Err(StoreError::Connection {
                details: "request timed out".to_string(),
            }),
            Ok(Err(_)) => Err(StoreError::Closed),
            Ok(Ok(result)) => result,
        }
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn create(&self, content: &str, order: i64) -> StoreResult<Item> {
        let request_id = Uuid::new_v4();
        let reply = self
            .request(request_id, ClientMessage::create(request_id, content, order))
            .await?;
        reply.ok_or_else(|| StoreError::Protocol {
            details: "create acknowledgement carried no item".to_string(),
        })
    }

    async fn update_order(&self, id: Uuid, order: i64) -> StoreResult<()> {
        let request_id = Uuid::new_v4();
        self.request(request_id, ClientMessage::update(request_id, id, order))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let request_id = Uuid::new_v4();
        self.request(request_id, ClientMessage::delete(request_id, id))
            .await?;
        Ok(())
    }

    async fn subscribe(&self) -> StoreResult<Subscription> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Subscribe { reply: reply_tx })
            .await
            .map_err(|_| StoreError::Closed)?;
        reply_rx.await.map_err(|_| StoreError::Closed)
    }
}

/// Generate a session client id
fn new_client_id() -> ClientId {
    format!("ordo-{}", &Uuid::new_v4().to_string()[..8])
}

/// Reconnect backoff: the delay doubles after each failed cycle up to
/// the cap, and resets once a handshake succeeds, so it reflects
/// consecutive failures only.
struct Backoff {
    delay: Duration,
    initial: Duration,
    max: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            delay: initial,
            initial,
            max,
        }
    }

    /// Current delay, doubling for the next cycle
    fn next(&mut self) -> Duration {
        let delay = self.delay;
        self.delay = (self.delay * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.delay = self.initial;
    }
}

/// State that survives reconnects
struct TaskState {
    subscribers: Vec<mpsc::UnboundedSender<Vec<Item>>>,
    last_snapshot: Option<Vec<Item>>,
    pending: HashMap<Uuid, oneshot::Sender<StoreResult<Option<Item>>>>,
}

impl TaskState {
    fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            last_snapshot: None,
            pending: HashMap::new(),
        }
    }

    /// Register a new subscriber, seeding it with the cached snapshot
    fn add_subscriber(&mut self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(ref snapshot) = self.last_snapshot {
            let _ = tx.send(snapshot.clone());
        }
        self.subscribers.push(tx);
        Subscription::new(rx)
    }

    /// Cache and fan out a server-pushed snapshot
    fn push_snapshot(&mut self, items: Vec<Item>) {
        self.subscribers.retain(|tx| tx.send(items.clone()).is_ok());
        self.last_snapshot = Some(items);
    }

    /// Fail every in-flight request with a connection error
    fn fail_pending(&mut self, details: &str) {
        for (_, reply) in self.pending.drain() {
            let _ = reply.send(Err(StoreError::Connection {
                details: details.to_string(),
            }));
        }
    }
}

/// Main connection loop with reconnection
async fn connection_task(
    config: RemoteConfig,
    mut command_rx: mpsc::Receiver<Command>,
    status_tx: watch::Sender<ConnectionStatus>,
) {
    let client_id = new_client_id();
    let mut state = TaskState::new();
    let mut backoff = Backoff::new(config.initial_reconnect_delay, config.max_reconnect_delay);

    loop {
        let _ = status_tx.send(ConnectionStatus::Connecting);

        match run_connection(
            &config,
            &client_id,
            &mut state,
            &mut command_rx,
            &status_tx,
            &mut backoff,
        )
        .await
        {
            Ok(true) => {
                // Shutdown requested
                let _ = status_tx.send(ConnectionStatus::Disconnected);
                break;
            }
            Ok(false) => {
                state.fail_pending("connection closed");
            }
            Err(e) => {
                warn!("Connection to {} failed: {}", config.url, e);
                state.fail_pending(&e.to_string());
            }
        }

        let _ = status_tx.send(ConnectionStatus::Disconnected);

        // Wait before reconnecting, still answering commands so callers
        // fail fast instead of hanging
        tokio::select! {
            _ = tokio::time::sleep(backoff.next()) => {}
            cmd = command_rx.recv() => {
                match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(Command::Subscribe { reply }) => {
                        let _ = reply.send(state.add_subscriber());
                    }
                    Some(Command::Write { reply, .. }) => {
                        let _ = reply.send(Err(StoreError::Connection {
                            details: "not connected".to_string(),
                        }));
                    }
                }
            }
        }
    }
}

/// Connect, handshake, and serve commands until disconnect or shutdown
///
/// Returns `Ok(true)` if shutdown was requested, `Ok(false)` if the
/// connection closed and we should reconnect.
async fn run_connection(
    config: &RemoteConfig,
    client_id: &str,
    state: &mut TaskState,
    command_rx: &mut mpsc::Receiver<Command>,
    status_tx: &watch::Sender<ConnectionStatus>,
    backoff: &mut Backoff,
) -> StoreResult<bool> {
    debug!("Connecting to {}", config.url);
    let (ws_stream, _response) =
        connect_async(&config.url)
            .await
            .map_err(|e| StoreError::Connection {
                details: e.to_string(),
            })?;
    let (mut write, mut read) = ws_stream.split();

    // Handshake: hello with our access claim, wait for welcome
    let hello = ClientMessage::hello(client_id, config.access.clone());
    send(&mut write, &hello).await?;
    wait_for_welcome(&mut read).await?;

    info!("Connected to {}", config.url);
    let _ = status_tx.send(ConnectionStatus::Connected);
    backoff.reset();

    loop {
        tokio::select! {
            cmd = command_rx.recv() => {
                match cmd {
                    Some(Command::Write { request_id, message, reply }) => {
                        state.pending.insert(request_id, reply);
                        send(&mut write, &message).await?;
                    }
                    Some(Command::Subscribe { reply }) => {
                        let _ = reply.send(state.add_subscriber());
                    }
                    Some(Command::Shutdown) | None => {
                        write.close().await.ok();
                        state.fail_pending("shutting down");
                        return Ok(true);
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(message) => handle_server_message(message, state)?,
                            Err(e) => {
                                warn!("Failed to decode server message: {:?}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Ok(false);
                    }
                    Some(Err(e)) => {
                        return Err(StoreError::Connection { details: e.to_string() });
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Resolve a server message against in-flight requests and subscribers
fn handle_server_message(message: ServerMessage, state: &mut TaskState) -> StoreResult<()> {
    match message {
        ServerMessage::Snapshot { items } => {
            debug!(items = items.len(), "snapshot received");
            state.push_snapshot(items);
        }
        ServerMessage::Ack { request_id, item } => {
            if let Some(reply) = state.pending.remove(&request_id) {
                let _ = reply.send(Ok(item));
            }
        }
        ServerMessage::Refused {
            request_id,
            message,
        } => {
            if let Some(reply) = state.pending.remove(&request_id) {
                let _ = reply.send(Err(StoreError::Rejected { message }));
            }
        }
        ServerMessage::Denied { message } => {
            // The whole session is unusable; drop the connection
            for (_, reply) in state.pending.drain() {
                let _ = reply.send(Err(StoreError::Unauthorized {
                    details: message.clone(),
                }));
            }
            return Err(StoreError::Unauthorized { details: message });
        }
        ServerMessage::Welcome { .. } => {
            // Already past the handshake; ignore
        }
    }
    Ok(())
}

async fn send(write: &mut WsSink, message: &ClientMessage) -> StoreResult<()> {
    write
        .send(Message::Binary(message.encode()))
        .await
        .map_err(|e| StoreError::Connection {
            details: e.to_string(),
        })
}

/// Wait for the welcome handshake response
async fn wait_for_welcome(read: &mut WsSource) -> StoreResult<()> {
    let timeout = Duration::from_secs(10);
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return Err(StoreError::Connection {
                details: "timeout waiting for server welcome".to_string(),
            });
        }

        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        match ServerMessage::decode(&data) {
                            Ok(ServerMessage::Welcome { selected_protocol_version, .. }) => {
                                debug!(version = %selected_protocol_version, "handshake complete");
                                return Ok(());
                            }
                            Ok(ServerMessage::Denied { message }) => {
                                return Err(StoreError::Unauthorized { details: message });
                            }
                            Ok(_) => {
                                // Ignore other messages during handshake
                            }
                            Err(e) => {
                                warn!("Failed to decode handshake message: {:?}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(StoreError::Connection {
                            details: "server closed connection during handshake".to_string(),
                        });
                    }
                    Some(Err(e)) => {
                        return Err(StoreError::Connection { details: e.to_string() });
                    }
                    _ => {}
                }
            }
            _ = tokio::time::sleep(remaining) => {
                return Err(StoreError::Connection {
                    details: "timeout waiting for server welcome".to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_format() {
        let id = new_client_id();
        assert!(id.starts_with("ordo-"));
        assert_eq!(id.len(), "ordo-".len() + 8);
    }

    #[test]
    fn test_default_config_timing() {
        let config = RemoteConfig::new(
            "ws://localhost:4040",
            AccessMode::SharedKey { key: "k".into() },
        );
        assert_eq!(config.initial_reconnect_delay, Duration::from_secs(1));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_starts_disconnected() {
        let config = RemoteConfig::new(
            "ws://127.0.0.1:1",
            AccessMode::SharedKey { key: "k".into() },
        );
        let store = RemoteStore::connect(config);

        // No server: status is connecting or back to disconnected,
        // never connected
        assert_ne!(store.status(), ConnectionStatus::Connected);
        store.shutdown().await;
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(4));
        assert_eq!(backoff.next(), Duration::from_secs(1));
        assert_eq!(backoff.next(), Duration::from_secs(2));
        assert_eq!(backoff.next(), Duration::from_secs(4));
        assert_eq!(backoff.next(), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_resets_after_successful_handshake() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        backoff.next();
        backoff.next();
        backoff.next();

        // A long-lived connection that later drops starts over from the
        // initial delay, not the last doubled one
        backoff.reset();
        assert_eq!(backoff.next(), Duration::from_secs(1));
        assert_eq!(backoff.next(), Duration::from_secs(2));
    }

    #[test]
    fn test_task_state_snapshot_seeding() {
        let mut state = TaskState::new();
        state.push_snapshot(vec![Item::new("a", 1000)]);

        let mut sub = state.add_subscriber();
        let seeded = sub.snapshots.try_recv().unwrap();
        assert_eq!(seeded.len(), 1);
    }

    #[test]
    fn test_task_state_fail_pending() {
        let mut state = TaskState::new();
        let (tx, mut rx) = oneshot::channel();
        state.pending.insert(Uuid::new_v4(), tx);

        state.fail_pending("gone");
        let result = rx.try_recv().unwrap();
        assert!(matches!(result, Err(StoreError::Connection { .. })));
    }
}
