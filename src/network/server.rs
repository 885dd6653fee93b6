//! WebSocket Game Server
//!
//! Async WebSocket server for multiplayer connections.
//! Routes register/move requests to the [`GameCoordinator`] and fans the
//! resulting state out to every connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::Utc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::config::{env_or, parse_value, ConfigError};
use crate::game::coordinator::{GameCoordinator, MoveOutcome};
use crate::game::registry::PlayerId;
use crate::network::protocol::{
    ClientMessage, ServerMessage, GameStateUpdate, GameEvent, NameRejection,
    ErrorCode, normalize_name,
};
use crate::network::session::{ClientRegistry, SessionError};

/// Outbound queue depth per connection.
const CLIENT_QUEUE_DEPTH: usize = 64;

/// How long a closing connection may spend flushing its queue.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Connections silent for longer than this are dropped.
    pub idle_timeout: Duration,
    /// How often idle connections are swept.
    pub cleanup_interval: Duration,
    /// Capacity of the state/event broadcast channel.
    pub broadcast_capacity: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(30),
            broadcast_capacity: 256,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Read overrides from the environment.
    ///
    /// `COIN_GRID_BIND` takes a full socket address and wins over `PORT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("COIN_GRID_BIND") {
            Ok(raw) => parse_value("COIN_GRID_BIND", &raw)?,
            Err(_) => {
                let port = env_or("PORT", defaults.bind_addr.port())?;
                SocketAddr::new(defaults.bind_addr.ip(), port)
            }
        };

        let max_connections = env_or("COIN_GRID_MAX_CONNECTIONS", defaults.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be positive".to_string()));
        }

        let idle_secs = env_or("COIN_GRID_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())?;
        let cleanup_secs = env_or(
            "COIN_GRID_CLEANUP_INTERVAL_SECS",
            defaults.cleanup_interval.as_secs(),
        )?;
        if cleanup_secs == 0 {
            return Err(ConfigError::Invalid("cleanup interval must be positive".to_string()));
        }

        Ok(Self {
            bind_addr,
            max_connections,
            idle_timeout: Duration::from_secs(idle_secs),
            cleanup_interval: Duration::from_secs(cleanup_secs),
            ..defaults
        })
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Bad configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// State shared by every connection task.
struct Shared {
    config: ServerConfig,
    coordinator: Arc<GameCoordinator>,
    clients: ClientRegistry,
    /// One permit per admitted connection, taken before the handshake.
    slots: Arc<Semaphore>,
    updates: broadcast::Sender<ServerMessage>,
}

impl Shared {
    /// Build a state message from a fresh snapshot.
    async fn state_message(&self) -> ServerMessage {
        let snapshot = self.coordinator.snapshot().await;
        ServerMessage::State(GameStateUpdate::new(
            self.coordinator.board(),
            snapshot,
            Utc::now(),
        ))
    }

    /// Broadcast events followed by the resulting state.
    async fn publish(&self, events: Vec<GameEvent>) {
        // Send fails only when nobody is subscribed
        for event in events {
            let _ = self.updates.send(ServerMessage::Event(event));
        }
        let state = self.state_message().await;
        let _ = self.updates.send(state);
    }
}

/// The game server.
pub struct GameServer {
    shared: Arc<Shared>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server around a coordinator.
    pub fn new(config: ServerConfig, coordinator: Arc<GameCoordinator>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let slots = Arc::new(Semaphore::new(config.max_connections.min(Semaphore::MAX_PERMITS)));

        Self {
            shared: Arc::new(Shared {
                config,
                coordinator,
                clients: ClientRegistry::new(),
                slots,
                updates,
            }),
            shutdown_tx,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.shared.config
    }

    /// Bind the configured address and run until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.shared.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Run on an already bound listener until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Coin grid server v{} listening on {}",
            self.shared.config.version,
            listener.local_addr()?
        );

        let cleanup_shared = self.shared.clone();
        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_shared).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            match self.shared.slots.clone().try_acquire_owned() {
                                Ok(permit) => {
                                    info!("New connection from {}", addr);
                                    self.handle_connection(stream, addr, permit);
                                }
                                Err(_) => {
                                    warn!("Connection limit reached, rejecting {}", addr);
                                    Self::reject_connection(stream, addr);
                                }
                            }
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        cleanup_handle.abort();

        Ok(())
    }

    /// Complete the handshake only to tell the client the server is full.
    fn reject_connection(stream: TcpStream, addr: SocketAddr) {
        tokio::spawn(async move {
            let mut ws = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    debug!("Handshake with rejected client {} failed: {}", addr, e);
                    return;
                }
            };

            let refusal = ServerMessage::error(ErrorCode::ServerOverloaded, "Server is full");
            match refusal.to_json() {
                Ok(text) => {
                    let _ = ws.send(Message::Text(text)).await;
                }
                Err(e) => error!("Failed to serialize message: {}", e),
            }
            let _ = ws.close(None).await;
        });
    }

    /// Handle a new WebSocket connection.
    ///
    /// `permit` holds the connection's slot until the task ends.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, permit: OwnedSemaphorePermit) {
        let shared = self.shared.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let mut updates_rx = shared.updates.subscribe();

        tokio::spawn(async move {
            let _permit = permit;

            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(CLIENT_QUEUE_DEPTH);

            let (client_id, mut close_rx) = shared.clients.insert(addr, msg_tx.clone()).await;
            debug!("Client {} tracked as {}", addr, client_id);

            // Spawn message sender task
            let mut sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let closing = matches!(msg, ServerMessage::Shutdown { .. });
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                    if closing {
                        let _ = ws_sender.close().await;
                        break;
                    }
                }
            });

            // Initial view so the client can draw the board before registering
            let _ = msg_tx.send(shared.state_message().await).await;

            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                shared.clients.touch(&addr).await;

                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx.send(ServerMessage::error(
                                            ErrorCode::InvalidInput,
                                            "Invalid message format",
                                        )).await;
                                        continue;
                                    }
                                };

                                Self::handle_client_message(addr, client_msg, &shared, &msg_tx).await;
                            }
                            Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                                // Protocol-level pongs are answered by tungstenite
                                shared.clients.touch(&addr).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    update = updates_rx.recv() => {
                        match update {
                            Ok(message) => {
                                if msg_tx.send(message).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                warn!("Client {} lagged by {} updates, resyncing", addr, skipped);
                                let _ = msg_tx.send(shared.state_message().await).await;
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                    _ = &mut close_rx => {
                        // Evicted; a full queue must not keep the task alive
                        let _ = msg_tx.try_send(ServerMessage::Shutdown {
                            reason: "Idle timeout".to_string(),
                        });
                        break;
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup; the writer exits once every sender is gone
            if let Some(client) = shared.clients.remove(&addr).await {
                debug!("Client {} was connected for {:?}", addr, client.connected_for(Instant::now()));
            }
            drop(msg_tx);
            if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
                debug!("Writer for {} did not drain in time", addr);
                sender_task.abort();
            }

            info!("Client {} cleaned up", addr);
        });
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        shared: &Shared,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match msg {
            ClientMessage::Register { name } => {
                Self::handle_register(addr, &name, shared, sender).await;
            }
            ClientMessage::Move { direction } => {
                Self::handle_move(addr, &direction, shared).await;
            }
            ClientMessage::SyncRequest => {
                let _ = sender.send(shared.state_message().await).await;
            }
            ClientMessage::Ping { timestamp } => {
                let _ = sender.send(ServerMessage::Pong {
                    timestamp,
                    server_time: Utc::now().timestamp_millis().max(0) as u64,
                }).await;
            }
        }
    }

    /// Handle a registration request.
    async fn handle_register(
        addr: SocketAddr,
        raw_name: &str,
        shared: &Shared,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        match shared.clients.ensure_unregistered(&addr).await {
            Ok(()) => {}
            Err(e @ SessionError::AlreadyRegistered(_)) => {
                debug!("Rejecting second registration from {}: {}", addr, e);
                let _ = sender.send(ServerMessage::error(ErrorCode::AlreadyRegistered, e.to_string())).await;
                return;
            }
            Err(e @ SessionError::UnknownConnection(_)) => {
                warn!("Registration from untracked connection {}: {}", addr, e);
                let _ = sender.send(ServerMessage::error(ErrorCode::InternalError, e.to_string())).await;
                return;
            }
        }

        let name = normalize_name(raw_name);

        match shared.coordinator.register_player(name).await {
            Ok(player_id) => {
                Self::complete_registration(addr, player_id, name, shared, sender).await;
            }
            Err(e) => match NameRejection::from_error(&e) {
                Some(reason) => {
                    debug!("Name {:?} from {} rejected: {}", name, addr, e);
                    let _ = sender.send(ServerMessage::BadName {
                        name: name.to_string(),
                        reason,
                    }).await;
                }
                None => {
                    warn!("Registration for {:?} failed: {}", name, e);
                    let _ = sender.send(ServerMessage::error(ErrorCode::InternalError, e.to_string())).await;
                }
            },
        }
    }

    /// Bind a freshly registered player to its connection and announce it.
    async fn complete_registration(
        addr: SocketAddr,
        player_id: PlayerId,
        name: &str,
        shared: &Shared,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        if let Err(e) = shared.clients.bind(&addr, player_id, name).await {
            // The player stays registered; the name cannot be claimed again
            warn!("Could not bind {} to {:?}: {}", addr, name, e);
            let _ = sender.send(ServerMessage::error(
                ErrorCode::InternalError,
                format!("Registered {:?} but could not attach it to this connection: {}", name, e),
            )).await;
            return;
        }

        let _ = sender.send(ServerMessage::Welcome {
            player_id: player_id.as_u32(),
            name: name.to_string(),
        }).await;

        shared.publish(vec![GameEvent::PlayerJoined { name: name.to_string() }]).await;
    }

    /// Handle a move request. Failures are logged, never answered.
    async fn handle_move(addr: SocketAddr, code: &str, shared: &Shared) {
        let Some(name) = shared.clients.registered_name(&addr).await else {
            debug!("Ignoring move from unregistered client {}", addr);
            return;
        };

        match shared.coordinator.apply_move_code(&name, code).await {
            Ok(Some(outcome)) => {
                shared.publish(move_events(&name, &outcome, shared.coordinator.board().num_coins)).await;
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Move {:?} by {:?} failed: {}", code, name, e);
            }
        }
    }

    /// Run cleanup loop.
    async fn run_cleanup_loop(shared: Arc<Shared>) {
        let mut interval = interval(shared.config.cleanup_interval);

        loop {
            interval.tick().await;

            let removed = shared.clients.sweep_idle(shared.config.idle_timeout).await;
            let now = Instant::now();
            for (addr, client) in removed {
                info!(
                    "Removed idle client {} ({}) after {:?}",
                    addr,
                    client.id,
                    client.connected_for(now)
                );
                client.close();
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.shared.clients.len().await
    }
}

/// Events announcing the effects of one move.
fn move_events(name: &str, outcome: &MoveOutcome, batch_size: u32) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if let Some(value) = outcome.collected {
        events.push(GameEvent::CoinCollected {
            name: name.to_string(),
            position: outcome.position.key(),
            value: value.points(),
            score: outcome.score,
        });
    }

    if outcome.repopulated {
        events.push(GameEvent::CoinsRepopulated { count: batch_size });
    }

    events
}
