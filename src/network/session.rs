//! Connection Sessions
//!
//! Tracks every open WebSocket connection and which player, if any,
//! it registered. A connection may register exactly once.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, RwLock};
use uuid::Uuid;

use crate::game::registry::PlayerId;
use crate::network::protocol::ServerMessage;

/// Per-connection registration state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected but no name claimed yet.
    Unregistered,
    /// Bound to a registered player.
    Registered {
        /// Registration sequence number.
        player_id: PlayerId,
        /// Registered name.
        name: String,
    },
}

impl SessionState {
    /// Name bound to this session, if registered.
    pub fn name(&self) -> Option<&str> {
        match self {
            SessionState::Registered { name, .. } => Some(name),
            SessionState::Unregistered => None,
        }
    }
}

/// An open connection.
#[derive(Debug)]
pub struct ConnectedClient {
    /// Connection identifier, for logs.
    pub id: Uuid,
    /// Registration state.
    pub state: SessionState,
    /// Connection time.
    pub connected_at: Instant,
    /// Last inbound message.
    pub last_activity: Instant,
    /// Outbound message queue drained by the writer task.
    pub sender: mpsc::Sender<ServerMessage>,
    /// Fired to end the connection task.
    close_tx: oneshot::Sender<()>,
}

impl ConnectedClient {
    /// Create an unregistered client and the receiver its task awaits for close.
    pub fn new(sender: mpsc::Sender<ServerMessage>) -> (Self, oneshot::Receiver<()>) {
        let now = Instant::now();
        let (close_tx, close_rx) = oneshot::channel();
        let client = Self {
            id: Uuid::new_v4(),
            state: SessionState::Unregistered,
            connected_at: now,
            last_activity: now,
            sender,
            close_tx,
        };
        (client, close_rx)
    }

    /// Time since the last inbound message.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Time since the connection was accepted.
    pub fn connected_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.connected_at)
    }

    /// Tell the connection task to shut down.
    pub fn close(self) {
        // The task may already be gone
        let _ = self.close_tx.send(());
    }
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No connection with that address.
    #[error("Unknown connection {0}")]
    UnknownConnection(SocketAddr),

    /// The connection already registered a player.
    #[error("Connection already registered as {0:?}")]
    AlreadyRegistered(String),
}

// =============================================================================
// CLIENT REGISTRY
// =============================================================================

/// All open connections, keyed by peer address.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<BTreeMap<SocketAddr, ConnectedClient>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection.
    ///
    /// Returns its identifier and the close signal the connection task must
    /// await; the signal fires when the registry evicts the connection.
    pub async fn insert(
        &self,
        addr: SocketAddr,
        sender: mpsc::Sender<ServerMessage>,
    ) -> (Uuid, oneshot::Receiver<()>) {
        let (client, close_rx) = ConnectedClient::new(sender);
        let id = client.id;
        self.clients.write().await.insert(addr, client);
        (id, close_rx)
    }

    /// Forget a connection.
    pub async fn remove(&self, addr: &SocketAddr) -> Option<ConnectedClient> {
        self.clients.write().await.remove(addr)
    }

    /// Record inbound activity.
    pub async fn touch(&self, addr: &SocketAddr) {
        if let Some(client) = self.clients.write().await.get_mut(addr) {
            client.last_activity = Instant::now();
        }
    }

    /// Check whether the connection may still register.
    pub async fn ensure_unregistered(&self, addr: &SocketAddr) -> Result<(), SessionError> {
        let clients = self.clients.read().await;
        let client = clients.get(addr).ok_or(SessionError::UnknownConnection(*addr))?;
        match &client.state {
            SessionState::Unregistered => Ok(()),
            SessionState::Registered { name, .. } => Err(SessionError::AlreadyRegistered(name.clone())),
        }
    }

    /// Bind a connection to the player it registered.
    pub async fn bind(&self, addr: &SocketAddr, player_id: PlayerId, name: &str) -> Result<(), SessionError> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(addr).ok_or(SessionError::UnknownConnection(*addr))?;

        if let SessionState::Registered { name: existing, .. } = &client.state {
            return Err(SessionError::AlreadyRegistered(existing.clone()));
        }

        client.state = SessionState::Registered {
            player_id,
            name: name.to_string(),
        };
        Ok(())
    }

    /// Registration state of a connection.
    pub async fn lookup(&self, addr: &SocketAddr) -> Option<SessionState> {
        self.clients.read().await.get(addr).map(|c| c.state.clone())
    }

    /// Name registered by a connection.
    pub async fn registered_name(&self, addr: &SocketAddr) -> Option<String> {
        self.clients
            .read()
            .await
            .get(addr)
            .and_then(|c| c.state.name().map(str::to_string))
    }

    /// Remove connections idle longer than `timeout`, returning them.
    ///
    /// Callers must [`ConnectedClient::close`] each one.
    pub async fn sweep_idle(&self, timeout: Duration) -> Vec<(SocketAddr, ConnectedClient)> {
        let now = Instant::now();
        let mut clients = self.clients.write().await;

        let stale: Vec<SocketAddr> = clients
            .iter()
            .filter(|(_, c)| c.idle_for(now) > timeout)
            .map(|(addr, _)| *addr)
            .collect();

        stale
            .into_iter()
            .filter_map(|addr| clients.remove(&addr).map(|c| (addr, c)))
            .collect()
    }

    /// Number of open connections.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    /// True when nobody is connected.
    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}
