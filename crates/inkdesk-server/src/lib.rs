//! InkDesk relay server.
//!
//! Clients join a room, then every `document_change` one of them sends is kept
//! as the room's current document and relayed to the other peers in the room.
//!
//! ## Protocol
//!
//! Messages are JSON text frames:
//! ```json
//! { "type": "join", "room": "room-id" }
//! { "type": "document_change", "content": "full text" }
//! { "type": "leave" }
//! ```

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use inkdesk_core::sync::{ClientMessage, ServerMessage};
use std::{
    collections::HashSet,
    net::{AddrParseError, SocketAddr},
    sync::Arc,
};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 256;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3030";
/// Environment variable overriding the listen address.
pub const BIND_ENV: &str = "INKDESK_BIND";

/// Server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl ServerConfig {
    /// Read `INKDESK_BIND`, falling back to `0.0.0.0:3030`.
    pub fn from_env() -> Result<Self, AddrParseError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AddrParseError> {
        let bind = lookup(BIND_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        Ok(Self { bind: bind.parse()? })
    }
}

type RoomMessage = (String, ServerMessage);

/// Room state
struct Room {
    /// Broadcast channel for this room
    tx: broadcast::Sender<RoomMessage>,
    /// Connected peer IDs
    peers: HashSet<String>,
    /// Latest document (for new joiners)
    document: Option<String>,
}

impl Room {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: HashSet::new(),
            document: None,
        }
    }
}

/// Shared application state
pub struct AppState {
    /// Active rooms
    rooms: DashMap<String, Room>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Number of rooms with at least one peer.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Latest document of a room.
    pub fn document(&self, room_id: &str) -> Option<String> {
        self.rooms.get(room_id).and_then(|room| room.document.clone())
    }

    /// Number of peers in a room.
    pub fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    /// Add peer to room
    fn join_room(&self, room_id: &str, peer_id: &str) -> (broadcast::Receiver<RoomMessage>, Option<String>, usize) {
        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);
        room.peers.insert(peer_id.to_string());
        let rx = room.tx.subscribe();
        (rx, room.document.clone(), room.peers.len())
    }

    /// Remove peer from room
    fn leave_room(&self, room_id: &str, peer_id: &str) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.peers.remove(peer_id);
            // Clean up empty rooms
            if room.peers.is_empty() {
                drop(room);
                self.rooms.remove(room_id);
            }
        }
    }

    /// Replace the room's document
    fn update_document(&self, room_id: &str, content: String) {
        if let Some(mut room) = self.rooms.get_mut(room_id) {
            room.document = Some(content);
        }
    }

    /// Broadcast message to room
    fn broadcast(&self, room_id: &str, from: &str, msg: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            let _ = room.tx.send((from.to_string(), msg));
        }
    }
}

/// One client's view of the server: its id and the room it is in.
struct Session {
    peer_id: String,
    room: Option<String>,
    room_rx: Option<broadcast::Receiver<RoomMessage>>,
}

impl Session {
    fn new() -> Self {
        Self {
            peer_id: Uuid::new_v4().to_string(),
            room: None,
            room_rx: None,
        }
    }

    /// Apply a client message. Returns the reply for this client, if any.
    fn handle(&mut self, state: &AppState, msg: ClientMessage) -> Option<ServerMessage> {
        match msg {
            ClientMessage::Join { room } if self.room.as_deref() == Some(room.as_str()) => {
                // Already a member: re-confirm without dropping the room.
                let peer_count = state.peer_count(&room);
                let document = state.document(&room);
                Some(ServerMessage::Joined { room, peer_count, document })
            }
            ClientMessage::Join { room } => {
                self.leave(state);

                let (rx, document, peer_count) = state.join_room(&room, &self.peer_id);
                self.room_rx = Some(rx);
                self.room = Some(room.clone());

                state.broadcast(&room, &self.peer_id, ServerMessage::PeerJoined {
                    peer_id: self.peer_id.clone(),
                });
                info!("Peer {} joined room {}", self.peer_id, room);

                Some(ServerMessage::Joined { room, peer_count, document })
            }
            ClientMessage::Leave => {
                self.leave(state);
                None
            }
            ClientMessage::DocumentChange { content } => {
                self.change(state, content);
                None
            }
        }
    }

    /// Store and relay a new document value.
    fn change(&self, state: &AppState, content: String) {
        match self.room {
            Some(ref room) => {
                debug!("Document change from {} in {}: {} bytes", self.peer_id, room, content.len());
                state.update_document(room, content.clone());
                state.broadcast(room, &self.peer_id, ServerMessage::DocumentUpdate {
                    from: self.peer_id.clone(),
                    content,
                });
            }
            None => debug!("Dropping change from {}: not in a room", self.peer_id),
        }
    }

    fn leave(&mut self, state: &AppState) {
        if let Some(room) = self.room.take() {
            state.leave_room(&room, &self.peer_id);
            state.broadcast(&room, &self.peer_id, ServerMessage::PeerLeft {
                peer_id: self.peer_id.clone(),
            });
            info!("Peer {} left room {}", self.peer_id, room);
        }
        self.room_rx = None;
    }

    /// Next message relayed from another peer in the room.
    async fn next_relayed(&mut self) -> Option<ServerMessage> {
        loop {
            let rx = match self.room_rx {
                Some(ref mut rx) => rx,
                // No room joined, just wait forever
                None => return std::future::pending().await,
            };
            match rx.recv().await {
                // Don't echo back to sender
                Ok((from, msg)) if from != self.peer_id => return Some(msg),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Peer {} lagged, skipped {} messages", self.peer_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.room_rx = None;
                }
            }
        }
    }
}

/// Build the router: `/` banner, `/ws` relay, `/health` check.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "InkDesk Relay Server - Connect via WebSocket at /ws"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!("Failed to encode server message: {}", e);
            None
        }
    }
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let mut session = Session::new();
    info!("New connection: {}", session.peer_id);

    let (mut sender, mut receiver) = socket.split();

    loop {
        let reply = tokio::select! {
            // Handle incoming messages from client
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(client_msg) => session.handle(&state, client_msg),
                            Err(e) => {
                                warn!("Invalid message from {}: {}", session.peer_id, e);
                                Some(ServerMessage::Error {
                                    message: format!("Invalid message: {}", e),
                                })
                            }
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        // Binary frames holding UTF-8 are treated as a document change
                        match std::str::from_utf8(&data) {
                            Ok(content) => {
                                session.change(&state, content.to_string());
                                None
                            }
                            Err(_) => Some(ServerMessage::Error {
                                message: "Binary frame is not valid UTF-8".to_string(),
                            }),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => None, // Ignore ping/pong
                    Some(Err(e)) => {
                        warn!("WebSocket error for {}: {}", session.peer_id, e);
                        break;
                    }
                }
            }

            // Handle broadcast messages from room
            msg = session.next_relayed() => msg,
        };

        if let Some(frame) = reply.as_ref().and_then(encode) {
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    }

    // Cleanup on disconnect
    session.leave(&state);
    info!("Connection closed: {}", session.peer_id);
}
