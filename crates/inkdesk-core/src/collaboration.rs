//! Real-time mirroring of the text surface.
//!
//! Every local edit ships the whole text; every remote update replaces the
//! whole text. There is no merge: whichever write is applied last wins.

use crate::sync::{ClientMessage, ConnectionState, SyncError, SyncEvent, Transport};

/// Message shown to the operator when the endpoint is unreachable.
pub const CONNECT_ERROR_MESSAGE: &str = "Failed to connect to the server.";

/// A document value received from the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpdate {
    /// Peer that wrote it, or `None` for the room's stored document on join.
    pub from: Option<String>,
    pub content: String,
}

/// Owns the connection to the collaboration endpoint.
///
/// The transport is injected, so tests can drive a
/// [`MemoryTransport`](crate::sync::MemoryTransport) instead of a socket.
pub struct SyncClient<T: Transport> {
    transport: T,
    /// Room joined once the transport reports a connection.
    room: String,
    /// Room confirmed by the server.
    current_room: Option<String>,
    peer_count: usize,
    /// Whether inbound updates and connect errors reach the workspace.
    subscribed: bool,
    /// Visible "can't sync" indicator. Never cleared automatically.
    error: Option<String>,
}

impl<T: Transport> SyncClient<T> {
    /// Wrap a transport. Nothing is connected until [`SyncClient::open`].
    pub fn new(transport: T, room: impl Into<String>) -> Self {
        Self {
            transport,
            room: room.into(),
            current_room: None,
            peer_count: 0,
            subscribed: false,
            error: None,
        }
    }

    /// Start connecting to `url`. The room is joined once connected.
    pub fn open(&mut self, url: &str) -> Result<(), SyncError> {
        log::info!("Opening collaboration channel to {} (room '{}')", url, self.room);
        self.transport.connect(url).inspect_err(|e| {
            log::error!("Collaboration channel failed to open: {}", e);
            if self.subscribed {
                self.error = Some(CONNECT_ERROR_MESSAGE.to_string());
            }
        })
    }

    /// Leave the room and drop the connection.
    pub fn close(&mut self) {
        if self.current_room.take().is_some() {
            self.send(&ClientMessage::Leave).ok();
        }
        self.transport.disconnect();
        self.peer_count = 0;
    }

    /// Start delivering inbound updates and connect errors.
    pub fn subscribe(&mut self) {
        self.subscribed = true;
    }

    /// Stop delivering inbound updates and connect errors. The connection stays up.
    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
    }

    /// Send the full text after a local edit.
    ///
    /// Nothing is buffered: if the channel is down the change is lost.
    pub fn send_local_change(&mut self, text: &str) -> Result<(), SyncError> {
        if !self.transport.is_connected() {
            return Err(SyncError::NotConnected);
        }
        self.send(&ClientMessage::DocumentChange { content: text.to_string() })
    }

    /// Drain transport events, returning document values to apply in order.
    pub fn poll(&mut self) -> Vec<RemoteUpdate> {
        let mut updates = Vec::new();
        for event in self.transport.poll_events() {
            match event {
                SyncEvent::Connected => {
                    log::info!("Collaboration channel connected");
                    let join = ClientMessage::Join { room: self.room.clone() };
                    if let Err(e) = self.send(&join) {
                        log::warn!("Failed to join room '{}': {}", self.room, e);
                    }
                }
                SyncEvent::Disconnected => {
                    log::info!("Collaboration channel disconnected");
                    self.current_room = None;
                    self.peer_count = 0;
                }
                SyncEvent::ConnectFailed { message } => {
                    log::error!("Collaboration channel error: {}", message);
                    if self.subscribed {
                        self.error = Some(CONNECT_ERROR_MESSAGE.to_string());
                    }
                }
                SyncEvent::JoinedRoom { room, peer_count, document } => {
                    log::info!("Joined room: {} ({} peers)", room, peer_count);
                    self.current_room = Some(room);
                    self.peer_count = peer_count;
                    if let Some(content) = document {
                        self.deliver(&mut updates, None, content);
                    }
                }
                SyncEvent::PeerJoined { peer_id } => {
                    log::info!("Peer joined: {}", peer_id);
                    self.peer_count += 1;
                }
                SyncEvent::PeerLeft { peer_id } => {
                    log::info!("Peer left: {}", peer_id);
                    self.peer_count = self.peer_count.saturating_sub(1);
                }
                SyncEvent::DocumentUpdate { from, content } => {
                    log::debug!("Document update from {}: {} bytes", from, content.len());
                    self.deliver(&mut updates, Some(from), content);
                }
                SyncEvent::Error { message } => {
                    log::warn!("Server error: {}", message);
                }
            }
        }
        updates
    }

    fn deliver(&self, updates: &mut Vec<RemoteUpdate>, from: Option<String>, content: String) {
        if self.subscribed {
            updates.push(RemoteUpdate { from, content });
        } else {
            log::debug!("Dropping document update while unsubscribed");
        }
    }

    fn send(&mut self, msg: &ClientMessage) -> Result<(), SyncError> {
        let json = msg.to_json()?;
        self.transport.send(&json)
    }

    /// Connect error to show the operator, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Dismiss the connect error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn state(&self) -> ConnectionState {
        self.transport.state()
    }

    /// Room confirmed by the server, if joined.
    pub fn current_room(&self) -> Option<&str> {
        self.current_room.as_deref()
    }

    /// Peers in the room as last reported, including this client.
    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
