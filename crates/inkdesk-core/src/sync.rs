//! WebSocket transport for document collaboration.
//!
//! Defines the JSON wire protocol shared with the relay server and a
//! [`Transport`] trait with a native, a WASM and an in-memory implementation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Messages sent to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join a room
    Join { room: String },
    /// Leave current room
    Leave,
    /// Full text of the shared document after a local edit
    DocumentChange { content: String },
}

impl ClientMessage {
    /// Encode as a JSON text frame.
    pub fn to_json(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Serialization(e.to_string()))
    }
}

/// Messages received from the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirm room join
    Joined {
        room: String,
        peer_count: usize,
        /// Current document of the room, if anyone has written to it
        #[serde(skip_serializing_if = "Option::is_none")]
        document: Option<String>,
    },
    /// Peer joined the room
    PeerJoined { peer_id: String },
    /// Peer left the room
    PeerLeft { peer_id: String },
    /// Another peer replaced the document
    DocumentUpdate { from: String, content: String },
    /// Error message
    Error { message: String },
}

/// Transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Already connected")]
    AlreadyConnected,
    #[error("Not connected")]
    NotConnected,
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl ConnectionState {
    /// State after `event` has been observed.
    pub fn after(self, event: &SyncEvent) -> Self {
        match event {
            SyncEvent::Connected => ConnectionState::Connected,
            SyncEvent::Disconnected => ConnectionState::Disconnected,
            SyncEvent::ConnectFailed { .. } => ConnectionState::Error,
            _ => self,
        }
    }
}

/// Events from a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Connected to server
    Connected,
    /// Disconnected from server
    Disconnected,
    /// The connection could not be established or broke
    ConnectFailed { message: String },
    /// Joined a room
    JoinedRoom { room: String, peer_count: usize, document: Option<String> },
    /// A peer joined the room
    PeerJoined { peer_id: String },
    /// A peer left the room
    PeerLeft { peer_id: String },
    /// Another peer replaced the document
    DocumentUpdate { from: String, content: String },
    /// The server reported an error
    Error { message: String },
}

impl From<ServerMessage> for SyncEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Joined { room, peer_count, document } => {
                SyncEvent::JoinedRoom { room, peer_count, document }
            }
            ServerMessage::PeerJoined { peer_id } => SyncEvent::PeerJoined { peer_id },
            ServerMessage::PeerLeft { peer_id } => SyncEvent::PeerLeft { peer_id },
            ServerMessage::DocumentUpdate { from, content } => SyncEvent::DocumentUpdate { from, content },
            ServerMessage::Error { message } => SyncEvent::Error { message },
        }
    }
}

/// Decode a server text frame. Unparseable frames are logged and dropped.
pub fn parse_server_message(text: &str) -> Option<SyncEvent> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(msg) => Some(msg.into()),
        Err(e) => {
            log::warn!("Failed to parse server message: {} ({})", preview(text), e);
            None
        }
    }
}

/// First 100 characters of a frame, for logs.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(100) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// A bidirectional text channel to the collaboration endpoint.
///
/// Events arrive asynchronously and are buffered until polled.
pub trait Transport {
    /// Start connecting. Completion is reported through `poll_events`.
    fn connect(&mut self, url: &str) -> Result<(), SyncError>;

    /// Close the connection.
    fn disconnect(&mut self);

    /// Send a text frame.
    fn send(&mut self, msg: &str) -> Result<(), SyncError>;

    /// Drain pending events (non-blocking).
    fn poll_events(&mut self) -> Vec<SyncEvent>;

    /// Get current connection state.
    fn state(&self) -> ConnectionState;

    /// Check if connected.
    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}

// ============================================================================
// In-memory transport
// ============================================================================

/// In-process transport for tests and offline use.
///
/// Records every frame sent and delivers events queued with
/// [`MemoryTransport::push_event`] on the next poll.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: ConnectionState,
    url: Option<String>,
    sent: Vec<String>,
    pending: Vec<SyncEvent>,
    /// When set, `connect` reports this failure instead of connecting.
    fail_with: Option<String>,
}

impl MemoryTransport {
    /// Create a transport whose connections succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose connection attempts fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// URL passed to the last `connect`.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Queue an event for the next poll.
    pub fn push_event(&mut self, event: SyncEvent) {
        self.pending.push(event);
    }

    /// Queue a server message, going through the same decoding as a socket.
    pub fn push_server_message(&mut self, msg: &ServerMessage) {
        if let Some(event) = serde_json::to_string(msg)
            .ok()
            .and_then(|json| parse_server_message(&json))
        {
            self.pending.push(event);
        }
    }

    /// Frames sent so far.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }

    /// Frames sent so far, decoded.
    pub fn sent_messages(&self) -> Vec<ClientMessage> {
        self.sent
            .iter()
            .filter_map(|json| serde_json::from_str(json).ok())
            .collect()
    }

    /// Take and clear the sent frames.
    pub fn take_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self, url: &str) -> Result<(), SyncError> {
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            return Err(SyncError::AlreadyConnected);
        }
        self.url = Some(url.to_string());
        self.state = ConnectionState::Connecting;
        let event = match &self.fail_with {
            Some(message) => SyncEvent::ConnectFailed { message: message.clone() },
            None => SyncEvent::Connected,
        };
        self.pending.push(event);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.pending.clear();
    }

    fn send(&mut self, msg: &str) -> Result<(), SyncError> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                self.sent.push(msg.to_string());
                Ok(())
            }
            ConnectionState::Disconnected | ConnectionState::Error => Err(SyncError::NotConnected),
        }
    }

    fn poll_events(&mut self) -> Vec<SyncEvent> {
        let events = std::mem::take(&mut self.pending);
        for event in &events {
            self.state = self.state.after(event);
        }
        events
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

// ============================================================================
// WASM WebSocket Client
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod wasm_client {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

    /// WebSocket client for WASM.
    ///
    /// Events are collected by JS callbacks and must be polled via `poll_events()`.
    pub struct WasmWebSocket {
        ws: Option<WebSocket>,
        state: ConnectionState,
        events: Rc<RefCell<Vec<SyncEvent>>>,
        // Store closures to prevent them from being dropped
        _on_open: Option<Closure<dyn Fn()>>,
        _on_message: Option<Closure<dyn Fn(MessageEvent)>>,
        _on_close: Option<Closure<dyn Fn(CloseEvent)>>,
        _on_error: Option<Closure<dyn Fn(ErrorEvent)>>,
    }

    impl WasmWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                ws: None,
                state: ConnectionState::Disconnected,
                events: Rc::new(RefCell::new(Vec::new())),
                _on_open: None,
                _on_message: None,
                _on_close: None,
                _on_error: None,
            }
        }
    }

    impl Default for WasmWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for WasmWebSocket {
        fn connect(&mut self, url: &str) -> Result<(), SyncError> {
            if self.ws.is_some() {
                return Err(SyncError::AlreadyConnected);
            }

            let ws = WebSocket::new(url).map_err(|e| SyncError::InvalidUrl(format!("{:?}", e)))?;
            self.state = ConnectionState::Connecting;

            let events_open = self.events.clone();
            let on_open = Closure::wrap(Box::new(move || {
                events_open.borrow_mut().push(SyncEvent::Connected);
            }) as Box<dyn Fn()>);
            ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

            let events_msg = self.events.clone();
            let on_message = Closure::wrap(Box::new(move |e: MessageEvent| {
                if let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() {
                    let text: String = txt.into();
                    if let Some(event) = parse_server_message(&text) {
                        events_msg.borrow_mut().push(event);
                    }
                }
            }) as Box<dyn Fn(MessageEvent)>);
            ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

            let events_close = self.events.clone();
            let on_close = Closure::wrap(Box::new(move |_e: CloseEvent| {
                events_close.borrow_mut().push(SyncEvent::Disconnected);
            }) as Box<dyn Fn(CloseEvent)>);
            ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

            let events_err = self.events.clone();
            let on_error = Closure::wrap(Box::new(move |_e: ErrorEvent| {
                events_err.borrow_mut().push(SyncEvent::ConnectFailed {
                    message: "WebSocket error".to_string(),
                });
            }) as Box<dyn Fn(ErrorEvent)>);
            ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

            self.ws = Some(ws);
            self._on_open = Some(on_open);
            self._on_message = Some(on_message);
            self._on_close = Some(on_close);
            self._on_error = Some(on_error);

            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(ws) = self.ws.take() {
                let _ = ws.close();
            }
            self.state = ConnectionState::Disconnected;
            self._on_open = None;
            self._on_message = None;
            self._on_close = None;
            self._on_error = None;
        }

        fn send(&mut self, msg: &str) -> Result<(), SyncError> {
            match self.ws {
                Some(ref ws) => ws
                    .send_with_str(msg)
                    .map_err(|e| SyncError::Send(format!("{:?}", e))),
                None => Err(SyncError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            let events = std::mem::take(&mut *self.events.borrow_mut());
            for event in &events {
                self.state = self.state.after(event);
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_client::WasmWebSocket;

// ============================================================================
// Native WebSocket Client
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
mod native_client {
    use super::*;
    use std::net::TcpStream;
    use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;
    use tungstenite::stream::MaybeTlsStream;
    use tungstenite::{connect, Message, WebSocket};
    use url::Url;

    /// Commands sent to the WebSocket thread.
    enum WsCommand {
        Send(String),
        Close,
    }

    /// Check that `url` is a `ws://` or `wss://` URL.
    pub fn validate_url(url: &str) -> Result<Url, SyncError> {
        let parsed = Url::parse(url).map_err(|e| SyncError::InvalidUrl(e.to_string()))?;
        match parsed.scheme() {
            "ws" | "wss" => Ok(parsed),
            other => Err(SyncError::InvalidUrl(format!("unsupported scheme '{}'", other))),
        }
    }

    /// WebSocket client for native platforms.
    ///
    /// Uses a background thread for non-blocking operation.
    pub struct NativeWebSocket {
        state: ConnectionState,
        /// Channel to send commands to the WebSocket thread.
        cmd_tx: Option<Sender<WsCommand>>,
        /// Channel to receive events from the WebSocket thread.
        event_rx: Option<Receiver<SyncEvent>>,
        /// Handle to the WebSocket thread.
        _thread: Option<JoinHandle<()>>,
    }

    impl NativeWebSocket {
        /// Create a new disconnected WebSocket client.
        pub fn new() -> Self {
            Self {
                state: ConnectionState::Disconnected,
                cmd_tx: None,
                event_rx: None,
                _thread: None,
            }
        }
    }

    impl Default for NativeWebSocket {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Drop for NativeWebSocket {
        fn drop(&mut self) {
            self.disconnect();
        }
    }

    impl Transport for NativeWebSocket {
        fn connect(&mut self, url: &str) -> Result<(), SyncError> {
            if self.cmd_tx.is_some() {
                return Err(SyncError::AlreadyConnected);
            }
            let url = validate_url(url)?;

            self.state = ConnectionState::Connecting;

            let (cmd_tx, cmd_rx) = channel::<WsCommand>();
            let (event_tx, event_rx) = channel::<SyncEvent>();

            let handle = thread::spawn(move || {
                log::info!("WebSocket thread: connecting to {}", url);
                match connect(url.as_str()) {
                    Ok((socket, response)) => {
                        log::info!("WebSocket connected, status: {}", response.status());
                        let _ = event_tx.send(SyncEvent::Connected);
                        run_socket(socket, &cmd_rx, &event_tx);
                        log::info!("WebSocket thread exiting");
                        let _ = event_tx.send(SyncEvent::Disconnected);
                    }
                    Err(e) => {
                        log::error!("WebSocket connection failed: {}", e);
                        let _ = event_tx.send(SyncEvent::ConnectFailed {
                            message: format!("Connection failed: {}", e),
                        });
                    }
                }
            });

            self.cmd_tx = Some(cmd_tx);
            self.event_rx = Some(event_rx);
            self._thread = Some(handle);

            Ok(())
        }

        fn disconnect(&mut self) {
            if let Some(tx) = self.cmd_tx.take() {
                let _ = tx.send(WsCommand::Close);
            }
            self.event_rx = None;
            self._thread = None;
            self.state = ConnectionState::Disconnected;
        }

        fn send(&mut self, msg: &str) -> Result<(), SyncError> {
            match self.cmd_tx {
                Some(ref tx) => tx
                    .send(WsCommand::Send(msg.to_string()))
                    .map_err(|e| SyncError::Send(e.to_string())),
                None => Err(SyncError::NotConnected),
            }
        }

        fn poll_events(&mut self) -> Vec<SyncEvent> {
            let mut events = Vec::new();
            if let Some(ref rx) = self.event_rx {
                while let Ok(event) = rx.try_recv() {
                    self.state = self.state.after(&event);
                    events.push(event);
                }
            }
            events
        }

        fn state(&self) -> ConnectionState {
            self.state
        }
    }

    /// Pump commands out and frames in until either side closes.
    fn run_socket(
        mut socket: WebSocket<MaybeTlsStream<TcpStream>>,
        cmd_rx: &Receiver<WsCommand>,
        event_tx: &Sender<SyncEvent>,
    ) {
        // A short read timeout keeps the loop responsive to outgoing commands.
        if let MaybeTlsStream::Plain(tcp) = socket.get_mut() {
            let _ = tcp.set_read_timeout(Some(Duration::from_millis(50)));
            let _ = tcp.set_write_timeout(Some(Duration::from_secs(5)));
        } else {
            log::debug!("TLS or other stream - using default timeout handling");
        }

        loop {
            match cmd_rx.try_recv() {
                Ok(WsCommand::Send(msg)) => {
                    log::debug!("WebSocket sending: {}", preview(&msg));
                    if let Err(e) = socket.send(Message::Text(msg)) {
                        log::error!("WebSocket send error: {}", e);
                        break;
                    }
                }
                Ok(WsCommand::Close) => {
                    log::info!("WebSocket close requested");
                    let _ = socket.close(None);
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    log::info!("WebSocket command channel disconnected");
                    break;
                }
                Err(TryRecvError::Empty) => {}
            }

            match socket.read() {
                Ok(Message::Text(txt)) => {
                    log::debug!("WebSocket received: {}", preview(&txt));
                    if let Some(event) = parse_server_message(&txt) {
                        let _ = event_tx.send(event);
                    }
                }
                Ok(Message::Ping(data)) => {
                    let _ = socket.send(Message::Pong(data));
                }
                Ok(Message::Close(_)) => {
                    log::info!("WebSocket received close frame");
                    break;
                }
                Ok(_) => {}
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => {
                    log::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use native_client::{validate_url, NativeWebSocket};

// ============================================================================
// Platform type alias
// ============================================================================

/// Platform-specific WebSocket transport type.
#[cfg(target_arch = "wasm32")]
pub type PlatformTransport = WasmWebSocket;

#[cfg(not(target_arch = "wasm32"))]
pub type PlatformTransport = NativeWebSocket;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_serialize() {
        let msg = ClientMessage::DocumentChange { content: "hi".to_string() };
        assert_eq!(msg.to_json().unwrap(), r#"{"type":"document_change","content":"hi"}"#);

        let join = ClientMessage::Join { room: "test-room".to_string() };
        let json = join.to_json().unwrap();
        assert!(json.contains("\"join\""));
        assert!(json.contains("test-room"));
    }

    #[test]
    fn test_server_message_deserialize() {
        let json = r#"{"type":"joined","room":"test","peer_count":2}"#;
        match parse_server_message(json) {
            Some(SyncEvent::JoinedRoom { room, peer_count, document }) => {
                assert_eq!(room, "test");
                assert_eq!(peer_count, 2);
                assert!(document.is_none());
            }
            other => panic!("Wrong event: {:?}", other),
        }

        let json = r#"{"type":"document_update","from":"p1","content":"abc"}"#;
        assert_eq!(
            parse_server_message(json),
            Some(SyncEvent::DocumentUpdate { from: "p1".into(), content: "abc".into() })
        );
    }

    #[test]
    fn test_unparseable_frame_is_dropped() {
        assert_eq!(parse_server_message("{not json"), None);
        assert_eq!(parse_server_message(r#"{"type":"mystery"}"#), None);
    }

    #[test]
    fn test_preview_is_char_safe() {
        let long = "é".repeat(150);
        assert_eq!(preview(&long).chars().count(), 100);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_state_transitions() {
        let state = ConnectionState::Connecting;
        assert_eq!(state.after(&SyncEvent::Connected), ConnectionState::Connected);
        assert_eq!(
            state.after(&SyncEvent::ConnectFailed { message: "x".into() }),
            ConnectionState::Error
        );
        assert_eq!(
            ConnectionState::Connected.after(&SyncEvent::PeerJoined { peer_id: "p".into() }),
            ConnectionState::Connected
        );
    }

    #[test]
    fn test_memory_transport_lifecycle() {
        let mut transport = MemoryTransport::new();
        assert!(matches!(transport.send("x"), Err(SyncError::NotConnected)));

        transport.connect("ws://test/ws").unwrap();
        assert_eq!(transport.state(), ConnectionState::Connecting);
        assert!(matches!(transport.connect("ws://test/ws"), Err(SyncError::AlreadyConnected)));

        assert_eq!(transport.poll_events(), vec![SyncEvent::Connected]);
        assert!(transport.is_connected());

        transport.send("frame").unwrap();
        assert_eq!(transport.take_sent(), vec!["frame".to_string()]);
        assert!(transport.sent().is_empty());

        transport.disconnect();
        assert!(matches!(transport.send("x"), Err(SyncError::NotConnected)));
    }

    #[test]
    fn test_memory_transport_failure() {
        let mut transport = MemoryTransport::failing("refused");
        transport.connect("ws://test/ws").unwrap();
        assert_eq!(
            transport.poll_events(),
            vec![SyncEvent::ConnectFailed { message: "refused".into() }]
        );
        assert_eq!(transport.state(), ConnectionState::Error);
        assert!(transport.send("x").is_err());
    }

    #[test]
    fn test_memory_transport_decodes_server_messages() {
        let mut transport = MemoryTransport::new();
        transport.push_server_message(&ServerMessage::PeerLeft { peer_id: "p9".into() });
        assert_eq!(transport.poll_events(), vec![SyncEvent::PeerLeft { peer_id: "p9".into() }]);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_validate_url() {
        assert!(validate_url("ws://localhost:3030/ws").is_ok());
        assert!(validate_url("wss://example.com/ws").is_ok());
        assert!(matches!(validate_url("http://localhost"), Err(SyncError::InvalidUrl(_))));
        assert!(matches!(validate_url("not a url"), Err(SyncError::InvalidUrl(_))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_send_before_connect_fails() {
        let mut ws = NativeWebSocket::new();
        assert!(matches!(ws.send("x"), Err(SyncError::NotConnected)));
        assert!(matches!(ws.connect("ftp://nope"), Err(SyncError::InvalidUrl(_))));
        assert_eq!(ws.state(), ConnectionState::Disconnected);
    }
}
