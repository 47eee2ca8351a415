//! Workspace configuration.

use crate::whiteboard::DEFAULT_STROKE_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default collaboration endpoint.
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:3030/ws";
/// Default collaboration room.
pub const DEFAULT_ROOM: &str = "main";

/// Environment variable overriding [`WorkspaceConfig::server_url`].
pub const SERVER_URL_ENV: &str = "INKDESK_SERVER_URL";
/// Environment variable overriding [`WorkspaceConfig::room`].
pub const ROOM_ENV: &str = "INKDESK_ROOM";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// WebSocket URL of the collaboration endpoint.
    pub server_url: String,
    /// Room shared by collaborating clients.
    pub room: String,
    /// Initial whiteboard pen width.
    pub stroke_width: f64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            room: DEFAULT_ROOM.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }
}

impl WorkspaceConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Apply `INKDESK_SERVER_URL` and `INKDESK_ROOM` if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(SERVER_URL_ENV).filter(|v| !v.is_empty()) {
            self.server_url = url;
        }
        if let Some(room) = lookup(ROOM_ENV).filter(|v| !v.is_empty()) {
            self.room = room;
        }
        self
    }
}
