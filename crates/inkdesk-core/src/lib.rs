//! InkDesk Core Library
//!
//! Platform-agnostic model of the InkDesk workspace: the text, spreadsheet and
//! whiteboard surfaces, saved files, and real-time text mirroring.

pub mod collaboration;
pub mod config;
pub mod files;
pub mod input;
pub mod spreadsheet;
pub mod sync;
pub mod video_call;
pub mod whiteboard;
pub mod workspace;

pub use collaboration::{RemoteUpdate, SyncClient};
pub use config::{ConfigError, WorkspaceConfig};
pub use files::{FileId, FileKind, FileRegistry, SavedFile};
pub use input::{MouseButton, PointerEvent};
pub use spreadsheet::{Grid, GridError};
pub use sync::{ClientMessage, ConnectionState, MemoryTransport, PlatformTransport, ServerMessage, SyncError, SyncEvent, Transport};
pub use video_call::{LinkOpener, meeting_url};
pub use whiteboard::{PointerState, RenderTarget, StrokeColor, StrokeSegment, WhiteboardSurface};
pub use workspace::{CardAction, FileCard, Mode, Workspace, WorkspaceError};
