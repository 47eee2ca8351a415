//! The workspace: one operator, three editing surfaces, three file lists.
//!
//! Operator actions come in through `Workspace` methods, run to completion and
//! leave the state ready to render. Remote text arrives separately through
//! [`Workspace::pump_sync`] and overwrites whatever the text surface holds.

use crate::collaboration::SyncClient;
use crate::config::WorkspaceConfig;
use crate::files::{FileId, FileKind, FileRegistry, SavedFile};
use crate::input::PointerEvent;
use crate::spreadsheet::{Grid, GridError};
use crate::sync::{SyncError, Transport};
use crate::video_call::{meeting_url, LinkOpener};
use crate::whiteboard::{RenderTarget, StrokeColor, WhiteboardSurface};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workspace errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("File not found: {0}")]
    FileNotFound(FileId),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Please enter a valid Meeting ID.")]
    InvalidMeetingId,
}

/// What the main pane shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Text,
    Grid,
    Whiteboard,
    ActiveList,
    FavoritesList,
    RecycleList,
}

impl Mode {
    /// The editing surface for this mode; `None` for the file lists.
    pub fn surface(self) -> Option<FileKind> {
        match self {
            Mode::Text => Some(FileKind::Text),
            Mode::Grid => Some(FileKind::Grid),
            Mode::Whiteboard => Some(FileKind::Whiteboard),
            Mode::ActiveList | Mode::FavoritesList | Mode::RecycleList => None,
        }
    }

    /// Get display name for this mode.
    pub fn name(self) -> &'static str {
        match self {
            Mode::Text => "Text",
            Mode::Grid => "Spreadsheet",
            Mode::Whiteboard => "Whiteboard",
            Mode::ActiveList => "Saved Files",
            Mode::FavoritesList => "Favorites",
            Mode::RecycleList => "Recycle Bin",
        }
    }
}

impl From<FileKind> for Mode {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Text => Mode::Text,
            FileKind::Grid => Mode::Grid,
            FileKind::Whiteboard => Mode::Whiteboard,
        }
    }
}

/// Action offered on a file card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardAction {
    Favorite,
    Unfavorite,
    Open,
    Delete,
    Restore,
}

/// One entry of a file list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCard {
    pub id: FileId,
    pub name: String,
    pub kind: FileKind,
    pub favorite: bool,
    pub actions: Vec<CardAction>,
}

/// Orchestrates the surfaces, the file registry and the sync client.
pub struct Workspace<T: Transport> {
    mode: Mode,
    editor_visible: bool,
    text: String,
    grid: Grid,
    whiteboard: WhiteboardSurface,
    files: FileRegistry,
    sync: SyncClient<T>,
    server_url: String,
}

impl<T: Transport> Workspace<T> {
    /// Create a workspace around `transport`. The channel is not opened yet.
    pub fn new(transport: T, config: &WorkspaceConfig) -> Self {
        let mut whiteboard = WhiteboardSurface::new();
        whiteboard.set_width(config.stroke_width);
        Self {
            mode: Mode::Text,
            editor_visible: false,
            text: String::new(),
            grid: Grid::new(),
            whiteboard,
            files: FileRegistry::new(),
            sync: SyncClient::new(transport, config.room.clone()),
            server_url: config.server_url.clone(),
        }
    }

    // --- Connection lifecycle ---

    /// Open the collaboration channel. Called once per workspace.
    pub fn connect(&mut self) -> Result<(), SyncError> {
        self.sync.open(&self.server_url)
    }

    /// Close the collaboration channel.
    pub fn disconnect(&mut self) {
        self.sync.close();
    }

    /// The view was mounted: start receiving remote text and errors.
    pub fn mount(&mut self) {
        self.sync.subscribe();
    }

    /// The view was torn down: stop receiving remote text and errors.
    pub fn unmount(&mut self) {
        self.sync.unsubscribe();
    }

    /// Apply inbound traffic. Each remote value replaces the local text.
    ///
    /// Returns how many remote values were applied.
    pub fn pump_sync(&mut self) -> usize {
        let updates = self.sync.poll();
        let applied = updates.len();
        for update in updates {
            self.text = update.content;
        }
        applied
    }

    /// Connect error to show the operator, if any.
    pub fn connection_error(&self) -> Option<&str> {
        self.sync.error()
    }

    pub fn sync(&self) -> &SyncClient<T> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncClient<T> {
        &mut self.sync
    }

    // --- Navigation ---

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch what the main pane shows. No surface loses its state.
    pub fn switch_mode(&mut self, mode: Mode) {
        log::debug!("Showing {}", mode.name());
        self.mode = mode;
    }

    /// Editing surface currently shown, if any.
    pub fn visible_surface(&self) -> Option<FileKind> {
        self.mode.surface()
    }

    pub fn is_editor_visible(&self) -> bool {
        self.editor_visible
    }

    /// Blank the current surface and show the editor.
    ///
    /// The whiteboard has nothing to blank.
    pub fn create_new(&mut self) {
        match self.mode {
            Mode::Text => self.text.clear(),
            Mode::Grid => self.grid.reset(),
            _ => {}
        }
        self.editor_visible = true;
    }

    /// Hide the editor, keeping every surface as it is.
    pub fn close_editor(&mut self) {
        self.editor_visible = false;
    }

    // --- Text surface ---

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text after a local edit and mirror it to peers.
    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if let Err(e) = self.sync.send_local_change(&self.text) {
            log::debug!("Local change not sent: {}", e);
        }
    }

    // --- Grid surface ---

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<(), WorkspaceError> {
        Ok(self.grid.set_cell(row, col, value)?)
    }

    pub fn add_row(&mut self) -> Result<(), WorkspaceError> {
        Ok(self.grid.add_row()?)
    }

    pub fn add_column(&mut self) {
        self.grid.add_column();
    }

    // --- Whiteboard surface ---

    pub fn whiteboard(&self) -> &WhiteboardSurface {
        &self.whiteboard
    }

    pub fn handle_pointer(&mut self, event: PointerEvent, target: &mut dyn RenderTarget) {
        self.whiteboard.handle_pointer(event, target);
    }

    pub fn set_stroke_color(&mut self, color: StrokeColor) {
        self.whiteboard.set_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.whiteboard.set_width(width);
    }

    // --- Files ---

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// Save the current surface under `name` (the name prompt's answer).
    ///
    /// Declines when the prompt was cancelled or left empty, and when a file
    /// list is showing instead of a surface.
    pub fn save(&mut self, name: Option<&str>) -> Option<FileId> {
        let kind = self.mode.surface()?;
        let content = match kind {
            FileKind::Text => self.text.clone(),
            FileKind::Grid => match self.grid.to_json() {
                Ok(json) => json,
                Err(e) => {
                    log::error!("Failed to serialize grid: {}", e);
                    return None;
                }
            },
            FileKind::Whiteboard => String::new(),
        };
        self.files.save(name, content, kind)
    }

    pub fn delete_file(&mut self, id: FileId) -> bool {
        self.files.delete(id)
    }

    pub fn restore_file(&mut self, id: FileId) -> bool {
        self.files.restore(id)
    }

    pub fn toggle_favorite(&mut self, id: FileId) -> Option<bool> {
        self.files.toggle_favorite(id)
    }

    pub fn purge_file(&mut self, id: FileId) -> Option<SavedFile> {
        self.files.purge(id)
    }

    /// Load a saved file into its surface and show the editor.
    ///
    /// List membership is unchanged. Opening text does not broadcast it.
    pub fn open_file(&mut self, id: FileId) -> Result<(), WorkspaceError> {
        let file = self.files.get(id).ok_or(WorkspaceError::FileNotFound(id))?;
        match file.kind {
            FileKind::Text => self.text = file.content.clone(),
            FileKind::Grid => self.grid = Grid::from_json(&file.content)?,
            FileKind::Whiteboard => {}
        }
        self.mode = file.kind.into();
        self.editor_visible = true;
        Ok(())
    }

    /// Cards for the file list being shown, or `None` on an editing surface.
    pub fn listing(&self) -> Option<Vec<FileCard>> {
        let files: Vec<&SavedFile> = match self.mode {
            Mode::ActiveList => self.files.active().collect(),
            Mode::FavoritesList => self.files.favorites().collect(),
            Mode::RecycleList => self.files.recycled().collect(),
            Mode::Text | Mode::Grid | Mode::Whiteboard => return None,
        };
        let cards = files
            .into_iter()
            .map(|file| {
                let favorite = self.files.is_favorite(file.id());
                let actions = match self.mode {
                    Mode::ActiveList => vec![
                        if favorite { CardAction::Unfavorite } else { CardAction::Favorite },
                        CardAction::Open,
                        CardAction::Delete,
                    ],
                    Mode::FavoritesList => vec![CardAction::Unfavorite, CardAction::Open],
                    _ => vec![CardAction::Restore],
                };
                FileCard {
                    id: file.id(),
                    name: file.name.clone(),
                    kind: file.kind,
                    favorite,
                    actions,
                }
            })
            .collect();
        Some(cards)
    }

    /// Run a card action against a file.
    pub fn apply_card_action(&mut self, id: FileId, action: CardAction) -> Result<(), WorkspaceError> {
        match action {
            CardAction::Favorite | CardAction::Unfavorite => {
                self.toggle_favorite(id).ok_or(WorkspaceError::FileNotFound(id))?;
            }
            CardAction::Open => self.open_file(id)?,
            CardAction::Delete => {
                self.delete_file(id);
            }
            CardAction::Restore => {
                self.restore_file(id);
            }
        }
        Ok(())
    }

    // --- Video call ---

    /// Open the meeting `meeting_id` through `opener`.
    pub fn join_video_call(&self, meeting_id: &str, opener: &mut dyn LinkOpener) -> Result<(), WorkspaceError> {
        let url = meeting_url(meeting_id).ok_or(WorkspaceError::InvalidMeetingId)?;
        log::info!("Joining video call: {}", url);
        opener.open_link(&url);
        Ok(())
    }
}
