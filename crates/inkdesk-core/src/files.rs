//! Saved files and their lifecycle: active, recycled, favorite.
//!
//! A file lives in exactly one of the active list or the recycle bin.
//! Favorites is a separate tag that survives moving between the two.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for saved files.
pub type FileId = Uuid;

/// Which surface a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Text,
    Grid,
    Whiteboard,
}

impl FileKind {
    /// Display label.
    pub fn name(self) -> &'static str {
        match self {
            FileKind::Text => "Text",
            FileKind::Grid => "Spreadsheet",
            FileKind::Whiteboard => "Whiteboard",
        }
    }
}

/// A named snapshot of one surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    pub(crate) id: FileId,
    pub name: String,
    pub content: String,
    pub kind: FileKind,
}

impl SavedFile {
    pub fn id(&self) -> FileId {
        self.id
    }
}

/// In-memory store of saved files.
#[derive(Debug, Clone, Default)]
pub struct FileRegistry {
    files: HashMap<FileId, SavedFile>,
    /// Active files in save/restore order.
    active: Vec<FileId>,
    /// Recycled files in delete order.
    recycle: Vec<FileId>,
    /// Favorites in the order they were tagged.
    favorites: Vec<FileId>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a new file at the end of the active list.
    ///
    /// Returns `None` without touching anything when `name` is missing or
    /// empty (the name prompt was cancelled). Duplicate names are allowed.
    pub fn save(&mut self, name: Option<&str>, content: impl Into<String>, kind: FileKind) -> Option<FileId> {
        let name = name.filter(|n| !n.is_empty())?;
        let file = SavedFile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            content: content.into(),
            kind,
        };
        let id = file.id;
        log::debug!("Saved {} file '{}' ({})", kind.name(), file.name, id);
        self.files.insert(id, file);
        self.active.push(id);
        Some(id)
    }

    /// Move an active file to the recycle bin. Favorites are left alone.
    pub fn delete(&mut self, id: FileId) -> bool {
        if !remove_id(&mut self.active, id) {
            return false;
        }
        self.recycle.push(id);
        true
    }

    /// Move a recycled file back to the end of the active list.
    pub fn restore(&mut self, id: FileId) -> bool {
        if !remove_id(&mut self.recycle, id) {
            return false;
        }
        self.active.push(id);
        true
    }

    /// Flip the favorite tag of an active or recycled file.
    ///
    /// Returns the new state, or `None` if the file is unknown.
    pub fn toggle_favorite(&mut self, id: FileId) -> Option<bool> {
        if !self.files.contains_key(&id) {
            return None;
        }
        if remove_id(&mut self.favorites, id) {
            Some(false)
        } else {
            self.favorites.push(id);
            Some(true)
        }
    }

    /// Permanently discard a recycled file, dropping its favorite tag too.
    pub fn purge(&mut self, id: FileId) -> Option<SavedFile> {
        if !remove_id(&mut self.recycle, id) {
            return None;
        }
        remove_id(&mut self.favorites, id);
        self.files.remove(&id)
    }

    /// Get a file by ID.
    pub fn get(&self, id: FileId) -> Option<&SavedFile> {
        self.files.get(&id)
    }

    /// Active files in order.
    pub fn active(&self) -> impl Iterator<Item = &SavedFile> {
        self.active.iter().filter_map(|id| self.files.get(id))
    }

    /// Recycled files in order.
    pub fn recycled(&self) -> impl Iterator<Item = &SavedFile> {
        self.recycle.iter().filter_map(|id| self.files.get(id))
    }

    /// Favorite files in order, whether active or recycled.
    pub fn favorites(&self) -> impl Iterator<Item = &SavedFile> {
        self.favorites.iter().filter_map(|id| self.files.get(id))
    }

    pub fn is_active(&self, id: FileId) -> bool {
        self.active.contains(&id)
    }

    pub fn is_recycled(&self, id: FileId) -> bool {
        self.recycle.contains(&id)
    }

    pub fn is_favorite(&self, id: FileId) -> bool {
        self.favorites.contains(&id)
    }

    /// Number of known files (active plus recycled).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Remove `id` from `list`, reporting whether it was there.
fn remove_id(list: &mut Vec<FileId>, id: FileId) -> bool {
    match list.iter().position(|&other| other == id) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_ids(registry: &FileRegistry) -> Vec<FileId> {
        registry.active().map(SavedFile::id).collect()
    }

    fn recycled_ids(registry: &FileRegistry) -> Vec<FileId> {
        registry.recycled().map(SavedFile::id).collect()
    }

    #[test]
    fn test_save_delete_restore_scenario() {
        let mut registry = FileRegistry::new();
        let id = registry.save(Some("Notes"), "hello", FileKind::Text).unwrap();

        let file = registry.get(id).unwrap();
        assert_eq!(file.name, "Notes");
        assert_eq!(file.content, "hello");
        assert_eq!(file.kind, FileKind::Text);
        assert_eq!(active_ids(&registry), vec![id]);

        assert!(registry.delete(id));
        assert!(active_ids(&registry).is_empty());
        assert_eq!(recycled_ids(&registry), vec![id]);

        assert!(registry.restore(id));
        assert_eq!(active_ids(&registry), vec![id]);
        assert!(recycled_ids(&registry).is_empty());
    }

    #[test]
    fn test_save_without_name_is_noop() {
        let mut registry = FileRegistry::new();
        assert!(registry.save(None, "x", FileKind::Text).is_none());
        assert!(registry.save(Some(""), "x", FileKind::Grid).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_identical_files_stay_distinct() {
        let mut registry = FileRegistry::new();
        let a = registry.save(Some("Same"), "body", FileKind::Text).unwrap();
        let b = registry.save(Some("Same"), "body", FileKind::Text).unwrap();
        assert_ne!(a, b);

        registry.delete(b);
        assert_eq!(active_ids(&registry), vec![a]);
        assert_eq!(recycled_ids(&registry), vec![b]);
    }

    #[test]
    fn test_delete_then_restore_restores_membership() {
        let mut registry = FileRegistry::new();
        let a = registry.save(Some("a"), "", FileKind::Text).unwrap();
        let b = registry.save(Some("b"), "", FileKind::Grid).unwrap();
        let c = registry.save(Some("c"), "", FileKind::Whiteboard).unwrap();
        registry.delete(c);

        let mut active_before = active_ids(&registry);
        let mut recycled_before = recycled_ids(&registry);

        registry.delete(a);
        registry.restore(a);

        let mut active_after = active_ids(&registry);
        let mut recycled_after = recycled_ids(&registry);
        active_before.sort();
        active_after.sort();
        recycled_before.sort();
        recycled_after.sort();
        assert_eq!(active_before, active_after);
        assert_eq!(recycled_before, recycled_after);
        assert!(registry.is_active(b));
    }

    #[test]
    fn test_lifecycle_ops_on_wrong_container_are_noops() {
        let mut registry = FileRegistry::new();
        let id = registry.save(Some("x"), "", FileKind::Text).unwrap();

        assert!(!registry.restore(id));
        assert!(registry.delete(id));
        assert!(!registry.delete(id));

        let unknown = Uuid::new_v4();
        assert!(!registry.delete(unknown));
        assert!(!registry.restore(unknown));
        assert_eq!(registry.toggle_favorite(unknown), None);
        assert!(registry.purge(unknown).is_none());

        assert!(registry.is_recycled(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_toggle_favorite_twice_is_identity() {
        let mut registry = FileRegistry::new();
        let a = registry.save(Some("a"), "", FileKind::Text).unwrap();
        let b = registry.save(Some("b"), "", FileKind::Text).unwrap();
        registry.toggle_favorite(a);
        let before: Vec<_> = registry.favorites().map(SavedFile::id).collect();

        assert_eq!(registry.toggle_favorite(b), Some(true));
        assert_eq!(registry.toggle_favorite(b), Some(false));

        let after: Vec<_> = registry.favorites().map(SavedFile::id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_favorite_survives_delete() {
        let mut registry = FileRegistry::new();
        let id = registry.save(Some("fav"), "", FileKind::Text).unwrap();
        registry.toggle_favorite(id);

        registry.delete(id);

        assert!(registry.is_favorite(id));
        assert!(!registry.is_active(id));
        assert!(registry.is_recycled(id));
    }

    #[test]
    fn test_favorite_while_recycled() {
        let mut registry = FileRegistry::new();
        let id = registry.save(Some("x"), "", FileKind::Text).unwrap();
        registry.delete(id);

        assert_eq!(registry.toggle_favorite(id), Some(true));
        registry.restore(id);
        assert!(registry.is_favorite(id));
    }

    #[test]
    fn test_purge_only_from_recycle_and_clears_favorite() {
        let mut registry = FileRegistry::new();
        let id = registry.save(Some("x"), "data", FileKind::Text).unwrap();
        registry.toggle_favorite(id);

        assert!(registry.purge(id).is_none(), "active files cannot be purged");

        registry.delete(id);
        let purged = registry.purge(id).unwrap();
        assert_eq!(purged.content, "data");
        assert!(registry.is_empty());
        assert_eq!(registry.favorites().count(), 0);
    }
}
