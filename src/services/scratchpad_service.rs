use tracing::error;

use super::storage_service::{self, KeyValueStore};
use crate::models::ScratchpadItem;

/// Quick throwaway notes, newest first, persisted on every change.
pub struct Scratchpad<S: KeyValueStore> {
    store: S,
    items: Vec<ScratchpadItem>,
}

impl<S: KeyValueStore> Scratchpad<S> {
    pub fn open(store: S) -> Self {
        let items = storage_service::load_scratchpad(&store);
        Self { store, items }
    }

    pub fn items(&self) -> &[ScratchpadItem] {
        &self.items
    }

    /// Adds an item unless `content` is blank.
    pub fn add(&mut self, content: &str) -> Option<ScratchpadItem> {
        if content.trim().is_empty() {
            return None;
        }
        let item = ScratchpadItem::new(content);
        self.items.insert(0, item.clone());
        self.persist();
        Some(item)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        let removed = self.items.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    fn persist(&self) {
        if let Err(e) = storage_service::save_scratchpad(&self.store, &self.items) {
            error!("Failed to save scratchpad: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage_service::{FileStore, MemoryStore};

    #[test]
    fn newest_first_and_blank_ignored() {
        let mut pad = Scratchpad::open(MemoryStore::new());
        pad.add("first");
        assert!(pad.add("   ").is_none());
        pad.add("second");
        let contents: Vec<&str> = pad.items().iter().map(|i| i.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);
    }

    #[test]
    fn changes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let mut pad = Scratchpad::open(FileStore::new(dir.path()));
        let keep = pad.add("keep").unwrap();
        let drop_me = pad.add("drop").unwrap();
        assert!(pad.remove(&drop_me.id));
        assert!(!pad.remove("unknown"));

        let reopened = Scratchpad::open(FileStore::new(dir.path()));
        assert_eq!(reopened.items(), &[keep]);
    }
}
