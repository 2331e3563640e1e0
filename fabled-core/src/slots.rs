//! # Save slots
//!
//! Named storage for serialized game states. Blobs are opaque and
//! version-coupled to the interpreter that produced them; nothing here looks
//! inside one beyond recording its size. Slots are addressed per session -
//! each session owns its own store.

use crate::error::{self, Result};
use crate::history::unix_now;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metadata for one saved state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedStateMeta {
    pub slot: String,
    /// Blob size in bytes
    pub size: usize,
    /// Unix seconds when the slot was written
    pub created_at: u64,
}

/// Storage backend trait for save slots
pub trait SlotBackend: Send {
    fn save(&mut self, slot: &str, blob: &[u8]) -> Result<SavedStateMeta>;
    fn load(&self, slot: &str) -> Result<Vec<u8>>;
    fn list(&self) -> Vec<SavedStateMeta>;
    fn delete(&mut self, slot: &str) -> Result<()>;
}

// =============================================================================
// In-memory backend (the default; saves die with the session)
// =============================================================================

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: BTreeMap<String, (SavedStateMeta, Vec<u8>)>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotBackend for MemorySlotStore {
    fn save(&mut self, slot: &str, blob: &[u8]) -> Result<SavedStateMeta> {
        let meta = SavedStateMeta {
            slot: slot.to_string(),
            size: blob.len(),
            created_at: unix_now(),
        };
        self.slots.insert(slot.to_string(), (meta.clone(), blob.to_vec()));
        Ok(meta)
    }

    fn load(&self, slot: &str) -> Result<Vec<u8>> {
        self.slots
            .get(slot)
            .map(|(_, blob)| blob.clone())
            .ok_or_else(|| error::invalid_slot(slot).with_operation("slots::load"))
    }

    fn list(&self) -> Vec<SavedStateMeta> {
        self.slots.values().map(|(meta, _)| meta.clone()).collect()
    }

    fn delete(&mut self, slot: &str) -> Result<()> {
        self.slots
            .remove(slot)
            .map(|_| ())
            .ok_or_else(|| error::invalid_slot(slot).with_operation("slots::delete"))
    }
}

// =============================================================================
// File-backed backend (persists saves under one directory per session)
// =============================================================================

pub struct FileSlotStore {
    base_path: PathBuf,
}

impl FileSlotStore {
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)
            .map_err(|e| error::io_error(format!("failed to create save dir: {}", e)))?;
        Ok(Self { base_path })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        // Sanitize slot name for use as a filename
        let safe = slot.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.base_path.join(format!("{}.sav", safe))
    }

    fn meta_path(&self, slot: &str) -> PathBuf {
        self.slot_path(slot).with_extension("meta.json")
    }
}

impl SlotBackend for FileSlotStore {
    fn save(&mut self, slot: &str, blob: &[u8]) -> Result<SavedStateMeta> {
        let meta = SavedStateMeta {
            slot: slot.to_string(),
            size: blob.len(),
            created_at: unix_now(),
        };
        std::fs::write(self.slot_path(slot), blob)
            .map_err(|e| error::io_error(format!("failed to write slot '{}': {}", slot, e)))?;
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| error::serialization_error(e.to_string()))?;
        std::fs::write(self.meta_path(slot), meta_json)
            .map_err(|e| error::io_error(format!("failed to write slot meta '{}': {}", slot, e)))?;
        Ok(meta)
    }

    fn load(&self, slot: &str) -> Result<Vec<u8>> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(error::invalid_slot(slot).with_operation("slots::load"));
        }
        std::fs::read(&path)
            .map_err(|e| error::io_error(format!("failed to read slot '{}': {}", slot, e)))
    }

    fn list(&self) -> Vec<SavedStateMeta> {
        let Ok(entries) = std::fs::read_dir(&self.base_path) else {
            return Vec::new();
        };
        let mut slots: Vec<SavedStateMeta> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
            .filter_map(|e| {
                let content = std::fs::read_to_string(e.path()).ok()?;
                serde_json::from_str(&content).ok()
            })
            .collect();
        slots.sort_by(|a, b| a.slot.cmp(&b.slot));
        slots
    }

    fn delete(&mut self, slot: &str) -> Result<()> {
        let path = self.slot_path(slot);
        if !path.exists() {
            return Err(error::invalid_slot(slot).with_operation("slots::delete"));
        }
        std::fs::remove_file(&path)
            .map_err(|e| error::io_error(format!("failed to delete slot '{}': {}", slot, e)))?;
        let meta = self.meta_path(slot);
        if meta.exists() {
            std::fs::remove_file(&meta)
                .map_err(|e| error::io_error(format!("failed to delete slot meta '{}': {}", slot, e)))?;
        }
        Ok(())
    }
}

// =============================================================================
// SlotStore - high-level interface
// =============================================================================

/// One session's save slots, behind a pluggable backend
pub struct SlotStore {
    backend: Box<dyn SlotBackend>,
}

impl SlotStore {
    /// In-memory store (default)
    pub fn memory() -> Self {
        Self { backend: Box::new(MemorySlotStore::new()) }
    }

    /// File-backed store rooted at the given directory
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { backend: Box::new(FileSlotStore::new(path)?) })
    }

    pub fn with_backend(backend: impl SlotBackend + 'static) -> Self {
        Self { backend: Box::new(backend) }
    }

    pub fn save(&mut self, slot: &str, blob: &[u8]) -> Result<SavedStateMeta> {
        self.backend.save(slot, blob)
    }

    pub fn load(&self, slot: &str) -> Result<Vec<u8>> {
        self.backend.load(slot)
    }

    pub fn list(&self) -> Vec<SavedStateMeta> {
        self.backend.list()
    }

    pub fn delete(&mut self, slot: &str) -> Result<()> {
        self.backend.delete(slot)
    }
}

impl std::fmt::Debug for SlotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_memory_roundtrip() {
        let mut store = SlotStore::memory();
        let meta = store.save("quicksave", b"blob-bytes").unwrap();
        assert_eq!(meta.slot, "quicksave");
        assert_eq!(meta.size, 10);

        assert_eq!(store.load("quicksave").unwrap(), b"blob-bytes");
    }

    #[test]
    fn test_unknown_slot_is_invalid() {
        let store = SlotStore::memory();
        let err = store.load("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSlot);
    }

    #[test]
    fn test_overwrite_replaces_blob() {
        let mut store = SlotStore::memory();
        store.save("s", b"one").unwrap();
        store.save("s", b"two").unwrap();
        assert_eq!(store.load("s").unwrap(), b"two");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = SlotStore::file(dir.path()).unwrap();

        store.save("auto", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("auto").unwrap(), vec![1, 2, 3]);

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].slot, "auto");
        assert_eq!(listed[0].size, 3);

        store.delete("auto").unwrap();
        assert_eq!(store.load("auto").unwrap_err().kind(), ErrorKind::InvalidSlot);
    }

    #[test]
    fn test_file_slot_name_sanitized() {
        let dir = TempDir::new().unwrap();
        let mut store = SlotStore::file(dir.path()).unwrap();
        store.save("../escape", b"x").unwrap();
        assert_eq!(store.load("../escape").unwrap(), b"x");
        // Nothing written outside the base directory
        assert!(dir.path().join(".._escape.sav").exists());
    }
}
