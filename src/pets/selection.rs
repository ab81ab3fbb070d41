//! Per-owner skin choices and where they are kept between runs.

use crate::config::{Registry, SkinDefinition};
use crate::world::OwnerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

const SELECTION_FILE: &str = "skindata.toml";

pub type SelectionMap = BTreeMap<OwnerId, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Selection store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode selections: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Failed to parse selections: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("Unknown skin: {0}")]
    UnknownSkin(String),
}

pub trait SelectionStore {
    fn save(&self, selections: &SelectionMap) -> Result<(), StoreError>;

    fn load(&self) -> Result<SelectionMap, StoreError>;
}

/// On-disk layout: a single `[skins]` table keyed by owner id.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionFile {
    #[serde(default)]
    skins: BTreeMap<String, String>,
}

/// TOML-backed store.
#[derive(Debug, Clone)]
pub struct FileSelectionStore {
    path: PathBuf,
}

impl FileSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the project data directory, if the platform has one.
    pub fn in_data_dir() -> Option<Self> {
        crate::config::data_dir().map(|dir| Self::new(dir.join(SELECTION_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SelectionStore for FileSelectionStore {
    fn save(&self, selections: &SelectionMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = SelectionFile {
            skins: selections
                .iter()
                .map(|(owner, skin_id)| (owner.to_string(), skin_id.clone()))
                .collect(),
        };
        fs::write(&self.path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn load(&self) -> Result<SelectionMap, StoreError> {
        if !self.path.exists() {
            debug!("No selection file at {:?}, creating an empty one", self.path);
            self.save(&SelectionMap::new())?;
            return Ok(SelectionMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let file: SelectionFile = toml::from_str(&contents)?;
        let mut selections = SelectionMap::new();
        for (owner, skin_id) in file.skins {
            match Uuid::parse_str(&owner) {
                Ok(uuid) => {
                    selections.insert(OwnerId(uuid), skin_id);
                }
                Err(e) => warn!("Skipping selection for invalid owner id '{}': {}", owner, e),
            }
        }
        Ok(selections)
    }
}

/// Shared in-memory store. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemorySelectionStore {
    inner: Arc<Mutex<SelectionMap>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SelectionMap {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn save(&self, selections: &SelectionMap) -> Result<(), StoreError> {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = selections.clone();
        Ok(())
    }

    fn load(&self) -> Result<SelectionMap, StoreError> {
        Ok(self.snapshot())
    }
}

/// Active skin per owner. The in-memory map is authoritative; every
/// mutation is written through to the store and failures are only logged.
pub struct SkinSelections {
    active: SelectionMap,
    store: Box<dyn SelectionStore>,
}

impl SkinSelections {
    pub fn new(store: Box<dyn SelectionStore>) -> Self {
        Self {
            active: SelectionMap::new(),
            store,
        }
    }

    pub fn get(&self, owner: OwnerId) -> Option<&str> {
        self.active.get(&owner).map(String::as_str)
    }

    /// The owner's skin, if it is still registered.
    pub fn active_skin(&self, owner: OwnerId, skins: &Registry<SkinDefinition>) -> Option<Arc<SkinDefinition>> {
        self.get(owner).and_then(|id| skins.get(id))
    }

    pub fn is_active(&self, owner: OwnerId, skin_id: &str) -> bool {
        self.get(owner) == Some(skin_id)
    }

    pub fn set(&mut self, owner: OwnerId, skin_id: &str, skins: &Registry<SkinDefinition>) -> Result<(), StoreError> {
        if !skins.contains(skin_id) {
            return Err(StoreError::UnknownSkin(skin_id.to_string()));
        }
        self.active.insert(owner, skin_id.to_string());
        self.save();
        Ok(())
    }

    /// Clear the owner's skin. Returns the removed id.
    pub fn remove(&mut self, owner: OwnerId) -> Option<String> {
        let removed = self.active.remove(&owner);
        if removed.is_some() {
            self.save();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn save(&self) {
        match self.store.save(&self.active) {
            Ok(()) => debug!("Saved {} skin selections", self.active.len()),
            Err(e) => warn!("Failed to save skin selections: {}", e),
        }
    }

    /// Replace the in-memory map with the stored one, dropping ids that no
    /// longer name a registered skin. A failed load keeps the current map.
    pub fn load(&mut self, skins: &Registry<SkinDefinition>) {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to load skin selections: {}", e);
                return;
            }
        };

        let before = stored.len();
        self.active = stored
            .into_iter()
            .filter(|(owner, skin_id)| {
                let known = skins.contains(skin_id);
                if !known {
                    warn!("Dropping unknown skin '{}' selected by {}", skin_id, owner);
                }
                known
            })
            .collect();
        info!("Loaded {} skin selections ({} dropped)", self.active.len(), before - self.active.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn skins(ids: &[&str]) -> Registry<SkinDefinition> {
        let mut registry = Registry::new();
        for id in ids {
            registry.register(SkinDefinition {
                id: id.to_string(),
                display_name: id.to_string(),
                texture: "abc".to_string(),
                model_id: None,
                use_model_engine: false,
                use_custom_animations: false,
                animations: HashMap::new(),
                idle_animation: None,
            });
        }
        registry
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("pet-companion-{}.toml", Uuid::new_v4()));
        let store = FileSelectionStore::new(&path);

        assert!(store.load().unwrap().is_empty());
        assert!(path.exists());

        let mut map = SelectionMap::new();
        map.insert(OwnerId::new_v4(), "arctic".to_string());
        map.insert(OwnerId::new_v4(), "ember".to_string());
        store.save(&map).unwrap();
        assert_eq!(store.load().unwrap(), map);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_owner_ids_skipped_per_entry() {
        let path = std::env::temp_dir().join(format!("pet-companion-{}.toml", Uuid::new_v4()));
        let good = OwnerId::new_v4();
        fs::write(
            &path,
            format!("[skins]\n\"{}\" = \"arctic\"\n\"not-a-uuid\" = \"arctic\"\n", good),
        )
        .unwrap();

        let store = FileSelectionStore::new(&path);
        let registry = skins(&["arctic", "ember"]);
        let mut selections = SkinSelections::new(Box::new(store.clone()));
        selections.load(&registry);
        assert_eq!(selections.get(good), Some("arctic"));
        assert_eq!(selections.len(), 1);

        // A later write-through keeps the valid entry.
        selections.set(OwnerId::new_v4(), "ember", &registry).unwrap();
        let stored = store.load().unwrap();
        assert_eq!(stored.get(&good).map(String::as_str), Some("arctic"));
        assert_eq!(stored.len(), 2);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_drops_unknown_skins() {
        let store = MemorySelectionStore::new();
        let kept = OwnerId::new_v4();
        let dropped = OwnerId::new_v4();
        let mut map = SelectionMap::new();
        map.insert(kept, "arctic".to_string());
        map.insert(dropped, "retired".to_string());
        store.save(&map).unwrap();

        let mut selections = SkinSelections::new(Box::new(store.clone()));
        selections.load(&skins(&["arctic"]));
        assert_eq!(selections.get(kept), Some("arctic"));
        assert_eq!(selections.get(dropped), None);
        assert_eq!(selections.len(), 1);
    }

    #[test]
    fn test_set_rejects_unknown_and_writes_through() {
        let store = MemorySelectionStore::new();
        let registry = skins(&["arctic"]);
        let mut selections = SkinSelections::new(Box::new(store.clone()));
        let owner = OwnerId::new_v4();

        assert!(matches!(
            selections.set(owner, "missing", &registry),
            Err(StoreError::UnknownSkin(_))
        ));
        assert!(store.snapshot().is_empty());

        selections.set(owner, "arctic", &registry).unwrap();
        assert!(selections.is_active(owner, "arctic"));
        assert_eq!(store.snapshot().get(&owner).map(String::as_str), Some("arctic"));

        assert_eq!(selections.remove(owner).as_deref(), Some("arctic"));
        assert!(store.snapshot().is_empty());
        assert_eq!(selections.remove(owner), None);
    }
}
