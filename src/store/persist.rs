//! Persistence for persistent-scoped cells.
//!
//! The state file is a flat JSON map of cell name to value with a
//! timestamp. A missing or unreadable file is not an error; the store
//! keeps its documented defaults.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::StateStore;

#[derive(Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub saved_at: String,
    pub cells: IndexMap<String, f64>,
}

impl StateSnapshot {
    /// Capture the persistent cells of `store`.
    pub fn capture(store: &StateStore) -> Self {
        let cells = store
            .persistent_values()
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        Self {
            saved_at: chrono::Utc::now().to_rfc3339(),
            cells,
        }
    }

    /// Apply the snapshot to `store`; returns how many cells were restored.
    pub fn restore_into(&self, store: &mut StateStore) -> usize {
        let mut restored = 0;
        for (name, value) in &self.cells {
            if store.restore(name, *value) {
                restored += 1;
            }
        }
        restored
    }
}

/// Load a snapshot, tolerating a missing or malformed file.
pub fn load(path: &Path) -> Option<StateSnapshot> {
    let file = std::fs::File::open(path).ok()?;
    match serde_json::from_reader(file) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log::warn!("Ignoring malformed state file {:?}: {}", path, e);
            None
        }
    }
}

/// Save a snapshot, creating parent directories as needed.
pub fn save(path: &Path, snapshot: &StateSnapshot) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}
