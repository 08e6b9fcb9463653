//! Intent store
//!
//! Reads the intents manifest (`active_intents.yaml`) and is the only path
//! through which intent status changes are written back. Writes go through
//! a temporary file in the same directory and are renamed into place, so a
//! reader never sees a half-written manifest.
//!
//! The store assumes a single writer per workspace.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::intent::{Intent, IntentStatus};
use crate::core::{GateError, GateResult};

/// On-disk shape of the manifest
#[derive(Debug, Default, Serialize, Deserialize)]
struct IntentManifest {
    #[serde(default)]
    active_intents: Vec<Intent>,
}

/// Collection of intents backed by an optional manifest file
#[derive(Debug, Clone, Default)]
pub struct IntentStore {
    /// Manifest path (None = in-memory only)
    path: Option<PathBuf>,
    intents: Vec<Intent>,
}

impl IntentStore {
    /// Create an in-memory store (nothing is persisted)
    pub fn in_memory(intents: Vec<Intent>) -> GateResult<Self> {
        check_unique_ids(&intents)?;
        Ok(Self {
            path: None,
            intents,
        })
    }

    /// Load a store from a manifest file
    ///
    /// A missing or empty manifest loads as an empty store.
    pub fn load(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref().to_path_buf();
        let intents = read_manifest(&path)?;
        tracing::debug!("Loaded {} intents from {:?}", intents.len(), path);
        Ok(Self {
            path: Some(path),
            intents,
        })
    }

    /// Look up an intent by id
    pub fn get_by_id(&self, id: &str) -> GateResult<&Intent> {
        self.intents
            .iter()
            .find(|i| i.id == id)
            .ok_or_else(|| GateError::IntentNotFound(id.to_string()))
    }

    /// All intents in manifest order
    pub fn list(&self) -> &[Intent] {
        &self.intents
    }

    /// Intents currently in the active state
    pub fn active(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter().filter(|i| i.is_active())
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Transition an intent to a new status and persist the manifest
    ///
    /// `Completed` is terminal: moving out of it fails with `InvalidState`.
    pub fn set_status(&mut self, id: &str, status: IntentStatus) -> GateResult<&Intent> {
        let index = self
            .intents
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| GateError::IntentNotFound(id.to_string()))?;

        let current = self.intents[index].status;
        if current == status {
            return Ok(&self.intents[index]);
        }
        if current.is_terminal() {
            return Err(GateError::invalid_state(id, current, "pending or active"));
        }

        let previous_update = self.intents[index].updated_at;
        {
            let intent = &mut self.intents[index];
            intent.status = status;
            intent.updated_at = Utc::now();
        }

        // The in-memory record only moves once the manifest is written
        if let Err(e) = self.save() {
            let intent = &mut self.intents[index];
            intent.status = current;
            intent.updated_at = previous_update;
            tracing::warn!("Failed to persist {} -> {} for {}: {}", current, status, id, e);
            return Err(e);
        }
        tracing::info!("Intent {} transitioned {} -> {}", id, current, status);
        Ok(&self.intents[index])
    }

    /// Write the manifest back to disk (no-op for in-memory stores)
    pub fn save(&self) -> GateResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let manifest = IntentManifest {
            active_intents: self.intents.clone(),
        };
        let yaml = serde_yaml::to_string(&manifest)?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| GateError::Io(e.error))?;

        tracing::debug!("Saved {} intents to {:?}", self.intents.len(), path);
        Ok(())
    }

    /// Manifest path, if persisted
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn read_manifest(path: &Path) -> GateResult<Vec<Intent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let manifest: IntentManifest = serde_yaml::from_str(&content)
        .map_err(|e| GateError::Manifest(format!("{}: {}", path.display(), e)))?;
    check_unique_ids(&manifest.active_intents)?;
    Ok(manifest.active_intents)
}

fn check_unique_ids(intents: &[Intent]) -> GateResult<()> {
    let mut seen = std::collections::HashSet::new();
    for intent in intents {
        if !seen.insert(intent.id.as_str()) {
            return Err(GateError::Manifest(format!(
                "duplicate intent id '{}'",
                intent.id
            )));
        }
    }
    Ok(())
}
