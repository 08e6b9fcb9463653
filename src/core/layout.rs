//! Sidecar file layout
//!
//! Everything the gate reads or writes lives under `.orchestration/` in the
//! workspace root. A bootstrap step outside this crate is expected to have
//! created the directory; readers treat missing files as empty.

use std::path::{Path, PathBuf};

use super::GateResult;

/// Name of the sidecar directory inside the workspace
pub const ORCHESTRATION_DIR: &str = ".orchestration";

/// Paths of the sidecar files for one workspace
#[derive(Debug, Clone)]
pub struct OrchestrationLayout {
    root: PathBuf,
}

impl OrchestrationLayout {
    /// Create a layout rooted at a workspace directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Workspace root
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn orchestration_dir(&self) -> PathBuf {
        self.root.join(ORCHESTRATION_DIR)
    }

    /// Intents manifest (human-editable YAML)
    pub fn intents_file(&self) -> PathBuf {
        self.orchestration_dir().join("active_intents.yaml")
    }

    /// Append-only trace ledger (JSON lines)
    pub fn trace_file(&self) -> PathBuf {
        self.orchestration_dir().join("agent_trace.jsonl")
    }

    /// Spatial association store (intent id to file path)
    pub fn spatial_map_file(&self) -> PathBuf {
        self.orchestration_dir().join("intent_map.yaml")
    }

    /// Shared free-text knowledge log
    pub fn knowledge_file(&self) -> PathBuf {
        self.orchestration_dir().join("shared_knowledge.md")
    }

    /// Optional gate configuration
    pub fn config_file(&self) -> PathBuf {
        self.orchestration_dir().join("gate.yaml")
    }

    /// Per-session state files
    pub fn sessions_dir(&self) -> PathBuf {
        self.orchestration_dir().join("sessions")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.orchestration_dir().join("logs")
    }

    /// Create the sidecar directories if they don't exist
    pub fn ensure_dirs(&self) -> GateResult<()> {
        std::fs::create_dir_all(self.orchestration_dir())?;
        std::fs::create_dir_all(self.sessions_dir())?;
        Ok(())
    }
}
