//! Optional context sources
//!
//! Read-only inputs to context assembly. Both are best effort: a failing
//! source drops its section from the block instead of failing the decision.
//!
//! - `SpatialIndex` - files previously touched under an intent
//! - `KnowledgeSource` - trailing slice of the shared knowledge log

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{GateError, GateResult};

/// Association between an intent and a file it touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialEntry {
    pub intent_id: String,
    pub file_path: String,
}

impl SpatialEntry {
    pub fn new(intent_id: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            file_path: file_path.into(),
        }
    }
}

/// Source of files recently touched under an intent
pub trait SpatialIndex: Send + Sync {
    /// Name of this source (for logging)
    fn name(&self) -> &str;

    /// Files for `intent_id`, most recent first, deduplicated, at most `limit`
    fn recent_files(&self, intent_id: &str, limit: usize) -> GateResult<Vec<String>>;
}

/// Source of shared free-text knowledge
pub trait KnowledgeSource: Send + Sync {
    /// Name of this source (for logging)
    fn name(&self) -> &str;

    /// The last `lines` lines of the log
    fn tail(&self, lines: usize) -> GateResult<Vec<String>>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SpatialMapFile {
    #[serde(default)]
    entries: Vec<SpatialEntry>,
}

/// Spatial index stored as a YAML `entries:` list, oldest first
#[derive(Debug, Clone)]
pub struct YamlSpatialMap {
    path: PathBuf,
}

impl YamlSpatialMap {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order (missing file = none)
    pub fn entries(&self) -> GateResult<Vec<SpatialEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| GateError::source("spatial map", e.to_string()))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let file: SpatialMapFile = serde_yaml::from_str(&content).map_err(|e| {
            GateError::source("spatial map", format!("{}: {}", self.path.display(), e))
        })?;
        Ok(file.entries)
    }

    /// Append an entry, rewriting the file through a temporary file
    pub fn append(&self, entry: SpatialEntry) -> GateResult<()> {
        let mut entries = self.entries()?;
        tracing::debug!(
            "Recording spatial entry {} -> {}",
            entry.intent_id,
            entry.file_path
        );
        entries.push(entry);

        let yaml = serde_yaml::to_string(&SpatialMapFile { entries })?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| GateError::Io(e.error))?;
        Ok(())
    }
}

impl SpatialIndex for YamlSpatialMap {
    fn name(&self) -> &str {
        "intent_map"
    }

    fn recent_files(&self, intent_id: &str, limit: usize) -> GateResult<Vec<String>> {
        let mut files: Vec<String> = Vec::new();
        for entry in self.entries()?.into_iter().rev() {
            if files.len() >= limit {
                break;
            }
            if entry.intent_id == intent_id && !files.contains(&entry.file_path) {
                files.push(entry.file_path);
            }
        }
        Ok(files)
    }
}

/// Markdown knowledge log read from its tail
#[derive(Debug, Clone)]
pub struct KnowledgeLog {
    path: PathBuf,
}

impl KnowledgeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl KnowledgeSource for KnowledgeLog {
    fn name(&self) -> &str {
        "shared_knowledge"
    }

    fn tail(&self, lines: usize) -> GateResult<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| GateError::source("knowledge log", e.to_string()))?;

        let all: Vec<&str> = content.lines().collect();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].iter().map(|l| l.to_string()).collect())
    }
}
