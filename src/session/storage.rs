//! Session storage helpers
//!
//! Handles reading and writing session state to disk, one JSON file per
//! session under `.orchestration/sessions/`.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::core::GateResult;

use super::metadata::SessionState;

/// Session storage manager
#[derive(Debug, Clone)]
pub struct SessionStorage {
    base_dir: PathBuf,
}

impl SessionStorage {
    /// Create a session storage rooted at a directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: dir.into(),
        }
    }

    /// Get the state file path for a session
    pub fn state_path(&self, session_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", sanitize(session_id)))
    }

    /// Save session state
    pub fn save_state(&self, state: &SessionState) -> GateResult<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)?;
        }
        let path = self.state_path(&state.session_id);

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        writer.flush()?;

        Ok(())
    }

    /// Load session state, if the session was saved before
    pub fn load_state(&self, session_id: &str) -> GateResult<Option<SessionState>> {
        let path = self.state_path(session_id);

        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let state: SessionState = serde_json::from_reader(reader)?;

        Ok(Some(state))
    }

    /// Check if a session exists
    pub fn session_exists(&self, session_id: &str) -> bool {
        self.state_path(session_id).exists()
    }

    /// List all saved session IDs (file stems), sorted
    pub fn list_sessions(&self) -> GateResult<Vec<String>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sessions.push(stem.to_string());
            }
        }
        sessions.sort();

        Ok(sessions)
    }

    /// Delete a session
    pub fn delete_session(&self, session_id: &str) -> GateResult<()> {
        let path = self.state_path(session_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

/// Keep session ids from escaping the sessions directory
fn sanitize(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}
