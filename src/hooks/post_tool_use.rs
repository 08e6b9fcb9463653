//! Post-tool-use recording
//!
//! After a mutating tool succeeds, the file it touched is appended to the
//! trace ledger (one JSON object per line) and associated with the intent in
//! the spatial map, which feeds the "recent files" section of later context
//! blocks.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{SpatialEntry, YamlSpatialMap};
use crate::core::{GateError, GateResult};
use crate::intents::ScopeMatcher;
use crate::session::GateSession;
use crate::tools::ToolRegistry;

use super::types::{ToolCall, ToolOutcome};

/// One ledger line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,

    /// VCS revision the change was made on top of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,

    pub tool: String,

    #[serde(default)]
    pub files: Vec<String>,
}

impl TraceRecord {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            revision: None,
            intent_id: None,
            tool: tool.into(),
            files: Vec::new(),
        }
    }

    pub fn with_revision(mut self, revision: Option<String>) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_intent(mut self, intent_id: Option<String>) -> Self {
        self.intent_id = intent_id;
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.files.push(file.into());
        self
    }
}

/// Append-only JSONL trace ledger
#[derive(Debug, Clone)]
pub struct TraceLedger {
    path: PathBuf,
}

impl TraceLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line
    pub fn append(&self, record: &TraceRecord) -> GateResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read every record; a missing ledger is empty
    pub fn read_all(&self) -> GateResult<Vec<TraceRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(std::fs::File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

/// Where the current VCS revision comes from
pub trait RevisionSource: Send + Sync {
    /// Current revision id, or None when unavailable
    fn current_revision(&self) -> Option<String>;
}

/// `git rev-parse HEAD` in a working directory
#[derive(Debug, Clone)]
pub struct GitRevision {
    workdir: PathBuf,
}

impl GitRevision {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

impl RevisionSource for GitRevision {
    fn current_revision(&self) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(&self.workdir)
            .output();

        match output {
            Ok(out) if out.status.success() => {
                let revision = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!revision.is_empty()).then_some(revision)
            }
            Ok(out) => {
                tracing::debug!(
                    "git rev-parse failed in {:?}: {}",
                    self.workdir,
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                None
            }
            Err(e) => {
                tracing::debug!("git unavailable: {}", e);
                None
            }
        }
    }
}

/// Records successful mutations
pub struct PostToolUseHook {
    tools: ToolRegistry,
    scope: ScopeMatcher,
    ledger: TraceLedger,
    spatial: Option<YamlSpatialMap>,
    revision: Option<Arc<dyn RevisionSource>>,
}

impl PostToolUseHook {
    /// Hook writing to `ledger`, without spatial map or revision lookup
    pub fn new(ledger: TraceLedger) -> Self {
        Self {
            tools: ToolRegistry::default(),
            scope: ScopeMatcher::new(),
            ledger,
            spatial: None,
            revision: None,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_scope_matcher(mut self, scope: ScopeMatcher) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_spatial_map(mut self, spatial: YamlSpatialMap) -> Self {
        self.spatial = Some(spatial);
        self
    }

    pub fn with_revision_source(mut self, revision: Arc<dyn RevisionSource>) -> Self {
        self.revision = Some(revision);
        self
    }

    pub fn ledger(&self) -> &TraceLedger {
        &self.ledger
    }

    /// Record the outcome of a tool call
    ///
    /// Returns the appended record, or None when nothing was worth recording
    /// (a failure, a read-only tool, or no path). A rejected action is an
    /// error.
    pub fn record(
        &self,
        session: &GateSession,
        call: &ToolCall,
        outcome: &ToolOutcome,
    ) -> GateResult<Option<TraceRecord>> {
        match outcome {
            ToolOutcome::Rejected(reason) => {
                return Err(GateError::ActionRejected {
                    tool: call.tool_name.clone(),
                    reason: reason.clone(),
                });
            }
            ToolOutcome::Failure(message) => {
                tracing::info!("{} failed, not recorded: {}", call.tool_name, message);
                return Ok(None);
            }
            ToolOutcome::Success => {}
        }

        let classifier = self.tools.get(&call.tool_name);
        if !classifier.is_mutation() {
            return Ok(None);
        }
        let Some(raw) = classifier.target_path(&call.tool_args) else {
            return Ok(None);
        };

        let path = self.scope.normalize(&raw);
        let intent_id = call
            .intent_id
            .clone()
            .or_else(|| session.selected_intent_id().map(str::to_string));

        let record = TraceRecord::new(&call.tool_name)
            .with_revision(self.revision.as_ref().and_then(|r| r.current_revision()))
            .with_intent(intent_id.clone())
            .with_file(path.clone());
        self.ledger.append(&record)?;

        if let (Some(spatial), Some(intent_id)) = (&self.spatial, intent_id) {
            if let Err(e) = spatial.append(SpatialEntry::new(intent_id, path.clone())) {
                tracing::warn!("Spatial map update for {} failed: {}", path, e);
            }
        }

        tracing::info!("Traced {} on {} ({})", call.tool_name, path, record.id);
        Ok(Some(record))
    }
}

impl std::fmt::Debug for PostToolUseHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostToolUseHook")
            .field("ledger", &self.ledger)
            .field("spatial", &self.spatial)
            .field("has_revision_source", &self.revision.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{SpatialIndex, TokenBudget};
    use tempfile::TempDir;

    struct FixedRevision;

    impl RevisionSource for FixedRevision {
        fn current_revision(&self) -> Option<String> {
            Some("abc123".to_string())
        }
    }

    fn hook(temp: &TempDir) -> PostToolUseHook {
        PostToolUseHook::new(TraceLedger::new(temp.path().join("agent_trace.jsonl")))
            .with_scope_matcher(ScopeMatcher::with_root(temp.path()))
            .with_spatial_map(YamlSpatialMap::new(temp.path().join("intent_map.yaml")))
            .with_revision_source(Arc::new(FixedRevision))
    }

    fn session() -> GateSession {
        let mut session = GateSession::new("s", TokenBudget::new(10));
        session.rebind("INT-001");
        session
    }

    #[test]
    fn test_success_records_trace_and_spatial_entry() {
        let temp = TempDir::new().unwrap();
        let hook = hook(&temp);
        let call = ToolCall::new("write_to_file").with_arg("path", "./src/a.rs");

        let record = hook
            .record(&session(), &call, &ToolOutcome::Success)
            .unwrap()
            .unwrap();
        assert_eq!(record.files, vec!["src/a.rs"]);
        assert_eq!(record.intent_id.as_deref(), Some("INT-001"));
        assert_eq!(record.revision.as_deref(), Some("abc123"));

        let all = hook.ledger().read_all().unwrap();
        assert_eq!(all, vec![record]);

        let map = YamlSpatialMap::new(temp.path().join("intent_map.yaml"));
        assert_eq!(map.recent_files("INT-001", 5).unwrap(), vec!["src/a.rs"]);
    }

    #[test]
    fn test_absolute_path_relativized() {
        let temp = TempDir::new().unwrap();
        let hook = hook(&temp);
        let abs = temp.path().join("src/b.rs");
        let call = ToolCall::new("apply_diff").with_arg("path", abs.to_string_lossy().to_string());

        let record = hook
            .record(&session(), &call, &ToolOutcome::Success)
            .unwrap()
            .unwrap();
        assert_eq!(record.files, vec!["src/b.rs"]);
    }

    #[test]
    fn test_failures_and_reads_not_recorded() {
        let temp = TempDir::new().unwrap();
        let hook = hook(&temp);

        let write = ToolCall::new("write_to_file").with_arg("path", "src/a.rs");
        let failed = hook
            .record(&session(), &write, &ToolOutcome::Failure("disk full".into()))
            .unwrap();
        assert!(failed.is_none());

        let read = ToolCall::new("read_file").with_arg("path", "src/a.rs");
        assert!(hook
            .record(&session(), &read, &ToolOutcome::Success)
            .unwrap()
            .is_none());

        assert!(hook.ledger().read_all().unwrap().is_empty());
    }

    #[test]
    fn test_rejection_is_an_error() {
        let temp = TempDir::new().unwrap();
        let call = ToolCall::new("write_to_file").with_arg("path", "src/a.rs");
        let result = hook(&temp).record(&session(), &call, &ToolOutcome::Rejected("no".into()));
        assert!(matches!(result, Err(GateError::ActionRejected { .. })));
    }

    #[test]
    fn test_without_intent_skips_spatial_map() {
        let temp = TempDir::new().unwrap();
        let hook = hook(&temp);
        let session = GateSession::new("s", TokenBudget::new(10));
        let call = ToolCall::new("write_to_file").with_arg("path", "notes.md");

        let record = hook
            .record(&session, &call, &ToolOutcome::Success)
            .unwrap()
            .unwrap();
        assert!(record.intent_id.is_none());
        assert!(!temp.path().join("intent_map.yaml").exists());
    }

    #[test]
    fn test_ledger_appends_lines() {
        let temp = TempDir::new().unwrap();
        let ledger = TraceLedger::new(temp.path().join("nested/trace.jsonl"));
        ledger.append(&TraceRecord::new("a").with_file("x")).unwrap();
        ledger.append(&TraceRecord::new("b")).unwrap();

        let content = std::fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
        let tools: Vec<_> = ledger.read_all().unwrap().into_iter().map(|r| r.tool).collect();
        assert_eq!(tools, vec!["a", "b"]);
    }

    #[test]
    fn test_git_revision_outside_repo_is_none() {
        let temp = TempDir::new().unwrap();
        // A fresh temp dir is not a git checkout (or git is missing)
        assert!(GitRevision::new(temp.path()).current_revision().is_none());
    }
}
