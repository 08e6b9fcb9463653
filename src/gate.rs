//! Workspace-bound gate
//!
//! `IntentGate` wires the components to the sidecar files of one workspace:
//! the intents manifest, session state, configuration, trace ledger, spatial
//! map and knowledge log. Each hook invocation loads its session, decides,
//! and saves the session back, so separate processes share one selection.

use std::path::Path;
use std::sync::Arc;

use crate::config::GateConfig;
use crate::context::{ContextInjector, KnowledgeLog, YamlSpatialMap};
use crate::core::{GateResult, OrchestrationLayout};
use crate::hooks::{
    GitRevision, HookDecision, HookEvent, PostToolUseHook, PreToolUseHook, ToolCall, ToolOutcome,
    TraceLedger, TraceRecord,
};
use crate::intents::{Intent, IntentStore, ScopeMatcher};
use crate::permissions::CommandVerdict;
use crate::session::{GateSession, SessionStorage};
use crate::tools::ToolRegistry;

/// The gate for one workspace
#[derive(Debug)]
pub struct IntentGate {
    layout: OrchestrationLayout,
    config: GateConfig,
    store: IntentStore,
    sessions: SessionStorage,
    pre: PreToolUseHook,
    post: PostToolUseHook,
}

impl IntentGate {
    /// Open the gate for a workspace, reading `.orchestration/gate.yaml`
    pub fn open(workspace: impl AsRef<Path>) -> GateResult<Self> {
        let layout = OrchestrationLayout::new(workspace);
        let config = GateConfig::load(layout.config_file())?;
        Self::with_config(layout, config)
    }

    /// Open the gate with an explicit configuration
    pub fn with_config(layout: OrchestrationLayout, config: GateConfig) -> GateResult<Self> {
        config.validate()?;
        let store = IntentStore::load(layout.intents_file())?;

        let mut tools = ToolRegistry::new();
        for profile in &config.tools {
            tools.register(profile.clone());
        }

        let scope = ScopeMatcher::with_root(layout.root());
        let spatial = YamlSpatialMap::new(layout.spatial_map_file());

        let injector = ContextInjector::new()
            .with_spatial_index(Arc::new(spatial.clone()))
            .with_knowledge_source(Arc::new(KnowledgeLog::new(layout.knowledge_file())))
            .with_recent_files_limit(config.recent_files_limit)
            .with_knowledge_tail_lines(config.knowledge_tail_lines);

        let pre = PreToolUseHook::new()
            .with_tools(tools.clone())
            .with_scope_matcher(scope.clone())
            .with_command_policy(config.command_policy())
            .with_injector(injector);

        let post = PostToolUseHook::new(TraceLedger::new(layout.trace_file()))
            .with_tools(tools)
            .with_scope_matcher(scope)
            .with_spatial_map(spatial)
            .with_revision_source(Arc::new(GitRevision::new(layout.root())));

        tracing::debug!(
            "Gate opened for {:?}: {} intents, {} tool classifiers",
            layout.root(),
            store.len(),
            pre.tools().len()
        );

        Ok(Self {
            sessions: SessionStorage::with_dir(layout.sessions_dir()),
            layout,
            config,
            store,
            pre,
            post,
        })
    }

    pub fn layout(&self) -> &OrchestrationLayout {
        &self.layout
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// All intents in manifest order
    pub fn intents(&self) -> &[Intent] {
        self.store.list()
    }

    /// Load a session, starting a fresh one if none was saved
    pub fn session(&self, session_id: &str) -> GateResult<GateSession> {
        GateSession::open(session_id, self.config.budget(), self.sessions.clone())
    }

    /// Decide a proposed tool call and persist the session
    pub fn pre_tool_use(&self, session_id: &str, call: &ToolCall) -> GateResult<HookDecision> {
        tracing::debug!("{} {} in session {}", HookEvent::PreToolUse, call.tool_name, session_id);
        let mut session = self.session(session_id)?;
        let decision = self.pre.decide(&self.store, &mut session, call);
        session.save()?;
        Ok(decision)
    }

    /// Record the outcome of a tool call
    pub fn post_tool_use(
        &self,
        session_id: &str,
        call: &ToolCall,
        outcome: &ToolOutcome,
    ) -> GateResult<Option<TraceRecord>> {
        tracing::debug!("{} {} in session {}", HookEvent::PostToolUse, call.tool_name, session_id);
        let session = self.session(session_id)?;
        self.post.record(&session, call, outcome)
    }

    /// Select an intent for a session
    pub fn select(&mut self, session_id: &str, intent_id: &str) -> GateResult<Intent> {
        let mut session = self.session(session_id)?;
        session.select(&mut self.store, intent_id)?;
        session.save()?;
        Ok(self.store.get_by_id(intent_id)?.clone())
    }

    /// Mark an intent completed
    pub fn complete(&mut self, session_id: &str, intent_id: &str) -> GateResult<()> {
        let mut session = self.session(session_id)?;
        session.complete(&mut self.store, intent_id)?;
        session.save()
    }

    /// Drop a session's selection
    pub fn clear(&self, session_id: &str) -> GateResult<()> {
        let mut session = self.session(session_id)?;
        session.clear();
        session.save()
    }

    /// Ids of all saved sessions, sorted
    pub fn sessions(&self) -> GateResult<Vec<String>> {
        self.sessions.list_sessions()
    }

    /// Delete a session's saved state; false if none was saved
    pub fn forget(&self, session_id: &str) -> GateResult<bool> {
        if !self.sessions.session_exists(session_id) {
            return Ok(false);
        }
        self.sessions.delete_session(session_id)?;
        tracing::info!("Forgot session {}", session_id);
        Ok(true)
    }

    /// Evaluate a command line against the configured policy
    pub fn check_command(&self, command: &str) -> CommandVerdict {
        self.pre.command_policy().evaluate(command)
    }
}
