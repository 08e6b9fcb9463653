//! Gate session
//!
//! The `GateSession` owns the mutable per-session state of the gate: which
//! intent is selected, whether its context was injected, and the context
//! budget. It is kept apart from the durable `Intent` records; the only
//! durable writes it triggers go through `IntentStore::set_status`.

use crate::context::TokenBudget;
use crate::core::{GateError, GateResult};
use crate::intents::{IntentStatus, IntentStore};

use super::metadata::{Selection, SessionState};
use super::storage::SessionStorage;

/// Per-session selection and budget
///
/// Single writer: all mutation goes through `&mut self`.
#[derive(Debug)]
pub struct GateSession {
    state: SessionState,
    budget: TokenBudget,

    /// Storage backend for persistence (None = in-memory)
    storage: Option<SessionStorage>,
}

impl GateSession {
    /// Create an in-memory session
    pub fn new(session_id: impl Into<String>, budget: TokenBudget) -> Self {
        Self {
            state: SessionState::new(session_id),
            budget,
            storage: None,
        }
    }

    /// Open a persisted session, or start a new one if none was saved
    ///
    /// `budget` supplies the limits; consumption is restored from disk.
    pub fn open(
        session_id: &str,
        budget: TokenBudget,
        storage: SessionStorage,
    ) -> GateResult<Self> {
        let state = match storage.load_state(session_id)? {
            Some(state) => {
                tracing::debug!(
                    "Resumed session {} (selection: {:?}, consumed: {})",
                    session_id,
                    state.selection.as_ref().map(|s| s.intent_id.as_str()),
                    state.budget_consumed
                );
                state
            }
            None => SessionState::new(session_id),
        };
        let budget = budget.resume(state.budget_consumed);

        Ok(Self {
            state,
            budget,
            storage: Some(storage),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    /// Current selection, may be empty
    pub fn selected(&self) -> Option<&Selection> {
        self.state.selection.as_ref()
    }

    pub fn selected_intent_id(&self) -> Option<&str> {
        self.selected().map(|s| s.intent_id.as_str())
    }

    /// Whether the current selection already received its context
    pub fn context_injected(&self) -> bool {
        self.selected().map(|s| s.context_injected).unwrap_or(false)
    }

    /// Select an intent
    ///
    /// Fails with `IntentNotFound` for an unknown id and `InvalidState` for
    /// a completed intent. A pending target is promoted to active; the
    /// previous selection, if different and still active, is demoted back
    /// to pending. The context flag is always reset.
    pub fn select(&mut self, store: &mut IntentStore, intent_id: &str) -> GateResult<&Selection> {
        let status = store.get_by_id(intent_id)?.status;
        if !status.is_selectable() {
            return Err(GateError::invalid_state(intent_id, status, "pending or active"));
        }

        if let Some(previous) = self.selected_intent_id().map(str::to_string) {
            if previous != intent_id {
                let still_active = store
                    .get_by_id(&previous)
                    .map(|i| i.is_active())
                    .unwrap_or(false);
                if still_active {
                    store.set_status(&previous, IntentStatus::Pending)?;
                }
            }
        }

        if status == IntentStatus::Pending {
            store.set_status(intent_id, IntentStatus::Active)?;
        }

        tracing::info!("Session {} selected intent {}", self.session_id(), intent_id);
        Ok(self.set_selection(intent_id))
    }

    /// Point the selection at an already-active intent without touching the
    /// store; the flag resets only if the intent differs
    pub fn rebind(&mut self, intent_id: &str) {
        if self.selected_intent_id() == Some(intent_id) {
            return;
        }
        tracing::info!(
            "Session {} rebound from {:?} to intent {}",
            self.session_id(),
            self.selected_intent_id(),
            intent_id
        );
        self.set_selection(intent_id);
    }

    /// Mark the current selection's context as injected
    ///
    /// Idempotent; returns false when nothing is selected.
    pub fn mark_context_injected(&mut self) -> bool {
        match self.state.selection.as_mut() {
            Some(selection) => {
                selection.context_injected = true;
                self.state.touch();
                true
            }
            None => false,
        }
    }

    /// Drop the selection
    pub fn clear(&mut self) {
        if let Some(selection) = self.state.selection.take() {
            tracing::info!(
                "Session {} cleared selection of {}",
                self.session_id(),
                selection.intent_id
            );
            self.state.touch();
        }
    }

    /// Mark an intent completed, clearing the selection if it pointed there
    pub fn complete(&mut self, store: &mut IntentStore, intent_id: &str) -> GateResult<()> {
        store.set_status(intent_id, IntentStatus::Completed)?;
        if self.selected_intent_id() == Some(intent_id) {
            self.clear();
        }
        Ok(())
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut TokenBudget {
        &mut self.budget
    }

    /// Persist the session state (no-op for in-memory sessions)
    pub fn save(&mut self) -> GateResult<()> {
        self.state.budget_consumed = self.budget.consumed();
        self.state.touch();
        if let Some(storage) = &self.storage {
            storage.save_state(&self.state)?;
        }
        Ok(())
    }

    fn set_selection(&mut self, intent_id: &str) -> &Selection {
        self.state.touch();
        self.state.selection.insert(Selection::new(intent_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::Intent;
    use tempfile::TempDir;

    fn store() -> IntentStore {
        IntentStore::in_memory(vec![
            Intent::new("INT-001", "first").with_status(IntentStatus::Active),
            Intent::new("INT-002", "second"),
            Intent::new("INT-003", "done").with_status(IntentStatus::Completed),
        ])
        .unwrap()
    }

    fn session() -> GateSession {
        GateSession::new("sess", TokenBudget::new(100))
    }

    #[test]
    fn test_starts_empty() {
        let session = session();
        assert!(session.selected().is_none());
        assert!(!session.context_injected());
    }

    #[test]
    fn test_select_unknown_and_completed() {
        let mut store = store();
        let mut session = session();

        assert!(matches!(
            session.select(&mut store, "INT-404"),
            Err(GateError::IntentNotFound(_))
        ));
        assert!(matches!(
            session.select(&mut store, "INT-003"),
            Err(GateError::InvalidState { .. })
        ));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_select_promotes_and_demotes() {
        let mut store = store();
        let mut session = session();

        session.select(&mut store, "INT-001").unwrap();
        session.select(&mut store, "INT-002").unwrap();

        assert_eq!(session.selected_intent_id(), Some("INT-002"));
        assert_eq!(store.get_by_id("INT-002").unwrap().status, IntentStatus::Active);
        assert_eq!(store.get_by_id("INT-001").unwrap().status, IntentStatus::Pending);
    }

    #[test]
    fn test_select_resets_flag() {
        let mut store = store();
        let mut session = session();

        session.select(&mut store, "INT-001").unwrap();
        assert!(session.mark_context_injected());
        assert!(session.mark_context_injected());
        assert!(session.context_injected());

        session.select(&mut store, "INT-002").unwrap();
        assert!(!session.context_injected());
    }

    #[test]
    fn test_rebind_only_resets_on_change() {
        let mut session = session();
        session.rebind("INT-001");
        session.mark_context_injected();

        session.rebind("INT-001");
        assert!(session.context_injected());

        session.rebind("INT-002");
        assert!(!session.context_injected());
    }

    #[test]
    fn test_mark_without_selection() {
        let mut session = session();
        assert!(!session.mark_context_injected());
        assert!(!session.context_injected());
    }

    #[test]
    fn test_complete_clears_selection() {
        let mut store = store();
        let mut session = session();
        session.select(&mut store, "INT-001").unwrap();

        session.complete(&mut store, "INT-001").unwrap();
        assert!(session.selected().is_none());
        assert_eq!(store.get_by_id("INT-001").unwrap().status, IntentStatus::Completed);
        assert!(session.select(&mut store, "INT-001").is_err());
    }

    #[test]
    fn test_persisted_session_resumes() {
        let temp = TempDir::new().unwrap();
        let storage = SessionStorage::with_dir(temp.path());
        let mut store = store();

        {
            let mut session =
                GateSession::open("sess", TokenBudget::new(100), storage.clone()).unwrap();
            session.select(&mut store, "INT-001").unwrap();
            session.mark_context_injected();
            session.budget_mut().consume(30);
            session.save().unwrap();
        }

        let session = GateSession::open("sess", TokenBudget::new(100), storage).unwrap();
        assert_eq!(session.selected_intent_id(), Some("INT-001"));
        assert!(session.context_injected());
        assert_eq!(session.budget().consumed(), 30);
        assert_eq!(session.budget().remaining_units(), 70);
    }
}
