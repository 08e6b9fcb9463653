//! Session state types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The intent a session currently works under
///
/// A weak reference: only the id is held, the record stays in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub intent_id: String,

    /// Whether the context block for this selection was already injected
    #[serde(default)]
    pub context_injected: bool,

    pub selected_at: DateTime<Utc>,
}

impl Selection {
    /// A fresh selection with the flag cleared
    pub fn new(intent_id: impl Into<String>) -> Self {
        Self {
            intent_id: intent_id.into(),
            context_injected: false,
            selected_at: Utc::now(),
        }
    }
}

/// Persisted state of a gate session
///
/// Hook invocations may come from separate processes, so the selection and
/// the budget counter are written back after every decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session ID
    pub session_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,

    /// Context budget units consumed so far
    #[serde(default)]
    pub budget_consumed: usize,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            selection: None,
            budget_consumed: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = SessionState::new("sess-1");
        assert_eq!(state.session_id, "sess-1");
        assert!(state.selection.is_none());
        assert_eq!(state.budget_consumed, 0);
    }

    #[test]
    fn test_selection_starts_uninjected() {
        let selection = Selection::new("INT-001");
        assert!(!selection.context_injected);
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{
            "session_id": "s",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let state: SessionState = serde_json::from_str(json).unwrap();
        assert!(state.selection.is_none());
        assert_eq!(state.budget_consumed, 0);
    }
}
