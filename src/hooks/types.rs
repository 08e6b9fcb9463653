//! Hook Types
//!
//! Core types for the hooks:
//! - `HookEvent` - Which side of tool execution a hook runs on
//! - `ToolCall` - The call being gated
//! - `HookDecision` / `BlockKind` - What the pre-tool hook decided
//! - `ToolOutcome` - How the tool ended, for the post-tool hook

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::GateError;
use crate::tools::ToolArgs;

/// Hook event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Before a tool is executed - can block, ask, allow, or inject
    PreToolUse,
    /// After a tool ran
    PostToolUse,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::PreToolUse => write!(f, "PreToolUse"),
            HookEvent::PostToolUse => write!(f, "PostToolUse"),
        }
    }
}

/// A tool call proposed by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,

    #[serde(default, alias = "tool_input")]
    pub tool_args: ToolArgs,

    /// Intent the call runs under (falls back to the session selection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_args: ToolArgs::new(),
            intent_id: None,
        }
    }

    /// Add an argument
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tool_args.insert(key.into(), value.into());
        self
    }

    /// Set the intent id
    pub fn with_intent(mut self, intent_id: impl Into<String>) -> Self {
        self.intent_id = Some(intent_id.into());
        self
    }
}

/// Why a call was blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// The tool needs an intent and none is selected
    IntentNotSelected,
    /// The referenced intent id is unknown
    NotFound,
    /// The intent exists but is not active
    InvalidState,
    /// The target path is outside the intent's scope
    ScopeViolation,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::IntentNotSelected => write!(f, "intent_not_selected"),
            BlockKind::NotFound => write!(f, "not_found"),
            BlockKind::InvalidState => write!(f, "invalid_state"),
            BlockKind::ScopeViolation => write!(f, "scope_violation"),
        }
    }
}

/// Decision of the pre-tool-use hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum HookDecision {
    /// Run the tool
    Allow,
    /// Ask a human before running
    Ask { message: String },
    /// Do not run the tool
    Block { kind: BlockKind, message: String },
    /// Run the tool and hand the agent this context first
    Inject { context: String },
}

impl HookDecision {
    pub fn allow() -> Self {
        HookDecision::Allow
    }

    pub fn ask(message: impl Into<String>) -> Self {
        HookDecision::Ask {
            message: message.into(),
        }
    }

    pub fn block(kind: BlockKind, message: impl Into<String>) -> Self {
        HookDecision::Block {
            kind,
            message: message.into(),
        }
    }

    pub fn inject(context: impl Into<String>) -> Self {
        HookDecision::Inject {
            context: context.into(),
        }
    }

    /// Map a gate taxonomy error to a block, if it belongs to the taxonomy
    pub fn from_error(error: &GateError) -> Option<Self> {
        let kind = match error {
            GateError::IntentNotSelected { .. } => BlockKind::IntentNotSelected,
            GateError::IntentNotFound(_) => BlockKind::NotFound,
            GateError::InvalidState { .. } => BlockKind::InvalidState,
            GateError::ScopeViolation { .. } => BlockKind::ScopeViolation,
            _ => return None,
        };
        Some(Self::block(kind, error.to_string()))
    }

    /// Whether the tool may run (allow or inject)
    pub fn permits_execution(&self) -> bool {
        matches!(self, HookDecision::Allow | HookDecision::Inject { .. })
    }

    pub fn is_block(&self) -> bool {
        matches!(self, HookDecision::Block { .. })
    }
}

/// How a tool call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success,
    /// The tool ran and failed
    Failure(String),
    /// The operator rejected the action after it was approved
    Rejected(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success)
    }
}
