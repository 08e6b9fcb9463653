//! Gate error types

use thiserror::Error;

/// Errors that can occur while gating a tool call
#[derive(Error, Debug)]
pub enum GateError {
    /// The tool requires a selected intent and none was chosen
    #[error("Tool '{tool}' requires an active intent, but no intent is selected")]
    IntentNotSelected { tool: String },

    /// The referenced intent id is unknown
    #[error("Intent not found: {0}")]
    IntentNotFound(String),

    /// The intent exists but is not in a state that allows the operation
    #[error("Intent '{id}' is {status}, expected {expected}")]
    InvalidState {
        id: String,
        status: String,
        expected: String,
    },

    /// The target path is excluded or not covered by the intent scope
    #[error("Scope violation: intent '{intent_id}' does not authorize {tool} on '{path}' ({reason})")]
    ScopeViolation {
        intent_id: String,
        path: String,
        tool: String,
        reason: String,
    },

    /// The operator rejected an action after it had been approved.
    /// Produced downstream of the pre-tool gate only.
    #[error("Action rejected by operator: {tool} ({reason})")]
    ActionRejected { tool: String, reason: String },

    /// Malformed intents manifest
    #[error("Invalid intents manifest: {0}")]
    Manifest(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An optional context source could not be read
    #[error("Context source '{source_name}' unavailable: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GateError {
    /// Create an invalid state error
    pub fn invalid_state(
        id: impl Into<String>,
        status: impl std::fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        GateError::InvalidState {
            id: id.into(),
            status: status.to_string(),
            expected: expected.into(),
        }
    }

    /// Create a context source error
    pub fn source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        GateError::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for gate operations
pub type GateResult<T> = Result<T, GateError>;
