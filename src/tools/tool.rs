//! Tool classification
//!
//! The gate never executes tools; it only needs to know, per tool, which
//! argument names a file path, which carries a shell command, whether the
//! tool mutates files and whether it must run under an intent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed tool arguments as received from the agent host
pub type ToolArgs = serde_json::Map<String, Value>;

/// Argument names checked for a file path when a tool declares none
pub const DEFAULT_PATH_FIELDS: &[&str] = &["path", "file_path", "filePath", "target_file"];

/// Capabilities the gate needs to know about a tool
pub trait ToolClassifier: Send + Sync {
    /// Tool name as sent by the agent host
    fn name(&self) -> &str;

    /// The file path this invocation targets, if any
    fn target_path(&self, args: &ToolArgs) -> Option<String>;

    /// The shell command this invocation runs, if any
    fn command(&self, _args: &ToolArgs) -> Option<String> {
        None
    }

    /// Whether the tool writes or patches files
    fn is_mutation(&self) -> bool;

    /// Whether the tool may only run under a selected intent
    fn requires_intent(&self) -> bool;
}

/// Declarative tool classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolProfile {
    pub name: String,

    /// Argument names checked in order; the first non-empty string wins
    #[serde(default = "default_path_fields")]
    pub path_fields: Vec<String>,

    /// Argument carrying a shell command
    #[serde(default)]
    pub command_field: Option<String>,

    #[serde(default)]
    pub mutation: bool,

    #[serde(default)]
    pub requires_intent: bool,
}

fn default_path_fields() -> Vec<String> {
    DEFAULT_PATH_FIELDS.iter().map(|s| s.to_string()).collect()
}

impl ToolProfile {
    /// A read-only profile probing the default path fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_fields: default_path_fields(),
            command_field: None,
            mutation: false,
            requires_intent: false,
        }
    }

    /// Mark as a file-mutating tool (implies requiring an intent)
    pub fn mutating(mut self) -> Self {
        self.mutation = true;
        self.requires_intent = true;
        self
    }

    pub fn requiring_intent(mut self, required: bool) -> Self {
        self.requires_intent = required;
        self
    }

    /// Replace the path fields
    pub fn with_path_fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.path_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the command field
    pub fn with_command_field(mut self, field: impl Into<String>) -> Self {
        self.command_field = Some(field.into());
        self
    }
}

impl ToolClassifier for ToolProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_path(&self, args: &ToolArgs) -> Option<String> {
        self.path_fields.iter().find_map(|f| string_arg(args, f))
    }

    fn command(&self, args: &ToolArgs) -> Option<String> {
        self.command_field.as_deref().and_then(|f| string_arg(args, f))
    }

    fn is_mutation(&self) -> bool {
        self.mutation
    }

    fn requires_intent(&self) -> bool {
        self.requires_intent
    }
}

/// A non-blank string argument
fn string_arg(args: &ToolArgs, field: &str) -> Option<String> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}
