//! Tool classification registry
//!
//! Maps tool names to classifiers. New tools register a classifier instead
//! of being hard-coded into the gate; unknown tools fall back to a profile
//! that reads the default path fields and is neither mutating nor
//! intent-requiring.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::{ToolClassifier, ToolProfile};

/// Name reported by the fallback classifier
const FALLBACK_NAME: &str = "*";

/// Registry of tool classifiers
#[derive(Clone)]
pub struct ToolRegistry {
    classifiers: HashMap<String, Arc<dyn ToolClassifier>>,
    fallback: Arc<dyn ToolClassifier>,
}

impl ToolRegistry {
    /// Create a registry with the built-in agent tools
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in [
            "write_to_file",
            "apply_diff",
            "insert_content",
            "search_and_replace",
            "edit_file",
        ] {
            registry.register(ToolProfile::new(name).mutating());
        }
        registry.register(
            ToolProfile::new("execute_command")
                .with_path_fields(Vec::<String>::new())
                .with_command_field("command")
                .requiring_intent(true),
        );
        for name in ["read_file", "list_files", "search_files"] {
            registry.register(ToolProfile::new(name));
        }
        registry
    }

    /// Create an empty registry (every tool uses the fallback)
    pub fn empty() -> Self {
        Self {
            classifiers: HashMap::new(),
            fallback: Arc::new(ToolProfile::new(FALLBACK_NAME)),
        }
    }

    /// Register a classifier, replacing any previous one with the same name
    pub fn register<T: ToolClassifier + 'static>(&mut self, classifier: T) {
        self.register_shared(Arc::new(classifier));
    }

    /// Register a shared classifier
    pub fn register_shared(&mut self, classifier: Arc<dyn ToolClassifier>) {
        let name = classifier.name().to_string();
        tracing::debug!(
            "Registering tool classifier: {} (mutation: {}, requires intent: {})",
            name,
            classifier.is_mutation(),
            classifier.requires_intent()
        );
        self.classifiers.insert(name, classifier);
    }

    /// Classifier for a tool (the fallback for unknown tools)
    pub fn get(&self, name: &str) -> Arc<dyn ToolClassifier> {
        match self.classifiers.get(name) {
            Some(classifier) => classifier.clone(),
            None => {
                tracing::debug!("No classifier for tool '{}', using fallback", name);
                self.fallback.clone()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classifiers.contains_key(name)
    }

    /// Registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classifiers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolArgs;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::empty();
        assert!(registry.is_empty());
        assert!(!registry.contains("write_to_file"));
    }

    #[test]
    fn test_default_matches_new() {
        assert_eq!(ToolRegistry::default().tool_names(), ToolRegistry::new().tool_names());
        assert!(ToolRegistry::default().contains("execute_command"));
    }

    #[test]
    fn test_default_mutation_tools() {
        let registry = ToolRegistry::new();
        for name in ["write_to_file", "apply_diff", "insert_content", "search_and_replace", "edit_file"] {
            let tool = registry.get(name);
            assert!(tool.is_mutation(), "{} should mutate", name);
            assert!(tool.requires_intent(), "{} should require an intent", name);
        }
    }

    #[test]
    fn test_execute_command_profile() {
        let tool = ToolRegistry::new().get("execute_command");
        assert!(!tool.is_mutation());
        assert!(tool.requires_intent());
        let a = args(json!({"command": "git status", "path": "ignored"}));
        assert_eq!(tool.command(&a).as_deref(), Some("git status"));
        assert_eq!(tool.target_path(&a), None);
    }

    #[test]
    fn test_read_tools_are_path_only() {
        let tool = ToolRegistry::new().get("read_file");
        assert!(!tool.is_mutation());
        assert!(!tool.requires_intent());
        assert_eq!(
            tool.target_path(&args(json!({"path": "src/a.rs"}))).as_deref(),
            Some("src/a.rs")
        );
    }

    #[test]
    fn test_unknown_tool_fallback() {
        let tool = ToolRegistry::new().get("browser_action");
        assert_eq!(tool.name(), FALLBACK_NAME);
        assert!(!tool.is_mutation());
        assert!(!tool.requires_intent());
        assert_eq!(
            tool.target_path(&args(json!({"filePath": "x.ts"}))).as_deref(),
            Some("x.ts")
        );
    }

    #[test]
    fn test_register_overrides() {
        let mut registry = ToolRegistry::new();
        let before = registry.len();
        registry.register(ToolProfile::new("read_file").mutating());
        assert_eq!(registry.len(), before);
        assert!(registry.get("read_file").is_mutation());

        registry.register(ToolProfile::new("notebook_edit").mutating());
        assert!(registry.tool_names().contains(&"notebook_edit"));
    }
}
