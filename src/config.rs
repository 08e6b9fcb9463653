//! Gate Configuration
//!
//! Optional settings read from `.orchestration/gate.yaml`. Every field has a
//! default, so a missing file or an empty document yields a working gate.
//!
//! ```yaml
//! max_context_units: 2000
//! chars_per_unit: 4
//! allowed_commands: [git, ls, cat, cargo]
//! trust_nested_substitutions: false
//! tools:
//!   - name: notebook_edit
//!     path_fields: [notebook_path]
//!     mutation: true
//!     requires_intent: true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::context::budget::DEFAULT_CHARS_PER_UNIT;
use crate::context::{TokenBudget, DEFAULT_KNOWLEDGE_TAIL_LINES, DEFAULT_RECENT_FILES_LIMIT};
use crate::core::{GateError, GateResult};
use crate::permissions::CommandPolicy;
use crate::tools::ToolProfile;

/// Default context budget per session, in cost units
pub const DEFAULT_MAX_CONTEXT_UNITS: usize = 2000;

/// Configuration for the gate
///
/// Use the builder pattern to override defaults in code:
///
/// ```ignore
/// let config = GateConfig::default()
///     .with_max_context_units(500)
///     .with_allowed_commands(["git", "ls"])
///     .with_trust_nested_substitutions(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Context budget per session (cost units)
    pub max_context_units: usize,

    /// Characters per cost unit for budget estimates
    pub chars_per_unit: usize,

    /// Maximum recent files listed in the context block
    pub recent_files_limit: usize,

    /// Knowledge log lines included in the context block
    pub knowledge_tail_lines: usize,

    /// Base command names that run without confirmation (`*` = any)
    pub allowed_commands: Vec<String>,

    /// Check commands inside `$( )` and backticks against the allow-list
    /// instead of always asking
    pub trust_nested_substitutions: bool,

    /// Extra or overriding tool classifications
    pub tools: Vec<ToolProfile>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_context_units: DEFAULT_MAX_CONTEXT_UNITS,
            chars_per_unit: DEFAULT_CHARS_PER_UNIT,
            recent_files_limit: DEFAULT_RECENT_FILES_LIMIT,
            knowledge_tail_lines: DEFAULT_KNOWLEDGE_TAIL_LINES,
            allowed_commands: Vec::new(),
            trust_nested_substitutions: false,
            tools: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Load configuration from a YAML file (missing or empty = defaults)
    pub fn load(path: impl AsRef<Path>) -> GateResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No gate config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| GateError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the gate cannot work with
    pub fn validate(&self) -> GateResult<()> {
        if self.chars_per_unit == 0 {
            return Err(GateError::Config("chars_per_unit must be at least 1".into()));
        }
        if let Some(tool) = self.tools.iter().find(|t| t.name.trim().is_empty()) {
            return Err(GateError::Config(format!(
                "tool profile with empty name: {:?}",
                tool
            )));
        }
        Ok(())
    }

    /// Set the per-session context budget
    pub fn with_max_context_units(mut self, units: usize) -> Self {
        self.max_context_units = units;
        self
    }

    /// Set characters per cost unit
    pub fn with_chars_per_unit(mut self, chars: usize) -> Self {
        self.chars_per_unit = chars;
        self
    }

    pub fn with_recent_files_limit(mut self, limit: usize) -> Self {
        self.recent_files_limit = limit;
        self
    }

    pub fn with_knowledge_tail_lines(mut self, lines: usize) -> Self {
        self.knowledge_tail_lines = lines;
        self
    }

    /// Set the command allow-list
    pub fn with_allowed_commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.allowed_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_trust_nested_substitutions(mut self, trust: bool) -> Self {
        self.trust_nested_substitutions = trust;
        self
    }

    /// Add a tool classification
    pub fn with_tool(mut self, profile: ToolProfile) -> Self {
        self.tools.push(profile);
        self
    }

    /// A fresh budget with the configured limits
    pub fn budget(&self) -> TokenBudget {
        TokenBudget::with_chars_per_unit(self.max_context_units, self.chars_per_unit)
    }

    /// The command policy described by this config
    pub fn command_policy(&self) -> CommandPolicy {
        CommandPolicy::new(self.allowed_commands.iter().cloned())
            .with_trust_nested_substitutions(self.trust_nested_substitutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = GateConfig::default();
        assert_eq!(config.max_context_units, DEFAULT_MAX_CONTEXT_UNITS);
        assert_eq!(config.chars_per_unit, 4);
        assert!(config.allowed_commands.is_empty());
        assert!(!config.trust_nested_substitutions);
    }

    #[test]
    fn test_missing_and_empty_files_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gate.yaml");
        assert_eq!(GateConfig::load(&path).unwrap(), GateConfig::default());

        std::fs::write(&path, "\n").unwrap();
        assert_eq!(GateConfig::load(&path).unwrap(), GateConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gate.yaml");
        std::fs::write(
            &path,
            "max_context_units: 100\nallowed_commands: [git, ls]\ntools:\n  - name: notebook_edit\n    mutation: true\n",
        )
        .unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.max_context_units, 100);
        assert_eq!(config.chars_per_unit, 4);
        assert_eq!(config.allowed_commands, vec!["git", "ls"]);
        assert_eq!(config.tools[0].name, "notebook_edit");
        assert_eq!(config.budget().max_units(), 100);
        assert!(config.command_policy().is_allowed("git"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gate.yaml");

        std::fs::write(&path, "chars_per_unit: 0\n").unwrap();
        assert!(matches!(GateConfig::load(&path), Err(GateError::Config(_))));

        std::fs::write(&path, "max_context_units: lots\n").unwrap();
        assert!(matches!(GateConfig::load(&path), Err(GateError::Config(_))));
    }

    #[test]
    fn test_builder() {
        let config = GateConfig::default()
            .with_max_context_units(10)
            .with_chars_per_unit(2)
            .with_allowed_commands(["cargo"])
            .with_trust_nested_substitutions(true)
            .with_tool(ToolProfile::new("custom").mutating());

        assert_eq!(config.budget().chars_per_unit(), 2);
        assert!(config.command_policy().is_allowed("cargo"));
        assert_eq!(config.tools.len(), 1);
    }
}
