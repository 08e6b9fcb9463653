//! Command allow-list policy
//!
//! A command line is auto-approved only when every base command it invokes
//! is on the allow-list and it carries no dangerous construct. Anything else
//! goes to the user; the policy never denies outright.

use serde::Serialize;

use super::commands::extract_base_commands;
use super::substitution::{find_dangerous_constructs, DangerousConstruct};

/// Allow-list entry matching every command name
pub const WILDCARD: &str = "*";

/// Outcome of checking a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandDecision {
    /// Safe to run without confirmation
    AutoApprove,
    /// Needs human confirmation
    AskUser,
}

/// Detailed result of evaluating a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVerdict {
    pub decision: CommandDecision,
    /// Base commands the line invokes, in order of appearance
    pub commands: Vec<String>,
    /// Dangerous constructs that forced confirmation
    pub constructs: Vec<DangerousConstruct>,
    /// Commands missing from the allow-list
    pub unlisted: Vec<String>,
}

impl CommandVerdict {
    pub fn is_approved(&self) -> bool {
        self.decision == CommandDecision::AutoApprove
    }

    /// Human-readable reason for asking
    pub fn reason(&self) -> String {
        if self.is_approved() {
            return "all commands are allow-listed".to_string();
        }
        if self.commands.is_empty() && self.constructs.is_empty() {
            return "empty command".to_string();
        }

        let mut parts = Vec::new();
        if !self.constructs.is_empty() {
            let names: Vec<&str> = self.constructs.iter().map(|c| c.description()).collect();
            parts.push(format!("contains {}", names.join(", ")));
        }
        if !self.unlisted.is_empty() {
            parts.push(format!("not allow-listed: {}", self.unlisted.join(", ")));
        }
        parts.join("; ")
    }
}

/// Decide a command line against an allow-list of base command names
pub fn decide<S: AsRef<str>>(command: &str, allowed: &[S]) -> CommandDecision {
    CommandPolicy::new(allowed.iter().map(|s| s.as_ref())).decide(command)
}

/// Allow-list of base command names
#[derive(Debug, Clone, Default)]
pub struct CommandPolicy {
    allowed: Vec<String>,
    /// Check commands nested in `$( )` / backticks against the allow-list
    /// instead of always asking
    trust_nested_substitutions: bool,
}

impl CommandPolicy {
    /// Create a policy from allow-listed command names
    pub fn new<I>(allowed: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut policy = Self::default();
        for name in allowed {
            policy.allow(name);
        }
        policy
    }

    /// Evaluate plain substitutions by their nested commands
    pub fn with_trust_nested_substitutions(mut self, trust: bool) -> Self {
        self.trust_nested_substitutions = trust;
        self
    }

    /// Add a command name to the allow-list
    pub fn allow(&mut self, name: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() || self.allowed.iter().any(|a| a == name) {
            return;
        }
        tracing::debug!("Allow-listing command: {}", name);
        self.allowed.push(name.to_string());
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// Whether a single base command name is allow-listed
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.iter().any(|a| a == WILDCARD || a == name)
    }

    /// Evaluate a command line
    pub fn evaluate(&self, command: &str) -> CommandVerdict {
        if command.trim().is_empty() {
            return CommandVerdict {
                decision: CommandDecision::AskUser,
                commands: Vec::new(),
                constructs: Vec::new(),
                unlisted: Vec::new(),
            };
        }

        let constructs: Vec<DangerousConstruct> = find_dangerous_constructs(command)
            .into_iter()
            .filter(|c| !(self.trust_nested_substitutions && c.is_plain_substitution()))
            .collect();

        let commands = extract_base_commands(command);
        let unlisted: Vec<String> = commands
            .iter()
            .filter(|name| !self.is_allowed(name))
            .cloned()
            .collect();

        let decision = if constructs.is_empty() && unlisted.is_empty() {
            CommandDecision::AutoApprove
        } else {
            CommandDecision::AskUser
        };

        let verdict = CommandVerdict {
            decision,
            commands,
            constructs,
            unlisted,
        };
        tracing::debug!("Command '{}' evaluated: {}", command, verdict.reason());
        verdict
    }

    pub fn decide(&self, command: &str) -> CommandDecision {
        self.evaluate(command).decision
    }
}
