//! Intent records
//!
//! An intent is a declared unit of work: an id, a human name, a lifecycle
//! status, the file scope it owns, and the constraints and acceptance
//! criteria injected into the agent's context when work starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an intent
///
/// `Pending` → `Active` (on selection) → `Completed` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Active,
    Completed,
}

impl IntentStatus {
    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntentStatus::Completed)
    }

    /// Whether an intent in this status may be selected
    pub fn is_selectable(&self) -> bool {
        matches!(self, IntentStatus::Pending | IntentStatus::Active)
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentStatus::Pending => write!(f, "pending"),
            IntentStatus::Active => write!(f, "active"),
            IntentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for IntentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(IntentStatus::Pending),
            "active" => Ok(IntentStatus::Active),
            "completed" => Ok(IntentStatus::Completed),
            other => Err(format!("unknown intent status: {}", other)),
        }
    }
}

/// Include/exclude glob patterns owned by an intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentScope {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl IntentScope {
    /// Create a scope from include and exclude pattern lists
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            include: include.into_iter().map(Into::into).collect(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    /// A scope that authorizes every path
    pub fn everything() -> Self {
        Self::new(["**"], Vec::<String>::new())
    }
}

/// A declared unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique id (e.g. "INT-001")
    pub id: String,

    /// Human-readable name
    pub name: String,

    pub status: IntentStatus,

    /// Files this intent is allowed to touch
    #[serde(default)]
    pub owned_scope: IntentScope,

    #[serde(default)]
    pub constraints: Vec<String>,

    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Intent {
    /// Create a new pending intent with an empty scope
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            status: IntentStatus::Pending,
            owned_scope: IntentScope::default(),
            constraints: Vec::new(),
            acceptance_criteria: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the owned scope
    pub fn with_scope(mut self, scope: IntentScope) -> Self {
        self.owned_scope = scope;
        self
    }

    /// Add a constraint
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Add an acceptance criterion
    pub fn with_acceptance(mut self, criterion: impl Into<String>) -> Self {
        self.acceptance_criteria.push(criterion.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == IntentStatus::Active
    }
}
