//! Context assembly for intent activation
//!
//! - `TokenBudget` - Heuristic cost accounting for injected text
//! - `ContextInjector` - Builds the `<intent_context>` block
//! - `SpatialIndex` / `KnowledgeSource` - Optional, best-effort inputs

pub mod budget;
mod injector;
pub mod sources;

pub use budget::{TokenBudget, OUT_OF_BUDGET_MARKER, TRUNCATION_MARKER};
pub use injector::{
    ContextInjector, SharedKnowledgeSource, SharedSpatialIndex, DEFAULT_KNOWLEDGE_TAIL_LINES,
    DEFAULT_RECENT_FILES_LIMIT,
};
pub use sources::{KnowledgeLog, KnowledgeSource, SpatialEntry, SpatialIndex, YamlSpatialMap};
