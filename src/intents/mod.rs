//! Intents: declared units of work and the files they own
//!
//! - `Intent` / `IntentStatus` / `IntentScope` - The persisted record
//! - `IntentStore` - Manifest-backed lookup and status transitions
//! - `ScopeMatcher` - Include/exclude glob authorization of file paths

mod intent;
pub mod scope;
mod store;

pub use intent::{Intent, IntentScope, IntentStatus};
pub use scope::{authorize, normalize_path, ScopeDecision, ScopeMatcher};
pub use store::IntentStore;
