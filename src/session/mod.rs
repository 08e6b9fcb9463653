//! Gate sessions
//!
//! This module provides `GateSession`, the session-scoped owner of the
//! current intent selection, its `context_injected` flag and the context
//! token budget, plus `SessionStorage` for sharing that state between hook
//! invocations.

pub mod metadata;
pub mod session;
pub mod storage;

pub use metadata::{Selection, SessionState};
pub use session::GateSession;
pub use storage::SessionStorage;
