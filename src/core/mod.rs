//! Core types for the gate
//!
//! - `GateError` / `GateResult` - Error taxonomy shared by every component
//! - `OrchestrationLayout` - Where the sidecar files live in a workspace

pub mod error;
pub mod layout;

pub use error::{GateError, GateResult};
pub use layout::OrchestrationLayout;
