//! Tool classification for the gate
//!
//! This module provides:
//! - `ToolClassifier` trait - What the gate needs to know about a tool
//! - `ToolProfile` - Declarative classifier (also loadable from config)
//! - `ToolRegistry` - Name to classifier map with a fallback for unknown tools

mod registry;
mod tool;

pub use registry::ToolRegistry;
pub use tool::{ToolArgs, ToolClassifier, ToolProfile, DEFAULT_PATH_FIELDS};
