pub mod core;
pub mod intents;
pub mod session;
pub mod permissions;
pub mod tools;

// Context assembly and budgeting
pub mod context;

// Optional components
pub mod cli;
pub mod config;
pub mod logging;

// Hooks around tool execution
pub mod hooks;

// Workspace-bound entry point
pub mod gate;

pub use gate::IntentGate;
