//! Hooks Module
//!
//! The two points where the gate sits around a tool call.
//!
//! # Hook Events
//!
//! | Event | When | Effect |
//! |-------|------|--------|
//! | `PreToolUse` | Before the tool executes | allow, ask, block or inject context |
//! | `PostToolUse` | After the tool ran | trace ledger and spatial map entries |
//!
//! # HookDecision
//!
//! | Variant | Effect |
//! |---------|--------|
//! | `Allow` | Run the tool |
//! | `Ask { message }` | A human confirms first |
//! | `Block { kind, message }` | Do not run; `kind` is the error taxonomy |
//! | `Inject { context }` | Run, handing the agent the intent context first |
//!
//! # Example
//!
//! ```ignore
//! use intent_gate::hooks::{PreToolUseHook, ToolCall};
//!
//! let gate = PreToolUseHook::new().with_command_policy(CommandPolicy::new(["git"]));
//! let call = ToolCall::new("write_to_file")
//!     .with_arg("path", "src/api/weather.ts")
//!     .with_intent("INT-001");
//! let decision = gate.decide(&store, &mut session, &call);
//! ```

mod post_tool_use;
mod pre_tool_use;
mod types;

pub use post_tool_use::{GitRevision, PostToolUseHook, RevisionSource, TraceLedger, TraceRecord};
pub use pre_tool_use::PreToolUseHook;
pub use types::{BlockKind, HookDecision, HookEvent, ToolCall, ToolOutcome};
