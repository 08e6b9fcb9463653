//! Shell command safety
//!
//! Decides whether a shell command line proposed by the agent can run
//! without confirmation:
//! - `substitution` - Detection of constructs that hide execution
//! - `commands` - Extraction of the base commands a line invokes
//! - `policy` - Allow-list decision combining both
//!
//! ## Example
//!
//! ```rust,ignore
//! use intent_gate::permissions::{CommandDecision, CommandPolicy};
//!
//! let policy = CommandPolicy::new(["git", "ls"]);
//! assert_eq!(policy.decide("git status && ls"), CommandDecision::AutoApprove);
//! assert_eq!(policy.decide("git status && rm -rf ."), CommandDecision::AskUser);
//! ```

pub mod commands;
mod policy;
pub mod substitution;

pub use commands::extract_base_commands;
pub use policy::{decide, CommandDecision, CommandPolicy, CommandVerdict, WILDCARD};
pub use substitution::{contains_dangerous_substitution, find_dangerous_constructs, DangerousConstruct};
