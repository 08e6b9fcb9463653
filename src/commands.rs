use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use intent_gate::cli::Console;
use intent_gate::hooks::{HookDecision, ToolCall, ToolOutcome};
use intent_gate::IntentGate;

#[derive(Subcommand)]
pub enum Commands {
    /// Decide a proposed tool call (JSON payload on stdin, decision on stdout)
    PreToolUse,
    /// Record the outcome of a tool call (JSON payload on stdin)
    PostToolUse,
    /// Select an intent for the session
    Select {
        /// Intent id
        intent_id: String,
    },
    /// Mark an intent completed
    Complete {
        /// Intent id
        intent_id: String,
    },
    /// Drop the session's selection
    Clear,
    /// List declared intents
    List,
    /// List saved sessions
    Sessions,
    /// Delete the session's saved state
    Forget,
    /// Check a shell command against the allow-list
    CheckCommand {
        /// Command line to evaluate
        command: String,
    },
}

/// Payload an agent host sends to the hook subcommands
#[derive(Debug, Deserialize)]
struct HookPayload {
    /// Overrides `--session`
    #[serde(default)]
    session_id: Option<String>,

    #[serde(flatten)]
    call: ToolCall,

    /// Post-tool-use only; a missing outcome means success
    #[serde(default)]
    outcome: Option<ToolOutcome>,
}

#[derive(Debug, Serialize)]
struct RecordResponse {
    recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Commands {
    pub fn run(self, workspace: PathBuf, session: String) -> anyhow::Result<()> {
        let console = Console::new();

        match self {
            Commands::PreToolUse => {
                let mut input = String::new();
                let decision = match std::io::stdin().read_to_string(&mut input) {
                    Ok(_) => decide_payload(&workspace, &session, &input),
                    Err(e) => unevaluated(&anyhow::Error::new(e)),
                };
                println!("{}", serde_json::to_string(&decision)?);
            }
            Commands::PostToolUse => {
                let gate = IntentGate::open(&workspace)?;
                let payload = read_payload()?;
                let session = payload.session_id.unwrap_or(session);
                let outcome = payload.outcome.unwrap_or(ToolOutcome::Success);
                let record = gate.post_tool_use(&session, &payload.call, &outcome)?;
                let response = RecordResponse {
                    recorded: record.is_some(),
                    trace_id: record.map(|r| r.id.to_string()),
                };
                println!("{}", serde_json::to_string(&response)?);
            }
            Commands::Select { intent_id } => {
                let mut gate = IntentGate::open(&workspace)?;
                let intent = gate.select(&session, &intent_id)?;
                console.print_selected(&intent);
            }
            Commands::Complete { intent_id } => {
                let mut gate = IntentGate::open(&workspace)?;
                gate.complete(&session, &intent_id)?;
                console.print_system(&format!("Intent {} completed", intent_id));
            }
            Commands::Clear => {
                let gate = IntentGate::open(&workspace)?;
                gate.clear(&session)?;
                console.print_system(&format!("Session {} has no selection", session));
            }
            Commands::List => {
                let gate = IntentGate::open(&workspace)?;
                let state = gate.session(&session)?;
                console.print_intents(gate.intents(), state.selected_intent_id());
            }
            Commands::Sessions => {
                let gate = IntentGate::open(&workspace)?;
                let mut rows = Vec::new();
                for id in gate.sessions()? {
                    let selected = gate.session(&id)?.selected_intent_id().map(str::to_string);
                    rows.push((id, selected));
                }
                console.print_sessions(&rows);
            }
            Commands::Forget => {
                let gate = IntentGate::open(&workspace)?;
                if gate.forget(&session)? {
                    console.print_system(&format!("Session {} forgotten", session));
                } else {
                    console.print_system(&format!("Session {} has no saved state", session));
                }
            }
            Commands::CheckCommand { command } => {
                let gate = IntentGate::open(&workspace)?;
                let verdict = gate.check_command(&command);
                console.print_verdict(&command, &verdict);
            }
        }

        Ok(())
    }
}

/// Decide a pre-tool-use payload; any failure to evaluate becomes an ask
/// so the host always receives a decision
fn decide_payload(workspace: &Path, session: &str, input: &str) -> HookDecision {
    let decide = || -> anyhow::Result<HookDecision> {
        let gate = IntentGate::open(workspace)?;
        let payload = parse_payload(input)?;
        let session = payload.session_id.as_deref().unwrap_or(session);
        let decision = gate.pre_tool_use(session, &payload.call)?;
        tracing::info!(
            "{} on {}: {}",
            if decision.permits_execution() { "Permitted" } else { "Held" },
            payload.call.tool_name,
            serde_json::to_string(&decision)?
        );
        Ok(decision)
    };
    decide().unwrap_or_else(|e| unevaluated(&e))
}

fn unevaluated(error: &anyhow::Error) -> HookDecision {
    tracing::error!("Could not evaluate tool call: {:#}", error);
    HookDecision::ask(format!("Gate could not evaluate the call: {:#}", error))
}

fn read_payload() -> anyhow::Result<HookPayload> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    parse_payload(&input)
}

fn parse_payload(input: &str) -> anyhow::Result<HookPayload> {
    let value: Value = serde_json::from_str(input)?;
    tracing::debug!("Hook payload: {}", value);
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intent_gate::core::OrchestrationLayout;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
active_intents:
  - id: INT-001
    name: Build weather API
    status: active
    owned_scope:
      include: ["src/**"]
"#;

    fn workspace(manifest: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let layout = OrchestrationLayout::new(temp.path());
        layout.ensure_dirs().unwrap();
        std::fs::write(layout.intents_file(), manifest).unwrap();
        temp
    }

    const WRITE: &str = r#"{"tool_name": "write_to_file", "tool_input": {"path": "src/a.rs"}}"#;

    #[test]
    fn test_malformed_manifest_asks() {
        let temp = workspace("active_intents: [ {id: ");
        let decision = decide_payload(temp.path(), "s", WRITE);
        match decision {
            HookDecision::Ask { message } => assert!(message.contains("could not evaluate")),
            other => panic!("expected ask, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_payload_asks() {
        let temp = workspace(MANIFEST);
        for input in ["", "not json", r#"{"tool_input": {}}"#] {
            let decision = decide_payload(temp.path(), "s", input);
            assert!(matches!(decision, HookDecision::Ask { .. }), "{}: {:?}", input, decision);
        }
    }

    #[test]
    fn test_invalid_config_asks() {
        let temp = workspace(MANIFEST);
        std::fs::write(
            OrchestrationLayout::new(temp.path()).config_file(),
            "chars_per_unit: 0\n",
        )
        .unwrap();
        assert!(matches!(
            decide_payload(temp.path(), "s", WRITE),
            HookDecision::Ask { .. }
        ));
    }

    #[test]
    fn test_valid_payload_is_decided() {
        let temp = workspace(MANIFEST);
        let decision = decide_payload(temp.path(), "s", WRITE);
        assert!(!matches!(decision, HookDecision::Ask { .. }), "{:?}", decision);
    }
}
