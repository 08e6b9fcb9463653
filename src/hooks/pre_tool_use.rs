//! Pre-tool-use gate
//!
//! One synchronous decision per proposed tool call. The checks run in a
//! fixed order and stop at the first that decides:
//!
//! 1. Intent required but none selected - block
//! 2. Intent unknown or not active - block; a different intent rebinds the
//!    session selection
//! 3. Target path outside the intent's scope - block
//! 4. Shell command not provably safe - ask
//! 5. First mutation under the selection - inject context
//! 6. Otherwise allow
//!
//! The gate never writes the intents manifest. Its only side effects are on
//! the session: the rebind in step 2 and the injection flag and budget in
//! step 5.

use crate::context::ContextInjector;
use crate::core::{GateError, GateResult};
use crate::intents::{Intent, IntentStore, ScopeDecision, ScopeMatcher};
use crate::permissions::{CommandDecision, CommandPolicy};
use crate::session::GateSession;
use crate::tools::ToolRegistry;

use super::types::{HookDecision, ToolCall};

/// The pre-tool-use authorization gate
#[derive(Debug, Default)]
pub struct PreToolUseHook {
    tools: ToolRegistry,
    scope: ScopeMatcher,
    commands: CommandPolicy,
    injector: ContextInjector,
}

impl PreToolUseHook {
    /// Create a gate with the default tool registry, no command allow-list
    /// and an injector without optional sources
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_scope_matcher(mut self, scope: ScopeMatcher) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_command_policy(mut self, commands: CommandPolicy) -> Self {
        self.commands = commands;
        self
    }

    pub fn with_injector(mut self, injector: ContextInjector) -> Self {
        self.injector = injector;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn command_policy(&self) -> &CommandPolicy {
        &self.commands
    }

    /// Decide a tool call
    pub fn decide(
        &self,
        store: &IntentStore,
        session: &mut GateSession,
        call: &ToolCall,
    ) -> HookDecision {
        let decision = match self.authorize(store, session, call) {
            Ok(decision) => decision,
            Err(e) => HookDecision::from_error(&e).unwrap_or_else(|| {
                // Not a gate taxonomy error; a human decides
                tracing::warn!("Gate check for {} failed: {}", call.tool_name, e);
                HookDecision::ask(format!("Gate could not evaluate the call: {}", e))
            }),
        };

        match &decision {
            HookDecision::Allow => tracing::info!("Allow {}", call.tool_name),
            HookDecision::Ask { message } => {
                tracing::info!("Ask for {}: {}", call.tool_name, message)
            }
            HookDecision::Block { kind, message } => {
                tracing::warn!("Block {} ({}): {}", call.tool_name, kind, message)
            }
            HookDecision::Inject { context } => tracing::info!(
                "Allow {} with injected context ({} chars)",
                call.tool_name,
                context.chars().count()
            ),
        }
        decision
    }

    fn authorize(
        &self,
        store: &IntentStore,
        session: &mut GateSession,
        call: &ToolCall,
    ) -> GateResult<HookDecision> {
        let classifier = self.tools.get(&call.tool_name);

        let intent_id = call
            .intent_id
            .clone()
            .or_else(|| session.selected_intent_id().map(str::to_string));

        if classifier.requires_intent() && intent_id.is_none() {
            return Err(GateError::IntentNotSelected {
                tool: call.tool_name.clone(),
            });
        }

        let intent = match &intent_id {
            Some(id) => Some(self.resolve(store, session, id)?),
            None => None,
        };

        if let (Some(raw), Some(intent)) = (classifier.target_path(&call.tool_args), intent) {
            if let ScopeDecision::Deny(reason) = self.scope.authorize(&raw, &intent.owned_scope) {
                return Err(GateError::ScopeViolation {
                    intent_id: intent.id.clone(),
                    path: self.scope.normalize(&raw),
                    tool: call.tool_name.clone(),
                    reason,
                });
            }
        }

        if let Some(command) = classifier.command(&call.tool_args) {
            let verdict = self.commands.evaluate(&command);
            if verdict.decision == CommandDecision::AskUser {
                return Ok(HookDecision::ask(format!(
                    "Command needs confirmation: {}",
                    verdict.reason()
                )));
            }
        }

        match intent {
            Some(intent) if classifier.is_mutation() && !session.context_injected() => {
                let context = self.injector.inject(intent, session.budget_mut());
                session.mark_context_injected();
                Ok(HookDecision::inject(context))
            }
            _ => Ok(HookDecision::allow()),
        }
    }

    /// Look up an intent that must be active, rebinding the session to it
    fn resolve<'s>(
        &self,
        store: &'s IntentStore,
        session: &mut GateSession,
        intent_id: &str,
    ) -> GateResult<&'s Intent> {
        let intent = store.get_by_id(intent_id)?;
        if !intent.is_active() {
            return Err(GateError::invalid_state(intent_id, intent.status, "active"));
        }
        session.rebind(intent_id);
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{TokenBudget, OUT_OF_BUDGET_MARKER};
    use crate::hooks::BlockKind;
    use crate::intents::{IntentScope, IntentStatus};

    fn store() -> IntentStore {
        IntentStore::in_memory(vec![
            Intent::new("INT-001", "Weather API")
                .with_status(IntentStatus::Active)
                .with_scope(IntentScope::new(["src/**"], ["src/secret/**"]))
                .with_constraint("No new dependencies"),
            Intent::new("INT-002", "Docs")
                .with_status(IntentStatus::Active)
                .with_scope(IntentScope::new(["docs/**"], Vec::<String>::new())),
            Intent::new("INT-003", "Later"),
            Intent::new("INT-004", "Shipped").with_status(IntentStatus::Completed),
        ])
        .unwrap()
    }

    fn session() -> GateSession {
        GateSession::new("sess", TokenBudget::new(2000))
    }

    fn gate() -> PreToolUseHook {
        PreToolUseHook::new().with_command_policy(CommandPolicy::new(["git", "ls", "cargo"]))
    }

    fn write(path: &str) -> ToolCall {
        ToolCall::new("write_to_file").with_arg("path", path)
    }

    fn kind(decision: &HookDecision) -> Option<BlockKind> {
        match decision {
            HookDecision::Block { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[test]
    fn test_mutation_without_intent_blocks() {
        let decision = gate().decide(&store(), &mut session(), &write("src/a.ts"));
        assert_eq!(kind(&decision), Some(BlockKind::IntentNotSelected));
    }

    #[test]
    fn test_read_without_intent_allows() {
        let call = ToolCall::new("read_file").with_arg("path", "anywhere/x.md");
        assert_eq!(
            gate().decide(&store(), &mut session(), &call),
            HookDecision::Allow
        );
    }

    #[test]
    fn test_unknown_and_inactive_intents_block() {
        let (gate, store) = (gate(), store());
        let mut session = session();

        let d = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-999"));
        assert_eq!(kind(&d), Some(BlockKind::NotFound));

        let d = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-003"));
        assert_eq!(kind(&d), Some(BlockKind::InvalidState));

        let d = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-004"));
        assert_eq!(kind(&d), Some(BlockKind::InvalidState));
        assert!(session.selected().is_none());
    }

    #[test]
    fn test_scope_enforcement() {
        let (gate, store) = (gate(), store());
        let mut session = session();

        let d = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-001"));
        assert!(matches!(d, HookDecision::Inject { .. }));

        let d = gate.decide(
            &store,
            &mut session,
            &write("src/secret/a.ts").with_intent("INT-001"),
        );
        match d {
            HookDecision::Block { kind, message } => {
                assert_eq!(kind, BlockKind::ScopeViolation);
                assert!(message.contains("INT-001"));
                assert!(message.contains("src/secret/a.ts"));
                assert!(message.contains("write_to_file"));
            }
            other => panic!("expected block, got {:?}", other),
        }

        let d = gate.decide(&store, &mut session, &write("other/a.ts").with_intent("INT-001"));
        assert_eq!(kind(&d), Some(BlockKind::ScopeViolation));
    }

    #[test]
    fn test_read_outside_scope_blocks_under_intent() {
        let mut session = session();
        let call = ToolCall::new("read_file")
            .with_arg("path", "README.md")
            .with_intent("INT-001");
        let d = gate().decide(&store(), &mut session, &call);
        assert_eq!(kind(&d), Some(BlockKind::ScopeViolation));
    }

    #[test]
    fn test_inject_exactly_once_per_selection() {
        let (gate, store) = (gate(), store());
        let mut session = session();

        let first = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-001"));
        match &first {
            HookDecision::Inject { context } => {
                assert!(context.contains("INT-001"));
                assert!(context.contains("No new dependencies"));
            }
            other => panic!("expected inject, got {:?}", other),
        }

        // Falls back to the session selection
        let second = gate.decide(&store, &mut session, &write("src/b.ts"));
        assert_eq!(second, HookDecision::Allow);
    }

    #[test]
    fn test_switching_intent_reinjects() {
        let (gate, store) = (gate(), store());
        let mut session = session();

        gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-001"));
        let d = gate.decide(&store, &mut session, &write("docs/x.md").with_intent("INT-002"));
        assert!(matches!(d, HookDecision::Inject { .. }));
        assert_eq!(session.selected_intent_id(), Some("INT-002"));

        let d = gate.decide(&store, &mut session, &write("src/a.ts").with_intent("INT-001"));
        assert!(matches!(d, HookDecision::Inject { .. }));
    }

    #[test]
    fn test_blocked_call_does_not_consume_injection() {
        let (gate, store) = (gate(), store());
        let mut session = session();

        let d = gate.decide(&store, &mut session, &write("../etc/x").with_intent("INT-001"));
        assert!(d.is_block());
        assert!(!session.context_injected());
        assert_eq!(session.budget().consumed(), 0);

        let d = gate.decide(&store, &mut session, &write("src/a.ts"));
        assert!(matches!(d, HookDecision::Inject { .. }));
    }

    #[test]
    fn test_commands() {
        let (gate, store) = (gate(), store());
        let mut session = session();
        session.rebind("INT-001");

        let run = |cmd: &str| ToolCall::new("execute_command").with_arg("command", cmd);

        assert_eq!(
            gate.decide(&store, &mut session, &run("git status && ls")),
            HookDecision::Allow
        );
        match gate.decide(&store, &mut session, &run("git status; rm -rf /")) {
            HookDecision::Ask { message } => assert!(message.contains("rm")),
            other => panic!("expected ask, got {:?}", other),
        }
        assert!(matches!(
            gate.decide(&store, &mut session, &run("echo $(whoami)")),
            HookDecision::Ask { .. }
        ));
    }

    #[test]
    fn test_command_without_intent_blocks_first() {
        let call = ToolCall::new("execute_command").with_arg("command", "rm -rf /");
        let d = gate().decide(&store(), &mut session(), &call);
        assert_eq!(kind(&d), Some(BlockKind::IntentNotSelected));
    }

    #[test]
    fn test_unknown_tool_is_scope_checked_but_never_injects() {
        let (gate, store) = (gate(), store());
        let mut session = session();
        let call = ToolCall::new("custom_tool")
            .with_arg("file_path", "src/a.ts")
            .with_intent("INT-001");
        assert_eq!(gate.decide(&store, &mut session, &call), HookDecision::Allow);

        let call = ToolCall::new("custom_tool")
            .with_arg("file_path", "lib/a.ts")
            .with_intent("INT-001");
        assert_eq!(
            kind(&gate.decide(&store, &mut session, &call)),
            Some(BlockKind::ScopeViolation)
        );
    }

    #[test]
    fn test_exhausted_budget_still_injects_marker() {
        let store = store();
        let mut session = GateSession::new("s", TokenBudget::new(0));
        let d = gate().decide(&store, &mut session, &write("src/a.ts").with_intent("INT-001"));
        assert_eq!(d, HookDecision::inject(OUT_OF_BUDGET_MARKER));
        assert!(session.context_injected());
    }
}
