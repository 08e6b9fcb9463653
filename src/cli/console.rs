use colored::*;

use crate::intents::{Intent, IntentStatus};
use crate::permissions::CommandVerdict;

/// Console handles human-facing terminal output with colored formatting
///
/// Hook subcommands never go through the console; their stdout is JSON.
pub struct Console {
    id_color: Color,
    selected_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            id_color: Color::Cyan,
            selected_color: Color::Green,
        }
    }

    /// Print the intent list, marking the selected one
    pub fn print_intents(&self, intents: &[Intent], selected: Option<&str>) {
        if intents.is_empty() {
            self.print_system("No intents declared");
            return;
        }
        for intent in intents {
            println!("{}", self.intent_line(intent, selected == Some(intent.id.as_str())));
        }
    }

    /// One line per intent: marker, id, status and name
    pub fn intent_line(&self, intent: &Intent, selected: bool) -> String {
        let marker = if selected {
            "*".color(self.selected_color).bold()
        } else {
            " ".normal()
        };
        format!(
            "{} {} {:<9} {}",
            marker,
            intent.id.color(self.id_color).bold(),
            status_label(intent.status),
            intent.name
        )
    }

    /// Print saved sessions with their selected intent
    pub fn print_sessions(&self, sessions: &[(String, Option<String>)]) {
        if sessions.is_empty() {
            self.print_system("No saved sessions");
            return;
        }
        for (id, selected) in sessions {
            let selected = match selected {
                Some(intent_id) => intent_id.color(self.id_color).bold(),
                None => "-".bright_black(),
            };
            println!("{:<20} {}", id, selected);
        }
    }

    /// Print the scope of a freshly selected intent
    pub fn print_selected(&self, intent: &Intent) {
        println!(
            "{} {} ({})",
            "Selected:".color(self.selected_color).bold(),
            intent.id.color(self.id_color).bold(),
            intent.name
        );
        for pattern in &intent.owned_scope.include {
            println!("  {} {}", "+".green(), pattern);
        }
        for pattern in &intent.owned_scope.exclude {
            println!("  {} {}", "-".red(), pattern);
        }
    }

    /// Print the evaluation of a command line
    pub fn print_verdict(&self, command: &str, verdict: &CommandVerdict) {
        println!("{}", self.verdict_line(verdict));
        println!("  {} {}", "command:".bright_black(), command);
        if !verdict.commands.is_empty() {
            println!("  {} {}", "invokes:".bright_black(), verdict.commands.join(", "));
        }
        if !verdict.is_approved() {
            println!("  {} {}", "reason:".bright_black(), verdict.reason());
        }
    }

    pub fn verdict_line(&self, verdict: &CommandVerdict) -> String {
        if verdict.is_approved() {
            format!("{}", "✓ auto-approve".green().bold())
        } else {
            format!("{}", "? ask user".yellow().bold())
        }
    }

    /// Print a system message
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

fn status_label(status: IntentStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        IntentStatus::Pending => label.yellow(),
        IntentStatus::Active => label.green(),
        IntentStatus::Completed => label.bright_black(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::CommandPolicy;

    #[test]
    fn test_intent_line_contents() {
        let console = Console::new();
        let intent = Intent::new("INT-007", "Refactor parser").with_status(IntentStatus::Active);

        let line = console.intent_line(&intent, true);
        assert!(line.contains("INT-007"));
        assert!(line.contains("active"));
        assert!(line.contains("Refactor parser"));
        assert!(line.contains('*'));
        assert!(!console.intent_line(&intent, false).contains('*'));
    }

    #[test]
    fn test_verdict_line() {
        let console = Console::new();
        let policy = CommandPolicy::new(["ls"]);
        assert!(console.verdict_line(&policy.evaluate("ls")).contains("auto-approve"));
        assert!(console.verdict_line(&policy.evaluate("rm x")).contains("ask user"));
    }
}
