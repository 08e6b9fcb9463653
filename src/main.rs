use std::path::PathBuf;

use clap::Parser;

use intent_gate::core::OrchestrationLayout;
use intent_gate::logging::{self, LogFormat};

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(
    name = "intent-gate",
    version,
    about = "Pre-execution authorization gate for coding agents"
)]
struct Cli {
    /// Workspace root holding `.orchestration/`
    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Session id shared by hook invocations
    #[arg(long, global = true, default_value = "default")]
    session: String,

    /// Write JSON log lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    let layout = OrchestrationLayout::new(&cli.workspace);
    let _guard = logging::init_logging(layout.logs_dir(), format)?;

    tracing::debug!("=== intent-gate starting in {:?} ===", cli.workspace);

    let result = cli.command.run(cli.workspace, cli.session);
    if let Err(e) = &result {
        tracing::error!("intent-gate failed: {:#}", e);
    }
    result
}
