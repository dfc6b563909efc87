// xwalk CLI - batch driver for the CEEB↔NCES crosswalk pipeline

mod exit_codes;
mod fetch;
mod run;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_RUN_RUNTIME, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "xwalk")]
#[command(about = "Build a CEEB ↔ NCES school identifier crosswalk")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the linkage pipeline from a TOML config file
    #[command(after_help = "\
Examples:
  xwalk run crosswalk.toml
  xwalk run crosswalk.toml --json
  xwalk run crosswalk.toml --output result.json")]
    Run {
        /// Path to the .toml config file
        config: std::path::PathBuf,

        /// Output JSON result to stdout instead of human summary
        #[arg(long)]
        json: bool,

        /// Write JSON result to file
        #[arg(long)]
        output: Option<std::path::PathBuf>,
    },

    /// Validate a config without running
    Validate {
        /// Path to the .toml config file
        config: std::path::PathBuf,
    },

    /// Pull candidate data from external sources into the local cache
    #[command(subcommand)]
    Fetch(fetch::FetchCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, json, output } => run::cmd_run(config, json, output),
        Commands::Validate { config } => run::cmd_validate(config),
        Commands::Fetch(cmd) => fetch::cmd_fetch(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_RUN_RUNTIME, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
