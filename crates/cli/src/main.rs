// shiftrev CLI - attribute billed revenue to staffed shifts

mod exit_codes;
mod logging;
mod recon;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;

#[derive(Parser)]
#[command(name = "shiftrev")]
#[command(about = "Reconcile staffing schedules against collections and report revenue per shift")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a staffing export against a collections export
    #[command(after_help = "\
Examples:
  shiftrev run shc.recon.toml
  shiftrev run shc.recon.toml --out reports/2020-01 --strict
  shiftrev run --staffing staffing.csv --collections collections.csv --out reports
  shiftrev run shc.recon.toml --json > result.json")]
    Run {
        /// Path to the .recon.toml config (built-in defaults when omitted)
        config: Option<PathBuf>,

        /// Staffing CSV (overrides [staffing] file)
        #[arg(long)]
        staffing: Option<PathBuf>,

        /// Collections CSV (overrides [collections] file)
        #[arg(long)]
        collections: Option<PathBuf>,

        /// Directory for the CSV reports (overrides [output] dir)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the full JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit 5 when rows were rejected or a facility is unknown
        #[arg(long)]
        strict: bool,

        /// Suppress the stderr summary and info logs
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Validate a recon config without running
    #[command(after_help = "\
Examples:
  shiftrev validate shc.recon.toml")]
    Validate {
        /// Path to the .recon.toml config
        config: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            staffing,
            collections,
            out,
            json,
            output,
            strict,
            quiet,
        } => {
            logging::init(quiet);
            recon::cmd_run(recon::RunArgs {
                config,
                staffing,
                collections,
                out,
                json,
                output,
                strict,
                quiet,
            })
        }
        Commands::Validate { config } => {
            logging::init(false);
            recon::cmd_validate(config)
        }
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
