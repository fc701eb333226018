//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Math answer evaluator
#[derive(Parser, Debug)]
#[command(name = "mathtextd")]
#[command(about = "Evaluates student replies against expected math answers", long_about = None)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Config file (overrides /etc/mathtext/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rule cascade only, never call the classifier
    #[arg(long, global = true)]
    pub offline: bool,

    /// Do not write verdicts to the verdict log
    #[arg(long, global = true)]
    pub no_log: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a single reply and print the verdict as JSON
    Eval {
        /// What the student typed
        #[arg(long)]
        message: String,

        /// Answer to the question that was asked
        #[arg(long)]
        expected: String,
    },

    /// Evaluate JSON lines of {"student_message", "expected_answer"}
    Batch {
        /// Input file (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Print the effective configuration
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eval() {
        let cli = Cli::try_parse_from([
            "mathtextd", "--offline", "eval", "--message", "ten", "--expected", "10",
        ])
        .unwrap();
        assert!(cli.offline);
        assert!(!cli.no_log);
        match cli.command {
            Commands::Eval { message, expected } => {
                assert_eq!(message, "ten");
                assert_eq!(expected, "10");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["mathtextd", "batch", "--no-log", "--config", "/tmp/m.toml"])
            .unwrap();
        assert!(cli.no_log);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
        assert!(matches!(cli.command, Commands::Batch { input: None }));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["mathtextd"]).is_err());
    }
}
