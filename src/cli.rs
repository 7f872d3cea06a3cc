use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Rusty Reaper - find large disposable directory trees and delete them
#[derive(Parser, Debug)]
#[command(name = "rusty-reaper")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to a file (truncated on every run)
    #[arg(long, global = true, value_name = "PATH", env = "RUSTY_REAPER_LOG")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Measure candidate directories concurrently
    Scan(ScanArgs),

    /// Delete directories after confirmation
    Delete(DeleteArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directories to measure
    pub paths: Vec<PathBuf>,

    /// Offer every subdirectory of DIR as a candidate (repeatable)
    #[arg(short, long = "base", value_name = "DIR")]
    pub base: Vec<PathBuf>,

    /// Parallel scan workers
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Directories to delete
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub force: bool,

    /// Output outcomes as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_scan_command() {
        let cli = Cli::parse_from(["rusty-reaper", "scan", "/home/a", "/home/b", "-b", "/cache"]);
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(
                    args.paths,
                    vec![PathBuf::from("/home/a"), PathBuf::from("/home/b")]
                );
                assert_eq!(args.base, vec![PathBuf::from("/cache")]);
                assert!(!args.json);
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn parse_delete_with_force() {
        let cli = Cli::parse_from(["rusty-reaper", "delete", "--force", "--json", "/tmp/x"]);
        match cli.command {
            Command::Delete(args) => {
                assert!(args.force);
                assert!(args.json);
                assert_eq!(args.paths, vec![PathBuf::from("/tmp/x")]);
            }
            _ => panic!("Expected Delete command"),
        }
    }

    #[test]
    fn delete_requires_paths() {
        assert!(Cli::try_parse_from(["rusty-reaper", "delete"]).is_err());
    }

    #[test]
    fn global_flags() {
        let cli = Cli::parse_from(["rusty-reaper", "-vvv", "--log-file", "/tmp/r.log", "scan"]);
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/r.log")));
    }
}
