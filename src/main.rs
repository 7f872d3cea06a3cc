use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use rusty_reaper::cli::{Cli, Command};
use rusty_reaper::commands;
use rusty_reaper::config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging based on verbosity; the command line wins over the config file
    let log_file = cli.log_file.as_deref().or(config.log.file.as_deref());
    init_logging(cli.verbose, cli.quiet, log_file)?;

    tracing::debug!(?config, "Loaded configuration");

    // Dispatch to subcommand
    match cli.command {
        Command::Scan(args) => {
            tracing::info!(?args, "Starting scan");
            commands::scan::run(args, &config, cli.quiet)?;
        }
        Command::Delete(args) => {
            tracing::info!(?args, "Starting delete");
            commands::delete::run(args, &config, cli.quiet)?;
        }
        Command::Completions(args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "rusty-reaper",
                &mut io::stdout(),
            );
        }
    }

    Ok(())
}

fn init_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if quiet {
        "warn"
    } else {
        match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rusty_reaper={}", level)));

    // Truncated on every run
    let file = log_file
        .map(|path| {
            File::create(path).with_context(|| format!("cannot open log file {}", path.display()))
        })
        .transpose()?;

    let stderr_layer = file
        .is_none()
        .then(|| fmt::layer().with_target(false).with_writer(io::stderr));
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();

    Ok(())
}
