//! Delete command implementation.

use anyhow::Result;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::cleaner::{DeleteEngine, DeleteEvent, DeletionOutcome, DeletionRequest};
use crate::cli::DeleteArgs;
use crate::config::Config;
use crate::scanner::{ScanEngine, ScanResult, ScanTarget};

use super::scan::shorten;

#[derive(Debug, Serialize)]
struct DeleteReport<'a> {
    outcomes: &'a [DeletionOutcome],
    freed_bytes: u64,
    error: Option<String>,
}

/// Run the delete command.
pub fn run(args: DeleteArgs, config: &Config, quiet: bool) -> Result<()> {
    let targets: Vec<ScanTarget> = args.paths.iter().map(|p| ScanTarget::from_path(p)).collect();

    // Measure first so the progress bar has a total and the summary a size
    let sizes: HashMap<PathBuf, ScanResult> = ScanEngine::new(config.scan_options())
        .scan(targets)?
        .wait()?
        .into_iter()
        .map(|r| (r.root_path.clone(), r))
        .collect();

    let requests: Vec<DeletionRequest> = args
        .paths
        .iter()
        .map(|p| {
            let expected = sizes.get(p).map(|r| r.file_count).unwrap_or(0);
            DeletionRequest::new(p.clone(), expected)
        })
        .collect();

    if !args.json {
        print_requests(&requests, &sizes);
    }

    if !args.force && config.delete.confirm {
        print!("\nProceed with deletion? [y/N] ");
        io::stdout().flush()?;

        if !confirm(io::stdin().lock())? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let expected_total: u64 = requests.iter().map(|r| r.expected_file_count).sum();
    let bar = if args.json || quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(expected_total);
        pb.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files | {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        pb
    };

    tracing::info!(roots = requests.len(), files = expected_total, "Deleting roots");

    let mut batch = DeleteEngine::new(config.delete_options()).delete(requests)?;
    let mut outcomes = Vec::new();
    let mut deleted_before = 0u64;

    for event in batch.by_ref() {
        match event {
            DeleteEvent::RootStarted(request) => {
                bar.set_message(request.root_path.display().to_string());
            }
            DeleteEvent::Progress(progress) => {
                bar.set_position(deleted_before + progress.files_deleted_so_far);
            }
            DeleteEvent::Outcome(outcome) => {
                let expected = sizes
                    .get(&outcome.root_path)
                    .map(|r| r.file_count)
                    .unwrap_or(0);
                deleted_before += expected;
                bar.set_position(deleted_before);
            }
            DeleteEvent::BatchFinished { outcomes: all } => outcomes = all,
        }
    }

    bar.finish_and_clear();

    // Outcomes were delivered either way; the error only says the batch stopped early
    let fatal = batch.wait().err();
    let freed = freed_bytes(&outcomes, &sizes);

    if args.json {
        let report = DeleteReport {
            outcomes: &outcomes,
            freed_bytes: freed,
            error: fatal.as_ref().map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&outcomes, freed);
    }

    for outcome in outcomes.iter().filter(|o| !o.succeeded) {
        eprintln!(
            "  Error deleting {}: {} entr{} left behind",
            outcome.root_path.display(),
            outcome.failed_entry_count,
            if outcome.failed_entry_count == 1 { "y" } else { "ies" }
        );
    }
    if let Some(err) = &fatal {
        eprintln!("Deletion stopped: {}", err);
    }

    if fatal.is_some() || outcomes.iter().any(|o| !o.succeeded) {
        std::process::exit(5); // Partial failure
    }

    Ok(())
}

/// Read one answer line; only `y` or `Y` confirms.
pub fn confirm<R: BufRead>(mut input: R) -> io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("y"))
}

/// Bytes freed by roots that were fully removed, as measured before deletion.
pub fn freed_bytes(outcomes: &[DeletionOutcome], sizes: &HashMap<PathBuf, ScanResult>) -> u64 {
    outcomes
        .iter()
        .filter(|o| o.succeeded)
        .filter_map(|o| sizes.get(&o.root_path))
        .map(|r| r.total_bytes)
        .sum()
}

fn print_requests(requests: &[DeletionRequest], sizes: &HashMap<PathBuf, ScanResult>) {
    println!("\n  {:<60} {:>10} {:>8}", "PATH", "SIZE", "FILES");
    println!("  {}", "─".repeat(80));

    let mut total = 0u64;
    for request in requests {
        let bytes = sizes
            .get(&request.root_path)
            .map(|r| r.total_bytes)
            .unwrap_or(0);
        total += bytes;

        println!(
            "  {:<60} {:>10} {:>8}",
            shorten(&request.root_path.display().to_string(), 58),
            format_size(bytes, BINARY),
            request.expected_file_count
        );
    }

    println!(
        "\nTotal: {} in {} director{}",
        format_size(total, BINARY),
        requests.len(),
        if requests.len() == 1 { "y" } else { "ies" }
    );
}

fn print_summary(outcomes: &[DeletionOutcome], freed: u64) {
    let summary = DeleteEngine::summarize(outcomes);

    println!("\nResults:");
    println!(
        "  Deleted: {} director{}",
        summary.success_count,
        if summary.success_count == 1 { "y" } else { "ies" }
    );
    if summary.failed_count > 0 {
        println!(
            "  Failed:  {} director{}",
            summary.failed_count,
            if summary.failed_count == 1 { "y" } else { "ies" }
        );
    }
    println!("  Entries: {}", summary.removed_entries);
    println!("  Freed:   {}", format_size(freed, BINARY));
}
