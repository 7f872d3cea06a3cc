//! Scan command implementation

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::scanner::{discover_targets, ScanEngine, ScanEvent, ScanResult, ScanTarget};

/// One line of scan output.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRow {
    pub label: String,
    pub path: PathBuf,
    pub size: String,
    pub gigabytes: f64,
    pub total_bytes: u64,
    pub file_count: u64,
    /// Whole days since the root was last modified
    pub age_days: Option<u64>,
}

/// Display data the command keeps per root; the engine only knows paths.
#[derive(Debug, Clone, Default)]
pub struct RootInfo {
    pub label: String,
    pub last_modified: Option<SystemTime>,
}

/// Run the scan command
pub fn run(args: ScanArgs, config: &Config, quiet: bool) -> Result<()> {
    let targets = collect_targets(&args.paths, &args.base, &config.scan.base_paths)?;

    if targets.is_empty() {
        if args.json {
            println!("[]");
        } else {
            println!("No candidate directories found.");
        }
        return Ok(());
    }

    let mut options = config.scan_options();
    if let Some(jobs) = args.jobs {
        options = options.with_threads(jobs);
    }

    tracing::info!(roots = targets.len(), "Scanning candidates");

    let roots: HashMap<PathBuf, RootInfo> = targets
        .iter()
        .map(|t| {
            let info = RootInfo {
                label: t.label.clone(),
                last_modified: t.last_modified,
            };
            (t.root_path.clone(), info)
        })
        .collect();

    let spinner = if args.json || quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let total = targets.len();
    let mut batch = ScanEngine::new(options).scan(targets)?;
    let mut finals: Vec<ScanResult> = Vec::with_capacity(total);
    let mut done = 0usize;

    for event in batch.by_ref() {
        match event {
            ScanEvent::RootAdded { .. } => {}
            ScanEvent::Result(result) => {
                let (size, _) = result.humanize();
                spinner.set_message(format!(
                    "{}/{} done | {}: {}",
                    done,
                    total,
                    roots
                        .get(&result.root_path)
                        .map(|r| r.label.as_str())
                        .unwrap_or("?"),
                    size
                ));
                if result.complete {
                    done += 1;
                    finals.push(result);
                }
            }
            ScanEvent::Cancelled { root_path } => {
                done += 1;
                tracing::warn!(root = %root_path.display(), "Scan cancelled");
            }
            ScanEvent::Aborted { root_path, reason } => {
                done += 1;
                spinner.suspend(|| eprintln!("Error scanning {}: {}", root_path.display(), reason));
            }
        }
    }

    spinner.finish_and_clear();
    batch.wait()?;

    let rows = build_rows(&finals, &roots, SystemTime::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows);
    }

    Ok(())
}

/// Resolve explicit paths and base directories into scan targets.
///
/// Configured base paths are used only when the command line names nothing.
/// Without any of them, the subdirectories of the current directory are used.
pub fn collect_targets(
    paths: &[PathBuf],
    bases: &[PathBuf],
    configured: &[PathBuf],
) -> crate::error::Result<Vec<ScanTarget>> {
    let mut targets: Vec<ScanTarget> = paths.iter().map(|p| ScanTarget::from_path(p)).collect();

    let bases: Vec<&Path> = if paths.is_empty() && bases.is_empty() {
        if configured.is_empty() {
            vec![Path::new(".")]
        } else {
            configured.iter().map(PathBuf::as_path).collect()
        }
    } else {
        bases.iter().map(PathBuf::as_path).collect()
    };

    for base in bases {
        targets.extend(discover_targets(base)?);
    }

    // Same root listed twice would be measured twice
    let mut seen = std::collections::HashSet::new();
    targets.retain(|t| seen.insert(t.root_path.clone()));

    Ok(targets)
}

/// Rows sorted by size, largest first.
pub fn build_rows(
    results: &[ScanResult],
    roots: &HashMap<PathBuf, RootInfo>,
    now: SystemTime,
) -> Vec<ScanRow> {
    let mut rows: Vec<ScanRow> = results
        .iter()
        .map(|r| {
            let (size, gigabytes) = r.humanize();
            let info = roots.get(&r.root_path);
            ScanRow {
                label: info
                    .map(|i| i.label.clone())
                    .unwrap_or_else(|| r.root_path.display().to_string()),
                path: r.root_path.clone(),
                size,
                gigabytes,
                total_bytes: r.total_bytes,
                file_count: r.file_count,
                age_days: info
                    .and_then(|i| i.last_modified)
                    .and_then(|m| now.duration_since(m).ok())
                    .map(|d| d.as_secs() / 86_400),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.gigabytes
            .total_cmp(&a.gigabytes)
            .then(b.total_bytes.cmp(&a.total_bytes))
    });
    rows
}

fn print_table(rows: &[ScanRow]) {
    println!(
        "\n  {:<24} {:>10} {:>8} {:>9}  {:<44}",
        "NAME", "SIZE", "FILES", "MODIFIED", "PATH"
    );
    println!("  {}", "─".repeat(99));

    for row in rows {
        let modified = match row.age_days {
            Some(0) => "today".to_string(),
            Some(days) => format!("{}d ago", days),
            None => "-".to_string(),
        };
        println!(
            "  {:<24} {:>10} {:>8} {:>9}  {:<44}",
            row.label,
            row.size,
            row.file_count,
            modified,
            shorten(&row.path.display().to_string(), 44)
        );
    }

    let total: u64 = rows.iter().map(|r| r.total_bytes).sum();
    println!(
        "\nTotal: {} in {} director{}",
        crate::scanner::humanize(total).0,
        rows.len(),
        if rows.len() == 1 { "y" } else { "ies" }
    );
}

/// Keep the tail of long paths so the table stays aligned.
pub(crate) fn shorten(path: &str, max: usize) -> String {
    let count = path.chars().count();
    if count <= max {
        return path.to_string();
    }
    let skip = count - (max - 3);
    format!("...{}", path.chars().skip(skip).collect::<String>())
}
