//! # CLI Module
//!
//! Command-line interface for the media renamer.
//!
//! ## Usage
//! ```bash
//! # Show what a batch would do
//! media-rename preview ~/Pictures/Trip --prefix trip_ --digits 4
//!
//! # Do it (Ctrl-C stops after the current file)
//! media-rename rename ~/Pictures/Trip --prefix trip_
//!
//! # Rename files as they arrive
//! media-rename watch ~/Downloads/Camera --pattern "IMG_*.jpg"
//!
//! # JSON output
//! media-rename preview ~/Pictures/Trip --output json
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use console::{style, Term};
use crossbeam_channel::{bounded, select};
use indicatif::{ProgressBar, ProgressStyle};
use media_renamer::config::Settings;
use media_renamer::core::executor::{BatchExecutor, CancellationToken, ExecutionReport, ProgressStatus};
use media_renamer::core::media::{DirectoryScanner, MediaItem};
use media_renamer::core::metadata::ExifMetadataProvider;
use media_renamer::core::monitor::{FolderMonitor, MonitorStatus, WatchedFolder};
use media_renamer::core::naming::{FilenameGenerator, RenameConfig};
use media_renamer::core::preview::{PreviewEngine, PreviewEntry, PreviewSummary};
use media_renamer::core::providers::{FsConflictChecker, FsRenameProvider};
use media_renamer::core::sort::{self, SortStrategy};
use media_renamer::error::Result;
use media_renamer::events::{Event, EventChannel, MonitorEvent, RenameEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::warn;

/// Media Renamer - Numbered names for photos and videos
#[derive(Parser, Debug)]
#[command(name = "media-rename")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the new names without touching any file
    Preview {
        /// Folder holding the files
        dir: PathBuf,

        #[command(flatten)]
        options: BatchOptions,
    },
    /// Preview, then rename the files in a folder
    Rename {
        /// Folder holding the files
        dir: PathBuf,

        /// Rename even when the preview reports conflicts; colliding
        /// files are skipped
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        options: BatchOptions,
    },
    /// Rename files as they land in a folder, until Ctrl-C
    Watch {
        /// Folder to watch
        dir: PathBuf,

        /// Only rename files whose name matches this glob (e.g. "IMG_*.jpg")
        #[arg(short, long)]
        pattern: Option<String>,

        /// Watch subfolders too
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        naming: NamingOptions,

        #[command(flatten)]
        common: CommonOptions,
    },
}

/// How new names are built. Unset flags fall back to the settings file.
#[derive(Args, Debug, Clone)]
struct NamingOptions {
    /// Name prefix; may contain {date}, {year}, {month}, {day}, {camera}, {dimensions}
    #[arg(long)]
    prefix: Option<String>,

    /// First sequence number
    #[arg(short, long)]
    start: Option<u64>,

    /// Zero-padding width of the number (1-6)
    #[arg(short, long)]
    digits: Option<u8>,

    /// Drop the original extension
    #[arg(long)]
    drop_extension: bool,

    /// Fill prefix tokens from EXIF metadata
    #[arg(long)]
    metadata: bool,
}

#[derive(Args, Debug, Clone)]
struct CommonOptions {
    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Settings file (defaults to the platform config folder)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug, Clone)]
struct BatchOptions {
    #[command(flatten)]
    naming: NamingOptions,

    /// Order in which files are numbered
    #[arg(long)]
    sort: Option<SortOrder>,

    /// Include files in subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Include files that are not images, videos or audio
    #[arg(long)]
    all_files: bool,

    #[command(flatten)]
    common: CommonOptions,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortOrder {
    /// Natural order of the current names (default)
    Natural,
    /// Newest first
    Date,
    /// Largest first
    Size,
    /// Directory order
    None,
}

impl From<SortOrder> for SortStrategy {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Natural => SortStrategy::Natural,
            SortOrder::Date => SortStrategy::DateModifiedDescending,
            SortOrder::Size => SortStrategy::SizeDescending,
            SortOrder::None => SortStrategy::OriginalOrder,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

impl CommonOptions {
    fn settings(&self) -> Result<Settings> {
        let settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::load_default()?,
        };
        Ok(settings)
    }
}

impl NamingOptions {
    /// Settings first, flags on top
    fn rename_config(&self, settings: &Settings) -> RenameConfig {
        let mut config = settings.rename_config();
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(start) = self.start {
            config.start_number = start;
        }
        if let Some(digits) = self.digits {
            config.digit_count = digits;
        }
        if self.drop_extension {
            config.preserve_extension = false;
        }
        config
    }

    fn generator(&self) -> FilenameGenerator {
        if self.metadata {
            FilenameGenerator::with_metadata(Arc::new(ExifMetadataProvider))
        } else {
            FilenameGenerator::new()
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Preview { dir, options } => run_preview(&dir, &options),
        Commands::Rename {
            dir,
            force,
            options,
        } => run_rename(&dir, force, &options),
        Commands::Watch {
            dir,
            pattern,
            recursive,
            naming,
            common,
        } => run_watch(dir, pattern, recursive, &naming, &common),
    }
}

/// Settings, flags and the sorted selection for a batch command
fn prepare_batch(dir: &Path, options: &BatchOptions) -> Result<(RenameConfig, Vec<MediaItem>)> {
    media_renamer::init_tracing(options.common.verbose);
    let settings = options.common.settings()?;

    let mut config = options.naming.rename_config(&settings);
    if let Some(order) = options.sort {
        config.sort = order.into();
    }

    let mut scan = settings.scan_config();
    scan.recursive |= options.recursive;
    scan.include_hidden |= options.include_hidden;
    scan.include_all_files |= options.all_files;

    let items = sort::sorted(DirectoryScanner::new(scan).scan(dir)?, config.sort);
    Ok((config, items))
}

fn print_header(term: &Term, title: &str) {
    term.write_line(&format!(
        "{} {}",
        style("Media Renamer").bold().cyan(),
        style(title).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn run_preview(dir: &Path, options: &BatchOptions) -> Result<()> {
    let (config, items) = prepare_batch(dir, options)?;
    let term = Term::stderr();

    let engine = PreviewEngine::new(Arc::new(FsConflictChecker::new()))
        .with_generator(options.naming.generator());
    let (entries, summary) = engine.preview_with_summary(&items, &config);

    match options.common.output {
        OutputFormat::Pretty => {
            print_header(&term, "preview");
            print_pretty_preview(&term, &entries, &summary);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "config": config,
            "summary": summary,
            "entries": entries,
        })),
    }

    Ok(())
}

fn print_pretty_preview(term: &Term, entries: &[PreviewEntry], summary: &PreviewSummary) {
    if entries.is_empty() {
        term.write_line(&format!("  {} Nothing to rename", style("○").dim()))
            .ok();
        return;
    }

    for entry in entries {
        let line = match entry.conflict_reason() {
            Some(reason) => format!(
                "  {} {} {}",
                style("✗").red(),
                entry.item.name,
                style(format!("({})", reason)).red()
            ),
            None if entry.is_unchanged() => {
                format!("  {} {} {}", style("=").dim(), entry.item.name, style("(unchanged)").dim())
            }
            None => format!(
                "  {} {} → {}",
                style("✓").green(),
                entry.item.name,
                style(&entry.candidate_name).cyan()
            ),
        };
        term.write_line(&line).ok();
    }

    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files, {} ready, {} conflicts, {} unchanged",
        style(summary.total).cyan(),
        style(summary.committable).green(),
        style(summary.conflicts).red(),
        style(summary.unchanged).dim()
    ))
    .ok();

    if !summary.can_proceed() {
        term.write_line(&format!(
            "{}",
            style("Nothing would be renamed with these settings.").yellow()
        ))
        .ok();
    }
}

/// Whether a batch with this preview may be committed
fn should_commit(summary: &PreviewSummary, force: bool) -> bool {
    summary.total > 0 && (force || summary.can_proceed())
}

fn run_rename(dir: &Path, force: bool, options: &BatchOptions) -> Result<()> {
    let (config, items) = prepare_batch(dir, options)?;
    let term = Term::stderr();
    let output = options.common.output;

    let (entries, summary) = PreviewEngine::new(Arc::new(FsConflictChecker::new()))
        .with_generator(options.naming.generator())
        .preview_with_summary(&items, &config);

    if matches!(output, OutputFormat::Pretty) {
        print_header(&term, "rename");
        print_pretty_preview(&term, &entries, &summary);
        term.write_line("").ok();
    }

    if !should_commit(&summary, force) {
        match output {
            OutputFormat::Pretty if summary.conflicts > 0 => {
                term.write_line(&format!(
                    "{} rerun with --force to rename the other files",
                    style("Nothing renamed:").yellow().bold()
                ))
                .ok();
            }
            OutputFormat::Pretty => {}
            OutputFormat::Json => print_json(&serde_json::json!({
                "committed": false,
                "summary": summary,
                "entries": entries,
            })),
        }
        return Ok(());
    }

    let executor = BatchExecutor::new(
        Arc::new(FsRenameProvider),
        Arc::new(FsConflictChecker::new()),
    )
    .with_generator(options.naming.generator());

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(error) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(%error, "Ctrl-C handler unavailable, batch cannot be interrupted");
    }

    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(items.len() as u64);
        let bar_style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(bar_style);
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = options.common.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(pb) = progress_clone.as_ref() else {
                continue;
            };
            match event {
                Event::Rename(RenameEvent::Started { total }) => pb.set_length(total as u64),
                Event::Rename(RenameEvent::Progress(p)) => match &p.status {
                    ProgressStatus::Processing => pb.set_message(p.item.name.clone()),
                    ProgressStatus::Success { new_name, .. } => {
                        pb.set_position((p.index + 1) as u64);
                        if verbose {
                            pb.println(format!("  {} → {}", p.item.name, new_name));
                        }
                    }
                    ProgressStatus::Failed(failure) | ProgressStatus::Skipped(failure) => {
                        pb.set_position((p.index + 1) as u64);
                        pb.println(format!(
                            "  {} {}: {}",
                            style("✗").red(),
                            p.item.name,
                            failure.reason
                        ));
                    }
                },
                Event::Rename(RenameEvent::Completed { .. })
                | Event::Rename(RenameEvent::Cancelled { .. }) => pb.finish_and_clear(),
                Event::Monitor(_) => {}
            }
        }
    });

    let report = executor.run_with_events(items, config, token, &sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => print_json(&report),
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &ExecutionReport) {
    term.write_line("").ok();
    let heading = if report.cancelled {
        format!("{} Rename Cancelled", style("!").yellow().bold())
    } else {
        format!("{} Rename Complete", style("✓").green().bold())
    };
    term.write_line(&heading).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} of {} files renamed in {:.1}s",
        style(report.succeeded.len()).green(),
        style(report.total).cyan(),
        report.duration_ms as f64 / 1000.0
    ))
    .ok();

    if !report.skipped.is_empty() {
        term.write_line(&format!(
            "  {} skipped because the name was taken",
            style(report.skipped.len()).yellow()
        ))
        .ok();
    }

    if !report.failed.is_empty() {
        term.write_line(&format!("  {} failed:", style(report.failed.len()).red()))
            .ok();
        for failed in &report.failed {
            term.write_line(&format!(
                "    {} {} ({})",
                style("✗").red(),
                failed.item.path.display(),
                failed.failure
            ))
            .ok();
        }
    }

    if report.cancelled {
        let untouched = report.total - report.processed();
        term.write_line(&format!(
            "  {} not started",
            style(untouched).dim()
        ))
        .ok();
    }
}

fn run_watch(
    dir: PathBuf,
    pattern: Option<String>,
    recursive: bool,
    naming: &NamingOptions,
    common: &CommonOptions,
) -> Result<()> {
    media_renamer::init_tracing(common.verbose);
    let settings = common.settings()?;
    let term = Term::stderr();

    let mut folder = WatchedFolder::new(dir, naming.rename_config(&settings))
        .recursive(recursive || settings.monitor.recursive);
    folder.pattern = pattern.or_else(|| settings.monitor.pattern.clone());

    let mut monitor = FolderMonitor::on_filesystem().with_generator(naming.generator());
    let events = monitor.subscribe_events();

    let (stop_tx, stop_rx) = bounded(1);
    if let Err(error) = ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    }) {
        warn!(%error, "Ctrl-C handler unavailable");
    }

    monitor.start(folder)?;

    if matches!(common.output, OutputFormat::Pretty) {
        print_header(&term, "watching");
        term.write_line(&format!("  {}", style("Press Ctrl-C to stop").dim()))
            .ok();
    }

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(event) => {
                    print_monitor_event(&term, &event, common.output);
                    if matches!(event, MonitorEvent::Error { .. }) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(stop_rx) -> _ => break,
        }
    }

    let processed = match monitor.status() {
        MonitorStatus::Active {
            files_processed, ..
        } => Some(files_processed),
        _ => None,
    };
    monitor.stop();

    if let (OutputFormat::Pretty, Some(count)) = (common.output, processed) {
        term.write_line("").ok();
        term.write_line(&format!(
            "{} Stopped after {} new files",
            style("✓").green().bold(),
            style(count).cyan()
        ))
        .ok();
    }

    Ok(())
}

fn print_monitor_event(term: &Term, event: &MonitorEvent, output: OutputFormat) {
    if matches!(output, OutputFormat::Json) {
        print_json(event);
        return;
    }

    let line = match event {
        MonitorEvent::Started { path } => format!("  Watching {}", style(path.display()).cyan()),
        MonitorEvent::Renamed { from, to } => format!(
            "  {} {} → {}",
            style("✓").green(),
            display_name(from),
            style(display_name(to)).cyan()
        ),
        MonitorEvent::Skipped { path, failure } | MonitorEvent::RenameFailed { path, failure } => {
            format!(
                "  {} {} ({})",
                style("✗").red(),
                display_name(path),
                failure.reason
            )
        }
        MonitorEvent::Error { failure } => {
            format!("{} {}", style("Watch failed:").red().bold(), failure.reason)
        }
        MonitorEvent::FileObserved(_) | MonitorEvent::Stopped { .. } => return,
    };
    term.write_line(&line).ok();
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(error) => warn!(%error, "could not serialize output"),
    }
}
