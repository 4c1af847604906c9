//! storewise - inventory a directory tree and estimate storage savings.
//!
//! Usage:
//!   storewise                      Guided scan, saves an inventory file
//!   storewise scan PATH [-o FILE]  Scan to an inventory file or stdout
//!   storewise analyze INVENTORY    Analyze an inventory file
//!   storewise report PATH          Scan and analyze in one go
//!   storewise --help               Show help

mod wizard;

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::thread;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use storewise_analyze::{AnalysisConfig, AnalysisReport, Analyzer, Recommendation, TieredPricing};
use storewise_core::{DEFAULT_LARGE_FILE_THRESHOLD, Inventory, parse_timestamp};
use storewise_scan::{InventoryScanner, ScanConfig, ScanResult};

use crate::wizard::Wizard;

#[derive(Parser)]
#[command(
    name = "storewise",
    version,
    about = "Inventory files and estimate storage cost savings",
    long_about = "storewise scans a directory, fingerprints every file and tells you \
                  which files are duplicates or stale, and what removing or archiving \
                  them would save per month.\n\n\
                  Run without a subcommand for a guided scan."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    scan: ScanOpts,

    #[command(flatten)]
    analysis: AnalysisOpts,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory and write its inventory
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze an inventory file
    Analyze {
        /// Inventory file produced by `scan`
        inventory: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Number of top savings to list
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Scan a directory and analyze it
    Report {
        /// Directory to scan
        path: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Number of top savings to list
        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },
}

#[derive(Args)]
struct ScanOpts {
    /// Skip hashing files larger than this (e.g., "100MB", "2GB")
    #[arg(long, global = true, value_parser = parse_size)]
    max_hash_size: Option<u64>,

    /// Include hidden files and directories
    #[arg(long, global = true)]
    include_hidden: bool,

    /// Follow symbolic links
    #[arg(long, global = true)]
    follow_symlinks: bool,

    /// Skip entries whose name matches this glob (repeatable)
    #[arg(long = "ignore", value_name = "GLOB", global = true)]
    ignore: Vec<String>,

    /// Number of hashing threads (0 = one per core)
    #[arg(long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Args)]
struct AnalysisOpts {
    /// Months without modification after which a file is old
    #[arg(long, global = true, default_value = "6")]
    stale_months: u32,

    /// Standard-tier price in $ per GB-month
    #[arg(long, global = true)]
    standard_price: Option<f64>,

    /// Archive-tier price in $ per GB-month
    #[arg(long, global = true)]
    archive_price: Option<f64>,

    /// Evaluate staleness as of this time instead of now (RFC 3339 or YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let scan_opts = &cli.scan;

    match cli.command {
        Some(Command::Scan { path, output }) => {
            run_scan(&scan_config(&path, scan_opts)?, output)?;
        }
        Some(Command::Analyze {
            inventory,
            format,
            top,
        }) => {
            run_analyze(&inventory, &analyzer(&cli.analysis)?, format, top)?;
        }
        Some(Command::Report { path, format, top }) => {
            let config = scan_config(&path, scan_opts)?;
            run_report(&config, &analyzer(&cli.analysis)?, format, top)?;
        }
        None => {
            run_wizard(scan_opts)?;
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default: warnings only).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn scan_config(path: &Path, opts: &ScanOpts) -> Result<ScanConfig> {
    ScanConfig::builder()
        .root(path)
        .include_hidden(opts.include_hidden)
        .follow_symlinks(opts.follow_symlinks)
        .ignore_patterns(opts.ignore.clone())
        .threads(opts.threads)
        .large_file_threshold(opts.max_hash_size.unwrap_or(DEFAULT_LARGE_FILE_THRESHOLD))
        .build()
        .map_err(|e| eyre!("Invalid scan options: {e}"))
}

fn analyzer(opts: &AnalysisOpts) -> Result<Analyzer> {
    let mut config = AnalysisConfig::builder();
    config.stale_after_months(opts.stale_months);
    if let Some(now) = opts.now {
        config.reference_time(now);
    }
    let config = config
        .build()
        .map_err(|e| eyre!("Invalid analysis options: {e}"))?;

    let mut pricing = TieredPricing::builder();
    if let Some(price) = opts.standard_price {
        pricing.standard_per_gib(price);
    }
    if let Some(price) = opts.archive_price {
        pricing.archive_per_gib(price);
    }
    let pricing = pricing
        .build()
        .map_err(|e| eyre!("Invalid pricing: {e}"))?;

    Ok(Analyzer::with_pricing(config, pricing))
}

/// Scan with a progress line on stderr.
fn scan_with_progress(config: &ScanConfig) -> Result<ScanResult> {
    eprintln!("Scanning {}...", config.root.display());

    let scanner = InventoryScanner::new();
    let mut progress_rx = scanner.subscribe();
    let reporter = thread::spawn(move || {
        loop {
            match progress_rx.blocking_recv() {
                Ok(progress) => eprintln!(
                    "  Found {} files... ({})",
                    progress.files_scanned,
                    format_size(progress.bytes_scanned)
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = scanner.scan(config);
    drop(scanner);
    let _ = reporter.join();

    let result = result.context("Scan failed")?;
    print_warnings(&result);
    Ok(result)
}

fn print_warnings(result: &ScanResult) {
    const SHOWN: usize = 5;
    for warning in result.warnings.iter().take(SHOWN) {
        eprintln!("  Skipped {}: {}", warning.path.display(), warning.message);
    }
    if result.warnings.len() > SHOWN {
        eprintln!("  ... and {} more warnings", result.warnings.len() - SHOWN);
    }
}

fn run_scan(config: &ScanConfig, output: Option<PathBuf>) -> Result<()> {
    let result = scan_with_progress(config)?;
    eprintln!(
        "Scanned {} files ({}) in {:.2}s",
        result.total_files(),
        format_size(result.total_size),
        result.scan_duration.as_secs_f64()
    );

    let json = result.into_inventory().to_json_pretty()?;
    match output {
        Some(output_path) => {
            fs::write(&output_path, json)
                .with_context(|| format!("Cannot write {}", output_path.display()))?;
            eprintln!("Inventory written to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

fn run_analyze(path: &Path, analyzer: &Analyzer, format: OutputFormat, top: usize) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let inventory = Inventory::from_reader(BufReader::new(file))
        .with_context(|| format!("Cannot read inventory {}", path.display()))?;
    let report = analyzer.analyze_inventory(&inventory)?;
    print_report(&report, format, top)
}

fn run_report(
    config: &ScanConfig,
    analyzer: &Analyzer,
    format: OutputFormat,
    top: usize,
) -> Result<()> {
    let result = scan_with_progress(config)?;
    let report = analyzer.analyze(&result.entries)?;
    print_report(&report, format, top)
}

fn run_wizard(opts: &ScanOpts) -> Result<()> {
    let stdin = io::stdin();
    let mut wizard = Wizard::new(stdin.lock(), io::stdout());

    let Some(root) = wizard.prompt_root()? else {
        wizard.say("Goodbye!")?;
        return Ok(());
    };

    wizard.say("\nStarting scan... (this may take a while for large directories)")?;
    let result = scan_with_progress(&scan_config(&root, opts)?)?;

    wizard.say(format!("\n{}", "=".repeat(70)))?;
    wizard.say("Scan complete!")?;
    wizard.say(format!("   Files found: {}", result.total_files()))?;
    wizard.say(format!("   Total size:  {}", format_size(result.total_size)))?;

    let output = wizard.prompt_output()?;
    let json = result.into_inventory().to_json_pretty()?;
    fs::write(&output, &json).with_context(|| format!("Cannot write {}", output.display()))?;

    let shown = fs::canonicalize(&output).unwrap_or_else(|_| output.clone());
    wizard.say("\nReport saved.")?;
    wizard.say(format!("   File: {}", shown.display()))?;
    wizard.say(format!("   Size: {}", format_size(json.len() as u64)))?;
    wizard.say(format!("\nNext: storewise analyze {}", output.display()))?;

    Ok(())
}

fn print_report(report: &AnalysisReport, format: OutputFormat, top: usize) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", report.to_json_pretty()?);
        }
        OutputFormat::Text => {
            let s = &report.summary;
            println!();
            println!("{}", "─".repeat(70));
            println!(" Storage Analysis Report");
            println!("{}", "─".repeat(70));
            println!();
            println!(" Files:               {}", s.total_files);
            println!(" Total size:          {}", format_size(s.total_size));
            println!(" Old files:           {}", s.old_files);
            println!(
                " Duplicates:          {} in {} groups",
                s.duplicates, s.duplicate_groups
            );
            println!(" Reclaimable space:   {}", format_size(s.space_savings));
            println!(" Estimated savings:   ${:.2}/month", s.estimated_savings);
            println!();

            println!(" By type:");
            for (file_type, stats) in &s.by_type {
                println!(
                    "   {:<10} {:>8} files {:>12}",
                    file_type.as_str(),
                    stats.count,
                    format_size(stats.bytes)
                );
            }
            println!();

            let top_savings = report.top_savings(top);
            if top_savings.is_empty() {
                println!(" Nothing to optimize.");
            } else {
                println!(" Top savings:");
                for file in top_savings {
                    println!(
                        "   {:<40} {:>10}  {:<28} ${:.4}/month",
                        truncate(&file.entry.name, 40),
                        format_size(file.entry.size),
                        file.analysis.recommendation.to_string(),
                        file.analysis.savings_per_month
                    );
                }
            }

            let largest = report.largest_files(top);
            if !largest.is_empty() {
                println!();
                println!(" Largest files:");
                for file in largest {
                    println!(
                        "   {:<40} {:>10}  {}",
                        truncate(&file.entry.name, 40),
                        format_size(file.entry.size),
                        file.analysis.recommendation
                    );
                }
            }

            let deletions = report
                .with_recommendation(Recommendation::DeleteDuplicate)
                .count();
            if deletions > 0 {
                println!();
                println!(" {} duplicate copies can be deleted.", deletions);
            }
            println!();
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 1).collect();
        format!("{head}…")
    }
}

/// Parse a size string (e.g., "1KB", "10MB", "1GB").
fn parse_size(s: &str) -> std::result::Result<u64, String> {
    let upper = s.trim().to_uppercase();
    let digits_end = upper
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(upper.len());
    let (num, unit) = upper.split_at(digits_end);

    let num: f64 = num.parse().map_err(|_| format!("invalid size: {s}"))?;
    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        "T" | "TB" => 1024 * 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit: {other}")),
    };

    Ok((num * multiplier as f64) as u64)
}

fn parse_now(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_timestamp(s).ok_or_else(|| format!("invalid timestamp: {s}"))
}
