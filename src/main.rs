//! dirstat - Writes QDirStat cache files.
//!
//! Usage:
//!   dirstat [-lmvd] [-e PATTERN]... <DIRECTORY> [CACHE_FILE]
//!   dirstat --config dirstat.json
//!   dirstat dirstat.json
//!   dirstat --help

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dirstat_core::{ConfigFile, TargetConfig};
use dirstat_scan::{CacheScanner, MountTable, ScanReport, ScanTarget};

#[derive(Parser)]
#[command(
    name = "dirstat",
    version,
    about = "Write QDirStat cache files for directory trees",
    long_about = "dirstat scans a directory tree and writes it as a QDirStat cache file.\n\n\
                  If CACHE_FILE is not given it defaults to .qdirstat.cache.gz inside \
                  DIRECTORY. Cache files ending in .gz are compressed with gzip.\n\n\
                  Several trees can be scanned in one run from a JSON config file, given \
                  with --config or as the only argument."
)]
struct Cli {
    /// Directory to scan
    #[arg(required_unless_present = "config")]
    directory: Option<PathBuf>,

    /// Cache file to write
    cache_file: Option<PathBuf>,

    /// Read scan targets from a JSON config file
    #[arg(short, long, conflicts_with_all = ["directory", "cache_file"])]
    config: Option<PathBuf>,

    /// Long format: always write the full path, even for plain files
    #[arg(short, long)]
    long_format: bool,

    /// Scan mounted filesystems (cross filesystem boundaries)
    #[arg(short = 'm', long)]
    scan_mounted: bool,

    /// Leave out paths equal to or ending with PATTERN (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Debug output
    #[arg(short, long)]
    debug: bool,
}

impl Cli {
    /// Config file to read, if targets come from one.
    fn config_file(&self) -> Option<&Path> {
        if let Some(config) = &self.config {
            return Some(config.as_path());
        }
        match (&self.directory, &self.cache_file) {
            (Some(path), None) if path.extension().is_some_and(|ext| ext == "json") => {
                Some(path.as_path())
            }
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let targets = match cli.config_file() {
        Some(path) => {
            eprintln!("Reading configuration...");
            let config = ConfigFile::load(path)?;
            init_tracing(
                cli.verbose || config.options.verbose,
                cli.debug || config.options.debug,
            )?;
            config.targets(path)?
        }
        None => {
            init_tracing(cli.verbose, cli.debug)?;
            vec![target_from_args(&cli)?]
        }
    };

    let mounts = MountTable::from_system().context("Could not read the mount table")?;
    let scanner = CacheScanner::new(&mounts);

    let mut failed = 0;
    for config in &targets {
        match run_target(&scanner, &mounts, config) {
            Ok(report) => print_summary(&report),
            Err(err) => {
                tracing::error!("Skipping {}: {err:#}", config.root.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} scan targets failed", targets.len());
    }
    Ok(())
}

/// Build the single target described on the command line.
fn target_from_args(cli: &Cli) -> Result<TargetConfig> {
    let Some(directory) = &cli.directory else {
        bail!("No directory to scan");
    };
    let root = std::path::absolute(directory).context("Invalid path")?;

    let mut config = TargetConfig::new(&root);
    if let Some(cache) = &cli.cache_file {
        config.cache = cache.clone();
    }
    config.long_format = cli.long_format;
    config.scan_mounted = cli.scan_mounted;
    config.exclude = cli.exclude.clone();
    Ok(config)
}

/// Resolve and scan one target.
fn run_target(scanner: &CacheScanner<'_>, mounts: &MountTable, config: &TargetConfig) -> Result<ScanReport> {
    let target = ScanTarget::resolve(config, mounts).context("Invalid scan target")?;

    eprintln!("Scanning {}...", target.root.display());

    let report = scanner
        .scan(&target)
        .with_context(|| format!("Failed to write {}", target.cache.display()))?;
    Ok(report)
}

/// Print a one-line summary for a finished target.
fn print_summary(report: &ScanReport) {
    let stats = &report.stats;
    println!(
        "{} -> {}: {} directories, {} entries, {} skipped, {} unreadable, {} mount points in {:.2}s",
        report.root.display(),
        report.cache.display(),
        stats.directories,
        stats.files,
        stats.skipped(),
        stats.unreadable_dirs,
        stats.mount_points,
        report.duration.as_secs_f64()
    );
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over the flags.
fn init_tracing(verbose: bool, debug: bool) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(())
}
