//! unbound-adhosts CLI
//!
//! Builds an Unbound `local-zone` NXDOMAIN file from public ad and malware
//! feeds plus local allow/block lists, and publishes it only when it changed.

mod config;
mod fetch;
mod pipeline;
mod publish;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use fetch::HttpFetcher;
use pipeline::{Job, RunError};
use publish::{ExternalCommands, Mode, PublishOutcome};

const DEFAULT_OUTPUT: &str = "/var/unbound/etc/unbound-adhosts.conf";

#[derive(Parser)]
#[command(name = "unbound-adhosts")]
#[command(about = "Build and publish an Unbound NXDOMAIN zone from ad and malware feeds")]
#[command(version)]
struct Cli {
    /// Unbound conf file to replace with the current adhosts domains
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// File containing one allowlisted domain per line
    /// [default: allowlist.txt beside the invoked program path]
    #[arg(short, long)]
    allowlist: Option<PathBuf>,

    /// File containing one domain to block per line
    /// [default: blocklist.txt beside the invoked program path]
    #[arg(short, long)]
    blocklist: Option<PathBuf>,

    /// Do not write the destination file, only report any changes
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Print messages to indicate progress
    #[arg(short, long)]
    verbose: bool,

    /// TOML file overriding the feed list and resolver commands
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Also installs the `log` bridge, which is what the library crates log through.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<(), RunError> {
    let config = Config::load(cli.config.as_deref())?;

    let job = Job {
        sources: config.sources.clone(),
        allowlist: cli.allowlist.unwrap_or_else(|| beside_invocation("allowlist.txt")),
        blocklist: cli.blocklist.unwrap_or_else(|| beside_invocation("blocklist.txt")),
        output: cli.output,
        mode: if cli.dry_run { Mode::ReportOnly } else { Mode::Apply },
    };

    let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout())?);
    let resolver = ExternalCommands::new(&config.resolver);

    let runtime = tokio::runtime::Runtime::new().map_err(RunError::Runtime)?;
    let (outcome, stats) = runtime.block_on(pipeline::run(&job, fetcher, &resolver))?;

    log::info!(
        "Processed {} sources ({} failed) in {:.1}ms: {} seeded, {} allowlisted, {} -> {} domains",
        stats.sources,
        stats.failed_sources,
        stats.total_ms,
        stats.seeded,
        stats.allowlist,
        stats.filter.before,
        stats.filter.after,
    );

    match outcome {
        PublishOutcome::Unchanged => {}
        PublishOutcome::WouldUpdate { added, removed } => {
            println!(
                "Dry-run mode: Would update {}, {} domains added, {} removed",
                job.output.display(),
                added,
                removed
            );
        }
        PublishOutcome::Updated { reloaded } => {
            log::info!("Updated {} with {} domains", job.output.display(), stats.filter.after);
            if !reloaded {
                eprintln!("Warning: {} was updated but unbound was not reloaded", job.output.display());
            }
        }
    }

    Ok(())
}

/// Path of `name` next to the program as it was invoked.
fn beside_invocation(name: &str) -> PathBuf {
    invocation_dir(std::env::args_os().next().map(PathBuf::from)).join(name)
}

/// Directory part of `argv[0]`, without resolving symlinks.
///
/// A bare program name found through `PATH` has no directory part and
/// maps to the working directory.
fn invocation_dir(argv0: Option<PathBuf>) -> PathBuf {
    argv0
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
