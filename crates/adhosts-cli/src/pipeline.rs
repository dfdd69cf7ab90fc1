use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use adhosts_compiler::{aggregate, apply_exclusions, load_seed, FilterStats, SeedError};
use adhosts_core::{render, ExclusionFilter, Source};

use crate::config::ConfigError;
use crate::fetch::{fetch_all, Fetch, FetchError};
use crate::publish::{publish, Mode, PublishError, PublishOutcome, ResolverControl};

/// Exit status for failures that are not a validator verdict (EX_SOFTWARE).
pub const EXIT_INTERNAL: i32 = 70;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("Failed to start tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl RunError {
    /// Process exit status for this error.
    ///
    /// A failed config check passes the checker's own status through.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Publish(PublishError::ValidationFailed { code, .. }) => match code {
                Some(code) if *code != 0 => *code,
                _ => 1,
            },
            _ => EXIT_INTERNAL,
        }
    }
}

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct Job {
    pub sources: Vec<Source>,
    pub allowlist: PathBuf,
    pub blocklist: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
}

#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub allowlist: usize,
    pub seeded: usize,
    pub filter: FilterStats,
    pub total_ms: f64,
}

/// Load seeds, fetch every source and render the output document.
pub async fn build_document(
    job: &Job,
    fetcher: Arc<dyn Fetch>,
) -> Result<(String, BuildStats), RunError> {
    let start = Instant::now();

    let filter = ExclusionFilter::with_allowlist(&load_seed(&job.allowlist)?);
    if filter.allowlist().is_empty() {
        log::info!("No allowlisted domains in {}", job.allowlist.display());
    }
    let seed = load_seed(&job.blocklist)?;
    let mut stats = BuildStats {
        sources: job.sources.len(),
        allowlist: filter.allowlist().len(),
        seeded: seed.len(),
        ..BuildStats::default()
    };

    let reports = fetch_all(fetcher, &job.sources).await;
    for report in reports.iter().filter(|r| r.failed()) {
        stats.failed_sources += 1;
        log::debug!("{} contributed no domains", report.source.url);
    }

    let candidates = aggregate(seed, reports.into_iter().map(|r| r.domains));
    log::info!("Initial adhost list of {} domains", candidates.len());

    let (domains, filter_stats) = apply_exclusions(candidates, &filter);
    log::info!(
        "Filtered adhost list of {} domains ({} allowlisted, {} malformed)",
        filter_stats.after,
        filter_stats.allowlisted,
        filter_stats.malformed
    );
    stats.filter = filter_stats;

    let document = render(&domains);
    stats.total_ms = start.elapsed().as_secs_f64() * 1000.0;

    Ok((document, stats))
}

/// Build the document and hand it to the publisher.
pub async fn run(
    job: &Job,
    fetcher: Arc<dyn Fetch>,
    resolver: &dyn ResolverControl,
) -> Result<(PublishOutcome, BuildStats), RunError> {
    let (document, stats) = build_document(job, fetcher).await?;
    let outcome = publish(&document, &job.output, job.mode, resolver)?;
    Ok((outcome, stats))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;
    use std::path::Path;

    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use crate::publish::CommandOutcome;
    use adhosts_core::SourceFormat;

    #[derive(Default)]
    struct CountingResolver {
        checks: Cell<usize>,
        reloads: Cell<usize>,
    }

    impl ResolverControl for CountingResolver {
        fn check(&self, _artifact: &Path) -> Result<CommandOutcome, PublishError> {
            self.checks.set(self.checks.get() + 1);
            Ok(CommandOutcome {
                code: Some(0),
                diagnostics: String::new(),
            })
        }

        fn reload(&self, _artifact: &Path) -> Result<CommandOutcome, PublishError> {
            self.reloads.set(self.reloads.get() + 1);
            Ok(CommandOutcome {
                code: Some(0),
                diagnostics: String::new(),
            })
        }
    }

    fn fetcher() -> Arc<dyn Fetch> {
        Arc::new(
            StaticFetcher::default()
                .with(
                    "https://feeds.test/adguard",
                    "! Title: test\n||ads.example.com^\n||tracker.test^\n@@||ok.test^\n",
                )
                .with(
                    "https://feeds.test/hosts",
                    "# hosts\n127.0.0.1 evilexample.com\n0.0.0.0 cdn.allowed.test\n",
                )
                .with(
                    "https://feeds.test/zone",
                    "local-zone: \"malware.test.\" always_nxdomain\n",
                ),
        )
    }

    fn job(dir: &Path, mode: Mode) -> Job {
        Job {
            sources: vec![
                Source::new("https://feeds.test/zone", SourceFormat::ResolverZone),
                Source::new("https://feeds.test/adguard", SourceFormat::AdFilter),
                Source::new("https://feeds.test/down", SourceFormat::BareDomain),
                Source::new("https://feeds.test/hosts", SourceFormat::Hostfile),
            ],
            allowlist: dir.join("allowlist.txt"),
            blocklist: dir.join("blocklist.txt"),
            output: dir.join("adhosts.conf"),
            mode,
        }
    }

    fn write_seeds(dir: &Path) {
        fs::write(dir.join("allowlist.txt"), "# never block\nexample.com\nallowed.test\n").unwrap();
        fs::write(dir.join("blocklist.txt"), "local.bad.\n").unwrap();
    }

    #[tokio::test]
    async fn test_build_document() {
        let dir = tempfile::tempdir().unwrap();
        write_seeds(dir.path());

        let (document, stats) = build_document(&job(dir.path(), Mode::Apply), fetcher())
            .await
            .unwrap();

        assert_eq!(
            document,
            "local-zone: \"evilexample.com.\" always_nxdomain\n\
             local-zone: \"local.bad.\" always_nxdomain\n\
             local-zone: \"malware.test.\" always_nxdomain\n\
             local-zone: \"tracker.test.\" always_nxdomain\n"
        );
        assert_eq!(stats.sources, 4);
        assert_eq!(stats.failed_sources, 1);
        assert_eq!(stats.allowlist, 2);
        assert_eq!(stats.seeded, 1);
        assert_eq!(stats.filter.allowlisted, 2);
    }

    #[tokio::test]
    async fn test_missing_seed_files() {
        let dir = tempfile::tempdir().unwrap();

        let (document, stats) = build_document(&job(dir.path(), Mode::Apply), fetcher())
            .await
            .unwrap();

        assert_eq!(stats.allowlist, 0);
        assert!(document.contains("\"ads.example.com.\""));
        assert!(document.contains("\"cdn.allowed.test.\""));
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        write_seeds(dir.path());
        let job = job(dir.path(), Mode::Apply);
        let resolver = CountingResolver::default();

        let (first, _) = run(&job, fetcher(), &resolver).await.unwrap();
        let published = fs::read(&job.output).unwrap();
        let (second, _) = run(&job, fetcher(), &resolver).await.unwrap();

        assert_eq!(first, PublishOutcome::Updated { reloaded: true });
        assert_eq!(second, PublishOutcome::Unchanged);
        assert_eq!(fs::read(&job.output).unwrap(), published);
        assert_eq!(resolver.checks.get(), 1);
        assert_eq!(resolver.reloads.get(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_seeds(dir.path());
        let job = job(dir.path(), Mode::ReportOnly);
        let resolver = CountingResolver::default();

        let (outcome, _) = run(&job, fetcher(), &resolver).await.unwrap();

        assert_eq!(outcome, PublishOutcome::WouldUpdate { added: 4, removed: 0 });
        assert!(!job.output.exists());
        assert_eq!(resolver.checks.get(), 0);
    }

    #[test]
    fn test_exit_codes() {
        let failed = RunError::Publish(PublishError::ValidationFailed {
            code: Some(2),
            diagnostics: String::new(),
        });
        assert_eq!(failed.exit_code(), 2);

        let signalled = RunError::Publish(PublishError::ValidationFailed {
            code: None,
            diagnostics: String::new(),
        });
        assert_eq!(signalled.exit_code(), 1);

        let internal = RunError::Runtime(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(internal.exit_code(), EXIT_INTERNAL);
    }
}
