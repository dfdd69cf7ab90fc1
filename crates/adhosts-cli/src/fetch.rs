//! Concurrent feed download and parsing
//!
//! Every source gets its own task. Tasks share nothing but the fetcher and
//! each produces its own domain set, so the only synchronization is the final
//! join. A source that fails contributes an empty set and a warning; it never
//! aborts the run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use adhosts_compiler::parse_filter_list;
use adhosts_core::{DomainSet, Source};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Error fetching {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Fetch task for {url} did not complete: {reason}")]
    Task { url: String, reason: String },
}

/// Transport used to download feed bodies.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP(S) transport following redirects.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("unbound-adhosts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(transport)
    }
}

/// Result of fetching and parsing one source.
#[derive(Debug)]
pub struct SourceReport {
    pub source: Source,
    pub domains: DomainSet,
    pub error: Option<FetchError>,
}

impl SourceReport {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Fetch and parse every source concurrently, waiting for all of them.
///
/// Reports come back in the same order as `sources`.
pub async fn fetch_all(fetcher: Arc<dyn Fetch>, sources: &[Source]) -> Vec<SourceReport> {
    let tasks: Vec<_> = sources
        .iter()
        .cloned()
        .map(|source| {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move { fetch_source(fetcher.as_ref(), source).await })
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .zip(sources)
        .map(|(result, source)| match result {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Fetch task for {} panicked: {}", source.url, e);
                SourceReport {
                    source: source.clone(),
                    domains: DomainSet::new(),
                    error: Some(FetchError::Task {
                        url: source.url.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        })
        .collect()
}

async fn fetch_source(fetcher: &dyn Fetch, source: Source) -> SourceReport {
    match fetcher.fetch(&source.url).await {
        Ok(body) => {
            let domains = parse_filter_list(source.format, &body);
            log::info!(
                "{} [{}]: {} lines, {} domains",
                source.url,
                source.format,
                body.lines().count(),
                domains.len()
            );
            SourceReport {
                source,
                domains,
                error: None,
            }
        }
        Err(e) => {
            log::warn!("{}", e);
            SourceReport {
                source,
                domains: DomainSet::new(),
                error: Some(e),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use super::*;

    /// In-memory transport. Unknown URLs answer 404.
    #[derive(Default)]
    pub struct StaticFetcher {
        bodies: HashMap<String, String>,
        panics: Vec<String>,
    }

    impl StaticFetcher {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }

        pub fn panicking(mut self, url: &str) -> Self {
            self.panics.push(url.to_string());
            self
        }
    }

    #[async_trait]
    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if self.panics.iter().any(|u| u == url) {
                panic!("transport blew up for {}", url);
            }
            self.bodies.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}
