//! Source descriptors and shared set types
//!
//! A [`Source`] is static configuration: where to fetch a feed and which
//! grammar it is written in. Nothing here is derived at runtime.

use std::collections::HashSet;
use std::fmt;

use serde::Deserialize;

/// Unordered set of canonical domains.
///
/// Used for the per-source filter lists, the seed files and the aggregated
/// candidate set. Duplicates collapse and no provenance is tracked.
pub type DomainSet = HashSet<String>;

// =============================================================================
// Source Formats
// =============================================================================

/// Grammar a feed is written in. Selects the line parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// `||domain^`, `.domain^`, `domain^` with an optional block rewrite
    AdFilter,
    /// One domain per line
    BareDomain,
    /// `<loopback or null address> <domain> ...`
    Hostfile,
    /// `local-zone: "<domain>" <action>`
    ResolverZone,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 4] = [
        SourceFormat::AdFilter,
        SourceFormat::BareDomain,
        SourceFormat::Hostfile,
        SourceFormat::ResolverZone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::AdFilter => "ad-filter",
            SourceFormat::BareDomain => "bare-domain",
            SourceFormat::Hostfile => "hostfile",
            SourceFormat::ResolverZone => "resolver-zone",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sources
// =============================================================================

/// One remote feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Source {
    pub url: String,
    pub format: SourceFormat,
}

impl Source {
    pub fn new(url: impl Into<String>, format: SourceFormat) -> Self {
        Self {
            url: url.into(),
            format,
        }
    }
}

const AD_FILTER_FEEDS: &[&str] = &[
    "https://adguardteam.github.io/AdGuardSDNSFilter/Filters/filter.txt",
    "https://raw.githubusercontent.com/AdguardTeam/AdguardFilters/master/FrenchFilter/sections/adservers.txt",
];

const BARE_DOMAIN_FEEDS: &[&str] = &[
    "https://www.stopforumspam.com/downloads/toxic_domains_whole.txt",
];

const HOSTFILE_FEEDS: &[&str] = &[
    "https://adaway.org/hosts.txt",
    "https://raw.githubusercontent.com/StevenBlack/hosts/master/hosts",
    "https://pgl.yoyo.org/adservers/serverlist.php?showintro=0;hostformat=hosts",
    "https://raw.githubusercontent.com/Sekhan/TheGreatWall/master/TheGreatWall.txt",
];

const RESOLVER_ZONE_FEEDS: &[&str] = &[
    "https://malware-filter.gitlab.io/malware-filter/urlhaus-filter-unbound.conf",
];

/// Built-in feed list used when the configuration does not name any sources.
pub fn default_sources() -> Vec<Source> {
    let groups: [(&[&str], SourceFormat); 4] = [
        (AD_FILTER_FEEDS, SourceFormat::AdFilter),
        (BARE_DOMAIN_FEEDS, SourceFormat::BareDomain),
        (HOSTFILE_FEEDS, SourceFormat::Hostfile),
        (RESOLVER_ZONE_FEEDS, SourceFormat::ResolverZone),
    ];

    groups
        .iter()
        .flat_map(|(urls, format)| urls.iter().map(move |url| Source::new(*url, *format)))
        .collect()
}
