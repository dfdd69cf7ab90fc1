//! Allowlist and blocklist seed files
//!
//! Plain text, one domain per line. Lines starting with `#` are comments and
//! blank lines are ignored. A missing file is treated as empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use adhosts_core::domain::canonical_entry;
use adhosts_core::DomainSet;

/// Error type for seed loading.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Load a seed file, returning an empty set if it does not exist.
pub fn load_seed(path: &Path) -> Result<DomainSet, SeedError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::info!("{} not found, treating as empty", path.display());
            return Ok(DomainSet::new());
        }
        Err(source) => {
            return Err(SeedError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let domains = parse_seed(&content);
    log::info!("Loaded {} entries from {}", domains.len(), path.display());
    Ok(domains)
}

/// Parse seed file contents.
pub fn parse_seed(text: &str) -> DomainSet {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| canonical_entry(line.trim()))
        .map(str::to_string)
        .collect()
}
