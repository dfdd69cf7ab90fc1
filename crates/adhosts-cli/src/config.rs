//! Optional TOML configuration
//!
//! ```toml
//! fetch_timeout_secs = 60
//!
//! [[sources]]
//! url = "https://adaway.org/hosts.txt"
//! format = "hostfile"
//!
//! [resolver]
//! check_command = ["doas", "-u", "_unbound", "/usr/sbin/unbound-checkconf"]
//! reload_command = ["doas", "-u", "_unbound", "unbound-control", "reload"]
//! ```
//!
//! Every key is optional. Leaving out `sources` uses the built-in feed list.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use adhosts_core::{default_sources, Source};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("resolver.{0} must name a program")]
    EmptyCommand(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sources: Vec<Source>,
    pub resolver: ResolverConfig,
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            resolver: ResolverConfig::default(),
            fetch_timeout_secs: 60,
        }
    }
}

/// External commands run after the artifact is replaced.
///
/// An argument spelled `{artifact}` is replaced with the artifact path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub check_command: Vec<String>,
    pub reload_command: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let argv = |args: &[&str]| -> Vec<String> { args.iter().map(|s| s.to_string()).collect() };
        Self {
            check_command: argv(&["doas", "-u", "_unbound", "/usr/sbin/unbound-checkconf"]),
            reload_command: argv(&["doas", "-u", "_unbound", "unbound-control", "reload"]),
        }
    }
}

impl Config {
    /// Load from `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            None => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.check_command.is_empty() {
            return Err(ConfigError::EmptyCommand("check_command"));
        }
        if self.resolver.reload_command.is_empty() {
            return Err(ConfigError::EmptyCommand("reload_command"));
        }
        Ok(())
    }
}
