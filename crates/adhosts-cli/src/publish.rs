//! Change-gated publishing of the zone file
//!
//! The rendered document is staged in a temporary file, hashed, and compared
//! against the live artifact. Nothing is written, validated or reloaded
//! unless the content differs.
//!
//! When it does differ the staged file is renamed over the artifact, then the
//! resolver's config check runs, then the resolver is reloaded. The check
//! runs against the already-replaced artifact, so a failed check leaves the
//! new file in place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;

use adhosts_compiler::parse_filter_list;
use adhosts_core::digest::{digest_file, digest_reader};
use adhosts_core::{DomainSet, SourceFormat};

use crate::config::ResolverConfig;

/// Placeholder replaced with the artifact path in configured commands.
pub const ARTIFACT_PLACEHOLDER: &str = "{artifact}";

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to stage new zone file in '{dir}': {source}")]
    Stage {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to replace '{path}': {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("unbound config not valid: {diagnostics}")]
    ValidationFailed {
        code: Option<i32>,
        diagnostics: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    ReportOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// New content hashes the same as the live artifact.
    Unchanged,
    /// Report-only mode found a difference.
    WouldUpdate { added: usize, removed: usize },
    /// The artifact was replaced and validated. `reloaded` is false when the
    /// reload command failed.
    Updated { reloaded: bool },
}

// =============================================================================
// Resolver Collaborators
// =============================================================================

/// Exit status and captured output of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub diagnostics: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Validate and reload hooks of the downstream resolver.
pub trait ResolverControl {
    fn check(&self, artifact: &Path) -> Result<CommandOutcome, PublishError>;
    fn reload(&self, artifact: &Path) -> Result<CommandOutcome, PublishError>;
}

/// Runs the configured check and reload commands.
pub struct ExternalCommands {
    check: Vec<String>,
    reload: Vec<String>,
}

impl ExternalCommands {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            check: config.check_command.clone(),
            reload: config.reload_command.clone(),
        }
    }

    fn run(argv: &[String], artifact: &Path) -> Result<CommandOutcome, PublishError> {
        let artifact = artifact.to_string_lossy();
        let argv: Vec<&str> = argv
            .iter()
            .map(|arg| {
                if arg == ARTIFACT_PLACEHOLDER {
                    &*artifact
                } else {
                    arg.as_str()
                }
            })
            .collect();
        let command = argv.join(" ");

        let (program, args) = argv.split_first().ok_or_else(|| PublishError::Spawn {
            command: command.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
        })?;

        log::debug!("Running {}", command);
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| PublishError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let diagnostics = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };

        Ok(CommandOutcome {
            code: output.status.code(),
            diagnostics,
        })
    }
}

impl ResolverControl for ExternalCommands {
    fn check(&self, artifact: &Path) -> Result<CommandOutcome, PublishError> {
        Self::run(&self.check, artifact)
    }

    fn reload(&self, artifact: &Path) -> Result<CommandOutcome, PublishError> {
        Self::run(&self.reload, artifact)
    }
}

// =============================================================================
// Publisher
// =============================================================================

/// Publish `document` to `output` if it differs from what is there.
pub fn publish(
    document: &str,
    output: &Path,
    mode: Mode,
    resolver: &dyn ResolverControl,
) -> Result<PublishOutcome, PublishError> {
    let staged = stage(document, output, mode)?;

    let new_digest = staged
        .reopen()
        .and_then(digest_reader)
        .map_err(|source| PublishError::Read {
            path: staged.path().to_path_buf(),
            source,
        })?;
    let old_digest = digest_file(output).map_err(|source| PublishError::Read {
        path: output.to_path_buf(),
        source,
    })?;

    log::debug!("new digest {}", new_digest);
    if old_digest == Some(new_digest) {
        log::info!("{} is up to date", output.display());
        return Ok(PublishOutcome::Unchanged);
    }

    if mode == Mode::ReportOnly {
        let (added, removed) = diff_counts(document, output)?;
        return Ok(PublishOutcome::WouldUpdate { added, removed });
    }

    log::info!("Moving {} to {}", staged.path().display(), output.display());
    staged.persist(output).map_err(|e| PublishError::Replace {
        path: output.to_path_buf(),
        source: e.error,
    })?;

    let check = resolver.check(output)?;
    if !check.success() {
        log::error!("unbound config not valid after replacing {}", output.display());
        return Err(PublishError::ValidationFailed {
            code: check.code,
            diagnostics: check.diagnostics,
        });
    }

    let reloaded = match resolver.reload(output) {
        Ok(outcome) if outcome.success() => true,
        Ok(outcome) => {
            log::warn!("failed to reload unbound: {}", outcome.diagnostics);
            false
        }
        Err(e) => {
            log::warn!("failed to reload unbound: {}", e);
            false
        }
    };

    Ok(PublishOutcome::Updated { reloaded })
}

/// Write the document to a temporary file.
///
/// When applying, the file lives next to the artifact so that replacing it
/// is a rename on the same filesystem. Report-only runs never rename, so
/// they stage in the system temp dir and need no write access to the
/// artifact's directory.
fn stage(document: &str, output: &Path, mode: Mode) -> Result<NamedTempFile, PublishError> {
    let dir = match mode {
        Mode::Apply => artifact_dir(output).to_path_buf(),
        Mode::ReportOnly => std::env::temp_dir(),
    };
    let stage_err = |source| PublishError::Stage {
        dir: dir.clone(),
        source,
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".adhosts")
        .suffix(".conf")
        .tempfile_in(&dir)
        .map_err(stage_err)?;
    staged.write_all(document.as_bytes()).map_err(stage_err)?;
    staged.flush().map_err(stage_err)?;
    staged.as_file().sync_all().map_err(stage_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(stage_err)?;
    }

    Ok(staged)
}

fn artifact_dir(output: &Path) -> &Path {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Count domains that would be added and removed relative to the live
/// artifact.
fn diff_counts(document: &str, output: &Path) -> Result<(usize, usize), PublishError> {
    let previous = match fs::read(output) {
        Ok(bytes) => parse_filter_list(SourceFormat::ResolverZone, &String::from_utf8_lossy(&bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => DomainSet::new(),
        Err(source) => {
            return Err(PublishError::Read {
                path: output.to_path_buf(),
                source,
            })
        }
    };
    let next = parse_filter_list(SourceFormat::ResolverZone, document);

    let added = next.difference(&previous).count();
    let removed = previous.difference(&next).count();
    Ok((added, removed))
}
