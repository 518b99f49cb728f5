//! Host↔container path translation.
//!
//! File arguments are made container-visible by prefixing a configurable
//! automount root onto their absolute host path and bind-mounting the
//! containing directory. After the run, translated values are rewritten
//! back by stripping the prefix so downstream consumers observe original
//! host paths. An empty prefix disables prefixing entirely and translation
//! becomes the identity on absolute paths.
//!
//! Output-typed arguments are additionally queued for ownership fixup,
//! because container processes frequently execute as a different user than
//! the invoker.

use capsule_core::{Direction, Error, Result};
use std::path::{Path, PathBuf};

/// Default automount root prepended to host paths inside containers.
pub const DEFAULT_AUTOMOUNT_PREFIX: &str = "/capsule_automount";

/// Environment variable overriding the automount prefix at wrapper start.
pub const AUTOMOUNT_PREFIX_ENV: &str = "CAPSULE_AUTOMOUNT_PREFIX";

/// One host↔container bind mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountMapping {
    /// Directory on the host
    pub host: PathBuf,
    /// The same directory as seen inside the container
    pub container: PathBuf,
    /// Whether the referencing argument reads or writes
    pub direction: Direction,
}

/// Accumulates path translations for one wrapper run.
#[derive(Debug, Clone)]
pub struct MountTranslator {
    prefix: String,
    mounts: Vec<MountMapping>,
    fixups: Vec<PathBuf>,
}

impl MountTranslator {
    /// Create a translator with the given automount prefix. An empty
    /// prefix disables prefixing.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            mounts: Vec::new(),
            fixups: Vec::new(),
        }
    }

    /// Create a translator with [`DEFAULT_AUTOMOUNT_PREFIX`].
    #[must_use]
    pub fn with_default_prefix() -> Self {
        Self::new(DEFAULT_AUTOMOUNT_PREFIX)
    }

    /// The active automount prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn absolute(path: &Path) -> Result<PathBuf> {
        std::path::absolute(path).map_err(|source| Error::PathResolution {
            path: path.to_path_buf(),
            reason: source.to_string(),
        })
    }

    /// Translate one host path to its container-visible form, recording the
    /// bind mapping and, for output paths, the ownership-fixup candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] when the host path cannot be made
    /// absolute.
    pub fn translate(&mut self, host: &Path, direction: Direction) -> Result<PathBuf> {
        let absolute = Self::absolute(host)?;
        let container = if self.prefix.is_empty() {
            absolute.clone()
        } else {
            PathBuf::from(format!("{}{}", self.prefix, absolute.display()))
        };

        let host_dir = absolute
            .parent()
            .map_or_else(|| absolute.clone(), Path::to_path_buf);
        let container_dir = container
            .parent()
            .map_or_else(|| container.clone(), Path::to_path_buf);
        if !self.mounts.iter().any(|m| m.host == host_dir) {
            self.mounts.push(MountMapping {
                host: host_dir,
                container: container_dir,
                direction,
            });
        }

        if direction == Direction::Output {
            self.fixups.push(container.clone());
        }
        Ok(container)
    }

    /// Translate a separator-joined multi-value, translating each element
    /// independently and rejoining with the same separator in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathResolution`] when any element cannot be made
    /// absolute.
    pub fn translate_joined(
        &mut self,
        value: &str,
        separator: char,
        direction: Direction,
    ) -> Result<String> {
        let translated: Result<Vec<String>> = value
            .split(separator)
            .map(|part| {
                self.translate(Path::new(part), direction)
                    .map(|p| p.display().to_string())
            })
            .collect();
        Ok(translated?.join(&separator.to_string()))
    }

    /// Rewrite a container path back to its host form by stripping the
    /// automount prefix. Paths outside the prefix pass through unchanged.
    #[must_use]
    pub fn restore(&self, container: &Path) -> PathBuf {
        if self.prefix.is_empty() {
            return container.to_path_buf();
        }
        let text = container.display().to_string();
        match text.strip_prefix(&self.prefix) {
            Some(stripped) => PathBuf::from(stripped),
            None => container.to_path_buf(),
        }
    }

    /// The deduplicated bind mappings, in first-seen order.
    #[must_use]
    pub fn mounts(&self) -> &[MountMapping] {
        &self.mounts
    }

    /// Container paths queued for post-run ownership fixup.
    #[must_use]
    pub fn fixups(&self) -> &[PathBuf] {
        &self.fixups
    }

    /// The `-v host:container` arguments for a docker invocation.
    #[must_use]
    pub fn volume_args(&self) -> Vec<String> {
        self.mounts
            .iter()
            .flat_map(|m| {
                [
                    "-v".to_string(),
                    format!("{}:{}", m.host.display(), m.container.display()),
                ]
            })
            .collect()
    }
}

impl Default for MountTranslator {
    fn default() -> Self {
        Self::with_default_prefix()
    }
}
