//! Build-time metadata stamped into generated artifacts.
//!
//! All values are explicit inputs collected by the caller; generation code
//! never reads the clock or the environment itself, which keeps artifact
//! text deterministic under test.

use chrono::{DateTime, FixedOffset};

/// Metadata describing the build that produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Generation time, with offset
    pub timestamp: DateTime<FixedOffset>,
    /// Source-control commit id
    pub commit: Option<String>,
    /// Explicit link to the source repository
    pub repository: Option<String>,
    /// Raw git remote, normalized when no explicit repository link is set
    pub remote: Option<String>,
}

impl BuildInfo {
    /// Create build info for the given generation time.
    #[must_use]
    pub fn new(timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            timestamp,
            commit: None,
            repository: None,
            remote: None,
        }
    }

    /// Attach a source-control commit id.
    #[must_use]
    pub fn with_commit(mut self, commit: Option<String>) -> Self {
        self.commit = commit;
        self
    }

    /// Attach an explicit repository link.
    #[must_use]
    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository;
        self
    }

    /// Attach a raw git remote.
    #[must_use]
    pub fn with_remote(mut self, remote: Option<String>) -> Self {
        self.remote = remote;
        self
    }

    /// The source URL for image metadata: the explicit repository link when
    /// present, otherwise the normalized git remote.
    #[must_use]
    pub fn source_url(&self) -> Option<String> {
        self.repository
            .clone()
            .or_else(|| self.remote.as_deref().map(normalize_remote))
    }
}

/// Rewrite an ssh-form git remote to its https equivalent.
///
/// `git@github.com:org/repo.git` becomes `https://github.com/org/repo`;
/// remotes already in https form only lose a trailing `.git`.
#[must_use]
pub fn normalize_remote(remote: &str) -> String {
    let trimmed = remote.trim().trim_end_matches(".git");
    if let Some(rest) = trimmed.strip_prefix("git@") {
        if let Some((host, path)) = rest.split_once(':') {
            return format!("https://{host}/{path}");
        }
    }
    if let Some(rest) = trimmed.strip_prefix("ssh://git@") {
        return format!("https://{rest}");
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn info() -> BuildInfo {
        let timestamp = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 17, 10, 0, 0)
            .unwrap();
        BuildInfo::new(timestamp)
    }

    #[test]
    fn ssh_remotes_are_rewritten_to_https() {
        assert_eq!(
            normalize_remote("git@github.com:acme/tools.git"),
            "https://github.com/acme/tools"
        );
        assert_eq!(
            normalize_remote("ssh://git@gitlab.com/acme/tools"),
            "https://gitlab.com/acme/tools"
        );
        assert_eq!(
            normalize_remote("https://github.com/acme/tools.git"),
            "https://github.com/acme/tools"
        );
    }

    #[test]
    fn explicit_repository_wins_over_remote() {
        let info = info()
            .with_repository(Some("https://example.com/acme".to_string()))
            .with_remote(Some("git@github.com:acme/tools.git".to_string()));
        assert_eq!(info.source_url().unwrap(), "https://example.com/acme");
    }

    #[test]
    fn remote_is_normalized_when_no_repository_is_set() {
        let info = info().with_remote(Some("git@github.com:acme/tools.git".to_string()));
        assert_eq!(info.source_url().unwrap(), "https://github.com/acme/tools");
    }
}
