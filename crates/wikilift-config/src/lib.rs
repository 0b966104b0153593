//! Credential resolution for Backlog API access.
//!
//! Merges up to five ranked sources into one [`Credentials`] set,
//! evaluated in strict precedence and short-circuited per field:
//!
//! 1. Explicit overrides (CLI flags)
//! 2. Process environment variables
//! 3. A caller-named env file (error if named but absent)
//! 4. `./.env` in the working directory (skipped if absent)
//! 5. `~/.config/wikilift/.env` (skipped if absent)
//!
//! Each source contributes a [`PartialCredentials`]; sources are merged
//! left-to-right keeping the first non-empty value per field.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Environment variable holding the Backlog space identifier.
pub const ENV_SPACE_ID: &str = "BACKLOG_SPACE_ID";
/// Environment variable holding the Backlog API key.
pub const ENV_API_KEY: &str = "BACKLOG_API_KEY";
/// Environment variable holding the Backlog domain.
pub const ENV_DOMAIN: &str = "BACKLOG_DOMAIN";

/// Domain used when no source provides one.
pub const DEFAULT_DOMAIN: &str = "backlog.jp";

/// Global env file location (tilde-expanded at resolution time).
pub const GLOBAL_ENV_FILE: &str = "~/.config/wikilift/.env";

/// Credential resolution error.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// An env file was named explicitly but does not exist.
    #[error("env file not found: {0}")]
    EnvFileNotFound(PathBuf),

    /// An env file exists but could not be parsed.
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },

    /// Required fields still empty after merging all sources.
    #[error("missing required credential field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// Fully resolved credential set.
///
/// Invariant: all three fields are non-empty. Read-only after
/// construction and safe to reuse across all files in a batch.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Backlog space identifier (e.g. `mycompany`).
    pub space_id: String,
    /// Backlog API key.
    pub api_key: String,
    /// Backlog domain (e.g. `backlog.jp` or `backlog.com`).
    pub domain: String,
}

/// Partial credential set contributed by one source.
#[derive(Debug, Clone, Default)]
pub struct PartialCredentials {
    pub space_id: Option<String>,
    pub api_key: Option<String>,
    pub domain: Option<String>,
}

impl PartialCredentials {
    /// Read credentials from the process environment.
    #[must_use]
    pub fn from_process_env() -> Self {
        Self {
            space_id: non_empty(std::env::var(ENV_SPACE_ID).ok()),
            api_key: non_empty(std::env::var(ENV_API_KEY).ok()),
            domain: non_empty(std::env::var(ENV_DOMAIN).ok()),
        }
    }

    /// Parse a `.env`-style file without touching the process environment.
    ///
    /// Unrelated keys are ignored.
    pub fn from_env_file(path: &Path) -> Result<Self, CredentialsError> {
        let iter = dotenvy::from_path_iter(path).map_err(|source| CredentialsError::EnvFile {
            path: path.to_path_buf(),
            source,
        })?;

        let mut partial = Self::default();
        for item in iter {
            let (key, value) = item.map_err(|source| CredentialsError::EnvFile {
                path: path.to_path_buf(),
                source,
            })?;
            match key.as_str() {
                k if k == ENV_SPACE_ID => partial.space_id = non_empty(Some(value)),
                k if k == ENV_API_KEY => partial.api_key = non_empty(Some(value)),
                k if k == ENV_DOMAIN => partial.domain = non_empty(Some(value)),
                _ => {}
            }
        }
        Ok(partial)
    }

    /// Merge with a lower-ranked source, keeping existing values.
    #[must_use]
    pub fn merge(self, lower: Self) -> Self {
        Self {
            space_id: self.space_id.or(lower.space_id),
            api_key: self.api_key.or(lower.api_key),
            domain: self.domain.or(lower.domain),
        }
    }
}

/// Treat empty strings as unset so a blank flag or variable never
/// shadows a lower-ranked source.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Inputs to credential resolution for one invocation.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    /// Explicit overrides (highest precedence).
    pub overrides: PartialCredentials,
    /// Caller-named env file, if any.
    pub env_file: Option<PathBuf>,
}

impl CredentialSources {
    /// Resolve credentials from all configured sources.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialsError::EnvFileNotFound`] if a named env file
    /// is absent, and [`CredentialsError::MissingFields`] when required
    /// fields remain empty after merging.
    pub fn resolve(&self) -> Result<Credentials, CredentialsError> {
        let mut providers = vec![self.overrides.clone(), PartialCredentials::from_process_env()];

        if let Some(path) = &self.env_file {
            if !path.exists() {
                return Err(CredentialsError::EnvFileNotFound(path.clone()));
            }
            debug!("loading credentials from {}", path.display());
            providers.push(PartialCredentials::from_env_file(path)?);
        }

        for candidate in [PathBuf::from(".env"), global_env_file()] {
            if candidate.exists() {
                debug!("loading credentials from {}", candidate.display());
                providers.push(PartialCredentials::from_env_file(&candidate)?);
            }
        }

        resolve_chain(providers)
    }
}

/// Merge an ordered provider chain into a credential set.
///
/// Providers are ranked highest-first; the first non-empty value per
/// field wins. `domain` falls back to [`DEFAULT_DOMAIN`].
///
/// # Errors
///
/// Returns [`CredentialsError::MissingFields`] naming every field still
/// empty after the merge.
pub fn resolve_chain(
    providers: impl IntoIterator<Item = PartialCredentials>,
) -> Result<Credentials, CredentialsError> {
    let merged = providers
        .into_iter()
        .fold(PartialCredentials::default(), PartialCredentials::merge);

    let mut missing = Vec::new();
    if merged.space_id.is_none() {
        missing.push("space_id");
    }
    if merged.api_key.is_none() {
        missing.push("api_key");
    }
    if !missing.is_empty() {
        return Err(CredentialsError::MissingFields(missing));
    }

    Ok(Credentials {
        space_id: merged.space_id.unwrap_or_default(),
        api_key: merged.api_key.unwrap_or_default(),
        domain: merged.domain.unwrap_or_else(|| DEFAULT_DOMAIN.to_owned()),
    })
}

fn global_env_file() -> PathBuf {
    PathBuf::from(shellexpand::tilde(GLOBAL_ENV_FILE).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn partial(
        space_id: Option<&str>,
        api_key: Option<&str>,
        domain: Option<&str>,
    ) -> PartialCredentials {
        PartialCredentials {
            space_id: space_id.map(str::to_owned),
            api_key: api_key.map(str::to_owned),
            domain: domain.map(str::to_owned),
        }
    }

    #[test]
    fn test_higher_provider_wins_per_field() {
        let resolved = resolve_chain([
            partial(None, Some("X"), None),
            partial(Some("space"), Some("Y"), Some("backlog.com")),
        ])
        .unwrap();

        assert_eq!(resolved.api_key, "X");
        assert_eq!(resolved.space_id, "space");
        assert_eq!(resolved.domain, "backlog.com");
    }

    #[test]
    fn test_domain_defaults_when_unset() {
        let resolved = resolve_chain([partial(Some("space"), Some("key"), None)]).unwrap();
        assert_eq!(resolved.domain, DEFAULT_DOMAIN);
    }

    #[test]
    fn test_missing_fields_named() {
        let err = resolve_chain([partial(None, None, Some("backlog.jp"))]).unwrap_err();
        match err {
            CredentialsError::MissingFields(fields) => {
                assert_eq!(fields, vec!["space_id", "api_key"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_string_is_unset() {
        let merged = partial(Some(""), Some("key"), None).merge(partial(
            Some("lower"),
            Some("shadowed"),
            None,
        ));
        // An empty override would normally shadow; non_empty filtering
        // happens at the source boundary, so simulate it here.
        let resolved = resolve_chain([
            PartialCredentials {
                space_id: non_empty(Some(String::new())),
                ..Default::default()
            },
            partial(Some("lower"), Some("key"), None),
        ])
        .unwrap();

        assert_eq!(resolved.space_id, "lower");
        assert_eq!(merged.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_env_file_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "BACKLOG_SPACE_ID=demo\nBACKLOG_API_KEY=secret\nUNRELATED=1\n",
        )
        .unwrap();

        let partial = PartialCredentials::from_env_file(&path).unwrap();
        assert_eq!(partial.space_id.as_deref(), Some("demo"));
        assert_eq!(partial.api_key.as_deref(), Some("secret"));
        assert_eq!(partial.domain, None);
    }

    #[test]
    fn test_named_env_file_must_exist() {
        let sources = CredentialSources {
            env_file: Some(PathBuf::from("/nonexistent/creds.env")),
            ..Default::default()
        };

        let err = sources.resolve().unwrap_err();
        assert!(matches!(err, CredentialsError::EnvFileNotFound(_)));
    }

    #[test]
    fn test_named_env_file_fills_gaps_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.env");
        std::fs::write(
            &path,
            "BACKLOG_SPACE_ID=from-file\nBACKLOG_API_KEY=file-key\n",
        )
        .unwrap();

        let sources = CredentialSources {
            overrides: partial(Some("from-cli"), None, None),
            env_file: Some(path),
        };

        let resolved = sources.resolve().unwrap();
        assert_eq!(resolved.space_id, "from-cli");
        assert_eq!(resolved.api_key, "file-key");
    }
}
