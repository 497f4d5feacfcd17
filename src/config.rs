//! Runtime configuration loaded from environment variables.

use crate::marketplace::domain::{LifecycleEngine, UploadPolicy};
use camino::Utf8PathBuf;
use chrono::Duration;
use thiserror::Error;

/// Marketplace runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Directory uploaded files are stored in.
    pub upload_root: Utf8PathBuf,
    /// Maximum number of pooled database connections.
    pub db_pool_size: u32,
    /// Days after closure during which ratings are accepted.
    pub rating_window_days: u32,
    /// Extensions allowed for proposal documents.
    pub proposal_extensions: Vec<String>,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl Config {
    const DATABASE_URL: &'static str = "TENDER_DATABASE_URL";
    const UPLOAD_ROOT: &'static str = "TENDER_UPLOAD_ROOT";
    const DB_POOL_SIZE: &'static str = "TENDER_DB_POOL_SIZE";
    const RATING_WINDOW_DAYS: &'static str = "TENDER_RATING_WINDOW_DAYS";
    const PROPOSAL_EXTENSIONS: &'static str = "TENDER_PROPOSAL_EXTENSIONS";
    const MAX_UPLOAD_BYTES: &'static str = "TENDER_MAX_UPLOAD_BYTES";

    /// Loads configuration from the process environment.
    ///
    /// Required:
    /// - `TENDER_DATABASE_URL`: `PostgreSQL` connection string
    ///
    /// Optional (with defaults):
    /// - `TENDER_UPLOAD_ROOT`: upload directory (default: `static/uploads`)
    /// - `TENDER_DB_POOL_SIZE`: pooled connections (default: 10)
    /// - `TENDER_RATING_WINDOW_DAYS`: rating window (default: 14)
    /// - `TENDER_PROPOSAL_EXTENSIONS`: comma-separated list (default: `pdf`)
    /// - `TENDER_MAX_UPLOAD_BYTES`: upload size limit (default: 20 MiB)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value of
    /// a variable or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a
    /// value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(Self::DATABASE_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(Self::DATABASE_URL))?;
        let upload_root = lookup(Self::UPLOAD_ROOT)
            .map_or_else(|| Utf8PathBuf::from("static/uploads"), Utf8PathBuf::from);
        let db_pool_size = parse_positive(&lookup, Self::DB_POOL_SIZE, 10)?;
        let rating_window_days = parse_positive(
            &lookup,
            Self::RATING_WINDOW_DAYS,
            LifecycleEngine::DEFAULT_RATING_WINDOW_DAYS,
        )?;
        let max_upload_bytes = parse_positive(&lookup, Self::MAX_UPLOAD_BYTES, 20 * 1024 * 1024)?;
        let proposal_extensions = lookup(Self::PROPOSAL_EXTENSIONS).map_or_else(
            || vec!["pdf".to_owned()],
            |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|ext| !ext.is_empty())
                    .map(str::to_owned)
                    .collect()
            },
        );

        Ok(Self {
            database_url,
            upload_root,
            db_pool_size,
            rating_window_days,
            proposal_extensions,
            max_upload_bytes,
        })
    }

    /// Builds the lifecycle engine for the configured rating window.
    #[must_use]
    pub fn lifecycle_engine(&self) -> LifecycleEngine {
        LifecycleEngine::new(Duration::days(i64::from(self.rating_window_days)))
    }

    /// Builds the upload policy.
    #[must_use]
    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy::new(self.max_upload_bytes, self.proposal_extensions.iter().cloned())
    }
}

fn parse_positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::Invalid(key, "must be a positive integer")),
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};
    use crate::marketplace::domain::LifecycleEngine;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[rstest]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_lookup(lookup_from(&[(
            "TENDER_DATABASE_URL",
            "postgres://localhost/tender",
        )]))
        .expect("config should load");

        assert_eq!(config.database_url, "postgres://localhost/tender");
        assert_eq!(config.upload_root.as_str(), "static/uploads");
        assert_eq!(config.db_pool_size, 10);
        assert_eq!(config.rating_window_days, 14);
        assert_eq!(config.proposal_extensions, vec!["pdf".to_owned()]);
        assert_eq!(config.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[rstest]
    fn default_rating_window_matches_the_default_engine() {
        let config = Config::from_lookup(lookup_from(&[(
            "TENDER_DATABASE_URL",
            "postgres://localhost/tender",
        )]))
        .expect("config should load");

        assert_eq!(
            config.rating_window_days,
            LifecycleEngine::DEFAULT_RATING_WINDOW_DAYS
        );
        assert_eq!(config.lifecycle_engine(), LifecycleEngine::default());
    }

    #[rstest]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("TENDER_DATABASE_URL", "postgres://db/tender"),
            ("TENDER_UPLOAD_ROOT", "/srv/uploads"),
            ("TENDER_DB_POOL_SIZE", "4"),
            ("TENDER_RATING_WINDOW_DAYS", "7"),
            ("TENDER_PROPOSAL_EXTENSIONS", "pdf, docx ,"),
            ("TENDER_MAX_UPLOAD_BYTES", "1024"),
        ]))
        .expect("config should load");

        assert_eq!(config.upload_root.as_str(), "/srv/uploads");
        assert_eq!(config.db_pool_size, 4);
        assert_eq!(config.lifecycle_engine().rating_window().num_days(), 7);
        assert_eq!(config.proposal_extensions, vec!["pdf".to_owned(), "docx".to_owned()]);
        assert_eq!(config.upload_policy().max_bytes(), 1024);
    }

    #[rstest]
    fn missing_database_url_is_reported() {
        let result = Config::from_lookup(lookup_from(&[]));
        assert_eq!(result, Err(ConfigError::Missing("TENDER_DATABASE_URL")));
    }

    #[rstest]
    #[case("TENDER_DB_POOL_SIZE", "zero")]
    #[case("TENDER_DB_POOL_SIZE", "0")]
    #[case("TENDER_RATING_WINDOW_DAYS", "-3")]
    #[case("TENDER_MAX_UPLOAD_BYTES", "")]
    fn invalid_numbers_are_rejected(#[case] key: &'static str, #[case] value: &str) {
        let result = Config::from_lookup(lookup_from(&[
            ("TENDER_DATABASE_URL", "postgres://db/tender"),
            (key, value),
        ]));
        assert_eq!(
            result,
            Err(ConfigError::Invalid(key, "must be a positive integer"))
        );
    }
}
