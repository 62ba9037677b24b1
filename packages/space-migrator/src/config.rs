use anyhow::{anyhow, Context, Result};
use confluence_client::{Auth, ConfluenceClient};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::kernel::{ListLimits, RetryConfig, RetryPolicy};
use crate::migration::{MigrationOptions, PageOrdering};

/// Where an instance lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub base_url: String,
    pub auth: Auth,
}

impl InstanceConfig {
    pub fn client(&self, timeout: Duration) -> Result<ConfluenceClient> {
        ConfluenceClient::with_timeout(&self.base_url, self.auth.clone(), timeout)
            .with_context(|| format!("invalid Confluence base URL '{}'", self.base_url))
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub source: InstanceConfig,
    pub destination: InstanceConfig,
    pub page_limit: u32,
    pub space_limit: u32,
    pub http_timeout: Duration,
    pub retry: RetryConfig,
    pub attachment_dump_dir: Option<PathBuf>,
    /// Space keys to migrate; empty means all.
    pub space_keys: Vec<String>,
    pub page_ordering: PageOrdering,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{} must be set", key));

        let source_auth = match get("SOURCE_BEARER_TOKEN") {
            Some(token) => Auth::bearer(token),
            None => Auth::basic(
                required("SOURCE_EMAIL")
                    .context("set SOURCE_EMAIL and SOURCE_API_TOKEN, or SOURCE_BEARER_TOKEN")?,
                required("SOURCE_API_TOKEN")?,
            ),
        };

        let read_defaults = RetryPolicy::default();
        let base_delay = Duration::from_millis(number(&get, "MIGRATION_RETRY_BASE_DELAY_MS", 250)?);
        let max_delay = Duration::from_millis(number(&get, "MIGRATION_RETRY_MAX_DELAY_MS", 5000)?);
        let retry = RetryConfig {
            read: RetryPolicy {
                max_attempts: number(&get, "MIGRATION_READ_MAX_ATTEMPTS", read_defaults.max_attempts)?,
                base_delay,
                max_delay,
            },
            write: RetryPolicy {
                max_attempts: number(&get, "MIGRATION_WRITE_MAX_ATTEMPTS", read_defaults.max_attempts)?,
                base_delay,
                max_delay,
            },
        };

        let page_ordering = match get("MIGRATION_PAGE_ORDERING") {
            Some(value) => PageOrdering::from_str(&value)
                .map_err(|e| anyhow!(e))
                .context("MIGRATION_PAGE_ORDERING must be 'depth' or 'listing'")?,
            None => PageOrdering::default(),
        };

        Ok(Self {
            source: InstanceConfig {
                base_url: required("SOURCE_BASE_URL")?,
                auth: source_auth,
            },
            destination: InstanceConfig {
                base_url: required("DEST_BASE_URL")?,
                auth: Auth::basic(required("DEST_EMAIL")?, required("DEST_API_TOKEN")?),
            },
            page_limit: number(&get, "MIGRATION_PAGE_LIMIT", 100)?,
            space_limit: number(&get, "MIGRATION_SPACE_LIMIT", 1000)?,
            http_timeout: Duration::from_secs(number(&get, "MIGRATION_HTTP_TIMEOUT_SECS", 60)?),
            retry,
            attachment_dump_dir: get("MIGRATION_ATTACHMENT_DUMP_DIR").map(PathBuf::from),
            space_keys: get("MIGRATION_SPACES")
                .map(|v| split_keys(&v))
                .unwrap_or_default(),
            page_ordering,
        })
    }

    pub fn list_limits(&self) -> ListLimits {
        ListLimits {
            spaces: self.space_limit,
            content: self.page_limit,
        }
    }

    pub fn migration_options(&self, dry_run: bool) -> MigrationOptions {
        MigrationOptions {
            page_ordering: self.page_ordering,
            space_keys: self.space_keys.clone(),
            attachment_dump_dir: self.attachment_dump_dir.clone(),
            dry_run,
        }
    }
}

fn number<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

/// Comma-separated space keys, trimmed, blanks dropped.
pub fn split_keys(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
