//! Application configuration structures.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Deployment environment. Decides where purges go, never which keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    Production,
    Development,
    /// Anything else: purges are logged, never sent.
    #[default]
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Test => "test",
        }
    }
}

impl From<String> for Environment {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "production" => Environment::Production,
            "development" => Environment::Development,
            _ => Environment::Test,
        }
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CDN service to purge, named by the domain it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeTarget {
    pub domain: String,
    pub service_id: String,
}

/// Which purge list a caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Pages for individual papers and listings
    Paper,
    /// The daily `announce` key
    Announce,
}

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Purge behavior settings
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Retry policy for purge requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// CDN domain to service id
    #[serde(default)]
    pub services: BTreeMap<String, String>,

    /// Purge targets per environment
    #[serde(default)]
    pub environments: EnvironmentsConfig,

    /// Storage object classification
    #[serde(default)]
    pub objects: ObjectsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`.
    ///
    /// - `ENVIRONMENT`: `production`, `development`, anything else is test
    /// - `ALWAYS_SOFT_PURGE`, `DRY_RUN`: `1` turns the flag on, `0` off
    /// - `FASTLY_API_TOKEN`: CDN API token
    /// - `FASTLY_API_BASE`: CDN API base URL
    /// - `FASTLY_SERVICES`: `domain=service_id` pairs separated by commas
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(env) = lookup("ENVIRONMENT") {
            self.purge.environment = Environment::from(env);
        }
        if let Some(flag) = lookup("ALWAYS_SOFT_PURGE") {
            self.purge.always_soft_purge = flag.trim() == "1";
        }
        if let Some(flag) = lookup("DRY_RUN") {
            self.purge.dry_run = flag.trim() == "1";
        }
        if let Some(token) = lookup("FASTLY_API_TOKEN") {
            self.purge.api_token = Some(token.trim().to_string());
        }
        if let Some(base) = lookup("FASTLY_API_BASE") {
            self.purge.api_base = base.trim().to_string();
        }
        if let Some(services) = lookup("FASTLY_SERVICES") {
            for pair in services.split(',') {
                match pair.split_once('=') {
                    Some((domain, id)) => {
                        self.services
                            .insert(domain.trim().to_string(), id.trim().to_string());
                    }
                    None if pair.trim().is_empty() => {}
                    None => log::warn!("Ignoring malformed FASTLY_SERVICES entry '{pair}'"),
                }
            }
        }
    }

    /// Whether purges should be logged instead of sent.
    pub fn is_dry_run(&self) -> bool {
        self.purge.dry_run || self.purge.environment == Environment::Test
    }

    /// Domains to purge for the configured environment.
    pub fn target_domains(&self, kind: TargetKind) -> &[String] {
        let targets = match self.purge.environment {
            Environment::Production => &self.environments.production,
            Environment::Development => &self.environments.development,
            Environment::Test => return &[],
        };
        match kind {
            TargetKind::Paper => &targets.paper_targets,
            TargetKind::Announce => &targets.announce_targets,
        }
    }

    /// Resolve purge targets for the configured environment.
    ///
    /// In dry-run mode unknown service ids are tolerated since nothing is
    /// sent.
    pub fn targets(&self, kind: TargetKind) -> Result<Vec<PurgeTarget>> {
        self.target_domains(kind)
            .iter()
            .map(|domain| match self.services.get(domain) {
                Some(service_id) => Ok(PurgeTarget {
                    domain: domain.clone(),
                    service_id: service_id.clone(),
                }),
                None if self.is_dry_run() => Ok(PurgeTarget {
                    domain: domain.clone(),
                    service_id: String::new(),
                }),
                None => Err(AppError::config(format!(
                    "No CDN service id configured for {domain}"
                ))),
            })
            .collect()
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.purge.api_base.trim().is_empty() {
            return Err(AppError::validation("purge.api_base is empty"));
        }
        url::Url::parse(&self.purge.api_base)?;
        if self.purge.timeout_secs == 0 {
            return Err(AppError::validation("purge.timeout_secs must be > 0"));
        }
        if !(1..=defaults::MAX_KEYS_PER_REQUEST).contains(&self.purge.max_keys_per_request) {
            return Err(AppError::validation(format!(
                "purge.max_keys_per_request must be between 1 and {}",
                defaults::MAX_KEYS_PER_REQUEST
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(AppError::validation("retry.backoff_multiplier must be >= 1"));
        }
        if !self.is_dry_run() {
            if self.purge.api_token.as_deref().is_none_or(str::is_empty) {
                return Err(AppError::validation(
                    "FASTLY_API_TOKEN is required outside dry-run mode",
                ));
            }
            self.targets(TargetKind::Paper)?;
            self.targets(TargetKind::Announce)?;
        }
        Ok(())
    }
}

/// Purge behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Always mark content stale instead of evicting it
    #[serde(default)]
    pub always_soft_purge: bool,

    /// Log purges instead of sending them
    #[serde(default)]
    pub dry_run: bool,

    /// CDN API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// CDN API token; only read from the environment
    #[serde(skip)]
    pub api_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for API requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Keys sent per purge request
    #[serde(default = "defaults::max_keys_per_request")]
    pub max_keys_per_request: usize,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            always_soft_purge: false,
            dry_run: false,
            api_base: defaults::api_base(),
            api_token: None,
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            max_keys_per_request: defaults::max_keys_per_request(),
        }
    }
}

/// Retry settings for purge requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on any single delay in milliseconds
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            initial_backoff_ms: defaults::initial_backoff(),
            max_backoff_ms: defaults::max_backoff(),
            backoff_multiplier: defaults::backoff_multiplier(),
        }
    }
}

/// Purge targets for the live environments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentsConfig {
    #[serde(default = "defaults::production_targets")]
    pub production: TargetsConfig,

    #[serde(default = "defaults::development_targets")]
    pub development: TargetsConfig,
}

impl Default for EnvironmentsConfig {
    fn default() -> Self {
        Self {
            production: defaults::production_targets(),
            development: defaults::development_targets(),
        }
    }
}

/// Domains purged in one environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TargetsConfig {
    /// Domains serving paper and listing pages
    #[serde(default)]
    pub paper_targets: Vec<String>,

    /// Domains that receive the daily `announce` purge
    #[serde(default)]
    pub announce_targets: Vec<String>,
}

/// Storage object classification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectsConfig {
    /// Substrings marking objects that are never served
    #[serde(default = "defaults::ignored_patterns")]
    pub ignored_patterns: Vec<String>,

    /// Buckets holding HTML conversions keyed by bare paper id
    #[serde(default = "defaults::html_buckets")]
    pub html_buckets: Vec<String>,
}

impl Default for ObjectsConfig {
    fn default() -> Self {
        Self {
            ignored_patterns: defaults::ignored_patterns(),
            html_buckets: defaults::html_buckets(),
        }
    }
}

mod defaults {
    use super::TargetsConfig;

    /// Surrogate keys the CDN accepts per purge request.
    pub const MAX_KEYS_PER_REQUEST: usize = 256;

    // Purge defaults
    pub fn api_base() -> String {
        "https://api.fastly.com".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        concat!("purger/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn max_keys_per_request() -> usize {
        MAX_KEYS_PER_REQUEST
    }

    // Retry defaults
    pub fn max_attempts() -> u32 {
        5
    }
    pub fn initial_backoff() -> u64 {
        1_000
    }
    pub fn max_backoff() -> u64 {
        60_000
    }
    pub fn backoff_multiplier() -> f64 {
        2.0
    }

    // Target defaults
    pub fn production_targets() -> TargetsConfig {
        TargetsConfig {
            paper_targets: vec!["arxiv.org".into()],
            announce_targets: vec![
                "arxiv.org".into(),
                "rss.arxiv.org".into(),
                "export.arxiv.org".into(),
            ],
        }
    }
    pub fn development_targets() -> TargetsConfig {
        TargetsConfig {
            paper_targets: vec!["browse.dev.arxiv.org".into()],
            announce_targets: vec!["browse.dev.arxiv.org".into()],
        }
    }

    // Object defaults
    pub fn ignored_patterns() -> Vec<String> {
        vec!["LaTeXML.cache".into(), "outcome.tar.gz".into()]
    }
    pub fn html_buckets() -> Vec<String> {
        vec!["latexml_document_conversions".into()]
    }
}
