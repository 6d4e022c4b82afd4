// src/config.rs

//! Configuration loading utilities.
//!
//! The file is optional: defaults cover every setting except the CDN
//! credentials, which only come from the environment.

use std::path::{Path, PathBuf};

#[cfg(feature = "s3")]
use crate::error::AppError;
use crate::error::Result;
use crate::models::Config;
#[cfg(feature = "s3")]
use crate::storage::S3Storage;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Config loader for Lambda environment.
#[cfg(feature = "s3")]
pub struct LambdaConfigLoader {
    storage: S3Storage,
    prefix: String,
}

#[cfg(feature = "s3")]
impl LambdaConfigLoader {
    pub fn new(storage: S3Storage, config_prefix: &str) -> Self {
        Self {
            storage,
            prefix: config_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Build a loader when `CONFIG_S3_PREFIX` is set.
    pub async fn from_env() -> Result<Option<Self>> {
        match std::env::var("CONFIG_S3_PREFIX") {
            Ok(prefix) if !prefix.trim().is_empty() => {
                Ok(Some(Self::new(S3Storage::from_env().await?, &prefix)))
            }
            _ => Ok(None),
        }
    }

    /// Read `config.toml` from S3, then apply environment overrides.
    pub async fn load_config(&self) -> Result<Config> {
        let key = format!("{}/{}", self.prefix, DEFAULT_CONFIG_FILE);
        log::info!("Loading config file from S3: {}", key);
        let bytes = self
            .storage
            .read_bytes_optional(&key)
            .await?
            .ok_or_else(|| AppError::config(format!("Config file not found in S3: {}", key)))?;

        let s = String::from_utf8(bytes).map_err(|e| {
            AppError::config(format!("Config file {} is not valid UTF-8: {}", key, e))
        })?;
        let mut config: Config = toml::from_str(&s)?;
        config.apply_env();
        Ok(config)
    }
}

/// Configuration path: `PURGE_CONFIG` if set, else `config.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("PURGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration and apply environment overrides.
///
/// A missing file means defaults; a file that does not parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment lookup.
pub fn load_config_with(
    path: &Path,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load(path)?
    } else {
        log::debug!("No config file at {}; using defaults", path.display());
        Config::default()
    };
    config.apply_env_with(lookup);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::{Environment, TargetKind};

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config_with(&dir.path().join("nope.toml"), env(&[])).unwrap();
        assert_eq!(config.purge.environment, Environment::Test);
        assert!(config.is_dry_run());
    }

    #[test]
    fn test_file_then_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[purge]
environment = "development"

[services]
"browse.dev.arxiv.org" = "from-file"
"#,
        )
        .unwrap();

        let config = load_config_with(
            &path,
            env(&[
                ("FASTLY_API_TOKEN", "tok"),
                ("FASTLY_SERVICES", "browse.dev.arxiv.org=from-env"),
            ]),
        )
        .unwrap();

        assert!(!config.is_dry_run());
        let targets = config.targets(TargetKind::Announce).unwrap();
        assert_eq!(targets[0].service_id, "from-env");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[purge\n").unwrap();
        assert!(matches!(load_config_with(&path, env(&[])), Err(AppError::Toml(_))));
    }
}
