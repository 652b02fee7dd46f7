//! Configuration Management
//!
//! Handles persistent configuration storage for awscheck.

use crate::aws::profile;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which backend answers describe calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Shell out to the `aws` CLI
    #[default]
    AwsCli,
    /// Read an inventory HTTP endpoint
    Http,
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Region for provider calls
    #[serde(default)]
    pub region: Option<String>,
    /// Named AWS profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Backend to use
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    /// Inventory endpoint for the http backend
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awscheck").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from `path`; missing or unreadable files yield defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Cannot read config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;

        Ok(())
    }

    /// Get effective profile (CLI > config > environment)
    pub fn effective_profile(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.profile.clone())
            .filter(|p| {
                let valid = profile::validate_profile(p);
                if !valid {
                    tracing::warn!("Ignoring invalid profile name {:?}", p);
                }
                valid
            })
            .or_else(profile::get_default_profile)
    }

    /// Get effective region (CLI > config > environment > AWS config file > us-east-1)
    pub fn effective_region(&self, cli: Option<&str>, profile_name: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.region.clone())
            .filter(|r| {
                let valid = profile::validate_region(r);
                if !valid {
                    tracing::warn!("Ignoring invalid region {:?}", r);
                }
                valid
            })
            .or_else(|| profile::get_default_region(profile_name))
            .unwrap_or_else(|| profile::FALLBACK_REGION.to_string())
    }

    /// Get effective backend (CLI > config > aws-cli)
    pub fn effective_provider(&self, cli: Option<ProviderKind>) -> ProviderKind {
        cli.or(self.provider).unwrap_or_default()
    }

    /// Get effective inventory endpoint (CLI > config)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string).or_else(|| self.endpoint.clone())
    }

    /// Overlay the given settings; `None` leaves a setting unchanged
    pub fn update(
        &mut self,
        region: Option<&str>,
        profile_name: Option<&str>,
        provider: Option<ProviderKind>,
        endpoint: Option<&str>,
    ) -> Result<()> {
        if let Some(region) = region {
            anyhow::ensure!(profile::validate_region(region), "invalid region `{}`", region);
            self.region = Some(region.to_string());
        }
        if let Some(name) = profile_name {
            anyhow::ensure!(profile::validate_profile(name), "invalid profile `{}`", name);
            self.profile = Some(name.to_string());
        }
        if let Some(provider) = provider {
            self.provider = Some(provider);
        }
        if let Some(endpoint) = endpoint {
            url::Url::parse(endpoint).with_context(|| format!("invalid endpoint `{}`", endpoint))?;
            self.endpoint = Some(endpoint.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("config.json")), Config::default());
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config
            .update(
                Some("eu-west-1"),
                Some("ops"),
                Some(ProviderKind::Http),
                Some("http://localhost:9000"),
            )
            .unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded, config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"provider\": \"http\""));
    }

    #[test]
    fn test_update_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(config.update(Some("not a region"), None, None, None).is_err());
        assert!(config.update(None, Some("bad profile!"), None, None).is_err());
        assert!(config.update(None, None, None, Some("::nope")).is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            region: Some("eu-west-1".to_string()),
            profile: Some("ops".to_string()),
            provider: Some(ProviderKind::Http),
            endpoint: Some("http://inventory".to_string()),
        };

        assert_eq!(config.effective_region(Some("ap-south-1"), None), "ap-south-1");
        assert_eq!(config.effective_region(None, None), "eu-west-1");
        assert_eq!(config.effective_profile(Some("dev")).as_deref(), Some("dev"));
        assert_eq!(config.effective_profile(None).as_deref(), Some("ops"));
        assert_eq!(config.effective_provider(Some(ProviderKind::AwsCli)), ProviderKind::AwsCli);
        assert_eq!(config.effective_provider(None), ProviderKind::Http);
        assert_eq!(config.effective_endpoint(None).as_deref(), Some("http://inventory"));
    }

    #[test]
    fn test_default_provider() {
        assert_eq!(Config::default().effective_provider(None), ProviderKind::AwsCli);
    }
}
