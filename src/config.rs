//! Configuration Management
//!
//! Handles persistent configuration storage for gcpctl.

use crate::compute::Channel;
use crate::gcp::client::Endpoints;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-API root URL overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EndpointOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataflow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataproc: Option<String>,
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: Option<String>,
    /// Default zone for zonal references
    #[serde(default)]
    pub zone: Option<String>,
    /// Default region for regional references
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub api_endpoint_overrides: EndpointOverrides,
}

/// Keys accepted by `config set` and `config unset`
pub const KEYS: &[&str] = &[
    "project",
    "zone",
    "region",
    "channel",
    "api_endpoint_overrides/compute",
    "api_endpoint_overrides/iam",
    "api_endpoint_overrides/dataflow",
    "api_endpoint_overrides/dataproc",
];

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcpctl").join("config.json"))
    }

    /// Load configuration from disk; a missing or unreadable file yields defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No configuration directory available")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| self.project.clone())
            .or_else(crate::gcp::auth::get_default_project)
            .filter(|p| !p.is_empty())
    }

    /// Get effective zone (config > gcloud default)
    pub fn effective_zone(&self) -> Option<String> {
        self.zone
            .clone()
            .or_else(crate::gcp::auth::get_default_zone)
    }

    /// Get effective region (config > gcloud default)
    pub fn effective_region(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(crate::gcp::auth::get_default_region)
    }

    /// Get effective channel (CLI > config > GA)
    pub fn effective_channel(&self, cli: Option<Channel>) -> Channel {
        cli.or(self.channel).unwrap_or_default()
    }

    /// API roots with the configured overrides applied
    pub fn endpoints(&self) -> Endpoints {
        let mut endpoints = Endpoints::default();
        let overrides = &self.api_endpoint_overrides;
        if let Some(compute) = &overrides.compute {
            endpoints.compute = compute.clone();
        }
        if let Some(iam) = &overrides.iam {
            endpoints.iam = iam.clone();
        }
        if let Some(dataflow) = &overrides.dataflow {
            endpoints.dataflow = dataflow.clone();
        }
        if let Some(dataproc) = &overrides.dataproc {
            endpoints.dataproc = dataproc.clone();
        }
        endpoints
    }

    fn slot(&mut self, key: &str) -> Result<&mut Option<String>> {
        Ok(match key {
            "project" => &mut self.project,
            "zone" => &mut self.zone,
            "region" => &mut self.region,
            "api_endpoint_overrides/compute" => &mut self.api_endpoint_overrides.compute,
            "api_endpoint_overrides/iam" => &mut self.api_endpoint_overrides.iam,
            "api_endpoint_overrides/dataflow" => &mut self.api_endpoint_overrides.dataflow,
            "api_endpoint_overrides/dataproc" => &mut self.api_endpoint_overrides.dataproc,
            other => bail!(
                "Unknown configuration key [{}]. Valid keys: {}",
                other,
                KEYS.join(", ")
            ),
        })
    }

    /// Set one key, validating its value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "channel" => {
                self.channel = Some(value.parse().map_err(anyhow::Error::msg)?);
            }
            "project" if !crate::gcp::auth::validate_project_id(value) => {
                bail!("Invalid project ID [{}]", value);
            }
            k if k.starts_with("api_endpoint_overrides/") => {
                url::Url::parse(value).with_context(|| format!("Invalid URL [{}]", value))?;
                *self.slot(k)? = Some(value.trim_end_matches('/').to_string());
            }
            k => *self.slot(k)? = Some(value.to_string()),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "channel" => self.channel = None,
            k => *self.slot(k)? = None,
        }
        Ok(())
    }

    /// Set keys and their values, in [`KEYS`] order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let overrides = &self.api_endpoint_overrides;
        let values = [
            self.project.clone(),
            self.zone.clone(),
            self.region.clone(),
            self.channel.map(|c| c.as_str().to_string()),
            overrides.compute.clone(),
            overrides.iam.clone(),
            overrides.dataflow.clone(),
            overrides.dataproc.clone(),
        ];

        KEYS.iter()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (*key, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_unset() {
        let mut config = Config::default();
        config.set("zone", "us-central1-a").unwrap();
        config.set("channel", "alpha").unwrap();
        config
            .set("api_endpoint_overrides/compute", "http://localhost:8080/")
            .unwrap();

        assert_eq!(config.zone.as_deref(), Some("us-central1-a"));
        assert_eq!(config.channel, Some(Channel::Alpha));
        assert_eq!(config.endpoints().compute, "http://localhost:8080");

        config.unset("channel").unwrap();
        assert_eq!(config.effective_channel(None), Channel::Ga);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("project", "Not A Project").is_err());
        assert!(config.set("channel", "preview").is_err());
        assert!(config.set("api_endpoint_overrides/iam", "not a url").is_err());
        assert!(config.set("colour", "blue").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_cli_wins_over_config() {
        let config = Config {
            project: Some("from-config".into()),
            channel: Some(Channel::Beta),
            ..Default::default()
        };
        assert_eq!(
            config.effective_project(Some("from-flag")).as_deref(),
            Some("from-flag")
        );
        assert_eq!(config.effective_project(None).as_deref(), Some("from-config"));
        assert_eq!(config.effective_channel(Some(Channel::Alpha)), Channel::Alpha);
        assert_eq!(config.effective_channel(None), Channel::Beta);
    }

    #[test]
    fn test_entries_follow_key_order() {
        let config = Config {
            region: Some("europe-west1".into()),
            project: Some("p-123456".into()),
            ..Default::default()
        };
        assert_eq!(
            config.entries(),
            vec![
                ("project", "p-123456".to_string()),
                ("region", "europe-west1".to_string())
            ]
        );
    }

    #[test]
    fn test_round_trip_through_file() {
        let path = std::env::temp_dir()
            .join(format!("gcpctl-test-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let config = Config {
            zone: Some("asia-east1-b".into()),
            channel: Some(Channel::Beta),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
