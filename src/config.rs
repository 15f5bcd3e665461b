use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::normalize::{FactFilter, FormSet, CANONICAL_FORMS};
use crate::transform::{TaxonomyPreference, TransformParams, IFRS_FULL, US_GAAP};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub paths: PathsConfig,
    pub filter: FilterConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Where the bulk archive is extracted.
    pub company_facts: PathBuf,
    /// Where transformed documents are written.
    pub modified_facts: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    /// ISO date; facts must end strictly after it.
    pub date_threshold: String,
    #[serde(default = "default_accepted_forms")]
    pub accepted_forms: Vec<String>,
    #[serde(default = "default_min_keys")]
    pub min_keys: usize,
}

fn default_accepted_forms() -> Vec<String> {
    CANONICAL_FORMS.iter().map(|f| f.to_string()).collect()
}
fn default_min_keys() -> usize {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct TaxonomyConfig {
    #[serde(default = "default_preferred")]
    pub preferred: String,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            preferred: default_preferred(),
            fallback: default_fallback(),
        }
    }
}

fn default_preferred() -> String {
    IFRS_FULL.to_string()
}
fn default_fallback() -> String {
    US_GAAP.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// SEC requires a contact address in the User-Agent of automated requests.
    #[serde(default)]
    pub user_agent: String,
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user_agent: String::new(),
            archive_name: default_archive_name(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    "https://www.sec.gov/Archives/edgar/daily-index/xbrl/companyfacts.zip".to_string()
}
fn default_archive_name() -> String {
    "companyfacts.zip".to_string()
}
fn default_timeout_secs() -> u64 {
    600
}

impl Config {
    /// Defaults for commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/cfx.sqlite"),
            },
            paths: PathsConfig {
                company_facts: PathBuf::from("./data/companyfacts"),
                modified_facts: PathBuf::from("./data/modified_facts"),
            },
            filter: FilterConfig {
                date_threshold: "2019-12-31".to_string(),
                accepted_forms: default_accepted_forms(),
                min_keys: default_min_keys(),
            },
            taxonomy: TaxonomyConfig::default(),
            source: SourceConfig::default(),
        }
    }

    /// Build the transform parameters from the `[filter]` and `[taxonomy]` tables.
    pub fn transform_params(&self) -> Result<TransformParams> {
        let threshold = NaiveDate::parse_from_str(&self.filter.date_threshold, "%Y-%m-%d")
            .with_context(|| {
                format!(
                    "filter.date_threshold is not a YYYY-MM-DD date: '{}'",
                    self.filter.date_threshold
                )
            })?;
        Ok(TransformParams {
            filter: FactFilter::new(threshold, FormSet::new(self.filter.accepted_forms.clone())),
            min_keys: self.filter.min_keys,
            taxonomy: TaxonomyPreference {
                preferred: self.taxonomy.preferred.clone(),
                fallback: self.taxonomy.fallback.clone(),
            },
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate filter
    config.transform_params()?;
    if config.filter.accepted_forms.is_empty() {
        anyhow::bail!("filter.accepted_forms must not be empty");
    }

    // Validate taxonomy
    if config.taxonomy.preferred == config.taxonomy.fallback {
        anyhow::bail!(
            "taxonomy.preferred and taxonomy.fallback must differ (both '{}')",
            config.taxonomy.preferred
        );
    }

    if config.paths.company_facts == config.paths.modified_facts {
        anyhow::bail!("paths.company_facts and paths.modified_facts must differ");
    }

    Ok(config)
}
