use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::FieldstatError;
use crate::{ces, laus, oews, qcew};

const DEFAULT_CONFIG_FILE: &str = "fieldstat.json";
const DEFAULT_COUNTY_REFERENCE: &str = "county_offices.csv";
const DEFAULT_MSA_REFERENCE: &str = "msa_offices.csv";

/// Raw on-disk configuration. Every field is optional; omitted fields
/// fall back to the compiled-in defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub county_reference: Option<String>,
    #[serde(default)]
    pub msa_reference: Option<String>,
    #[serde(default)]
    pub endpoints: Option<Endpoints>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Endpoints {
    #[serde(default)]
    pub laus: Option<String>,
    #[serde(default)]
    pub qcew: Option<String>,
    #[serde(default)]
    pub oews_series: Option<String>,
    #[serde(default)]
    pub oews_data: Option<String>,
    #[serde(default)]
    pub ces_series: Option<String>,
    #[serde(default)]
    pub ces_data: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub county_reference: Utf8PathBuf,
    pub msa_reference: Utf8PathBuf,
    pub laus_url: String,
    pub qcew_url: String,
    pub oews_series_url: String,
    pub oews_data_url: String,
    pub ces_series_url: String,
    pub ces_data_url: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// With no explicit path, a missing `fieldstat.json` simply yields
    /// the defaults; an explicit path must be readable.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, FieldstatError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| FieldstatError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| FieldstatError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let endpoints = config.endpoints.unwrap_or_default();
        ResolvedConfig {
            county_reference: Utf8PathBuf::from(
                config
                    .county_reference
                    .unwrap_or_else(|| DEFAULT_COUNTY_REFERENCE.to_string()),
            ),
            msa_reference: Utf8PathBuf::from(
                config
                    .msa_reference
                    .unwrap_or_else(|| DEFAULT_MSA_REFERENCE.to_string()),
            ),
            laus_url: endpoints
                .laus
                .unwrap_or_else(|| laus::LAUS_FEED_URL.to_string()),
            qcew_url: endpoints
                .qcew
                .unwrap_or_else(|| qcew::QCEW_ARCHIVE_URL.to_string()),
            oews_series_url: endpoints
                .oews_series
                .unwrap_or_else(|| oews::OEWS_SERIES_URL.to_string()),
            oews_data_url: endpoints
                .oews_data
                .unwrap_or_else(|| oews::OEWS_DATA_URL.to_string()),
            ces_series_url: endpoints
                .ces_series
                .unwrap_or_else(|| ces::CES_SERIES_URL.to_string()),
            ces_data_url: endpoints
                .ces_data
                .unwrap_or_else(|| ces::CES_DATA_URL.to_string()),
        }
    }
}
