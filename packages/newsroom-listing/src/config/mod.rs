//! Listing configuration
//!
//! Defaults match the production newslist block, so most callers use
//! `ListingConfig::default()`. Deployments override settings with a versioned
//! YAML file:
//!
//! ```yaml
//! version: 1
//! listing:
//!   collection: articles
//!   page_size: 10
//!   field_policy: strict
//! ```

pub mod error;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use validation::Validatable;

use serde::{Deserialize, Serialize};
use std::path::Path;

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// How a category filter treats a record lacking the filtered field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldPolicy {
    /// Fail the listing with `ListingError::FieldMissing` (development)
    Strict,
    /// Treat the record as not matching (production)
    #[default]
    Lenient,
}

impl FieldPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }

    pub fn parse(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for FieldPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine settings for one listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Index document path handed to the transport
    pub index_path: String,

    /// Collection (sheet) holding the articles
    pub collection: String,

    /// Items per displayed page (1..=100)
    pub page_size: usize,

    /// Records requested per transport round trip while walking (1..=10000)
    pub chunk_size: usize,

    /// Maximum search query length after sanitizing (1..=256)
    pub query_max_chars: usize,

    /// Maximum characters of an extracted card description (1..=100000)
    pub description_max_chars: usize,

    pub field_policy: FieldPolicy,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            index_path: "/query-index.json".to_string(),
            collection: "articles".to_string(),
            page_size: 10,
            chunk_size: 255,
            query_max_chars: 60,
            description_max_chars: 800,
            field_policy: FieldPolicy::Lenient,
        }
    }
}

impl Validatable for ListingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::check_non_empty("index_path", &self.index_path)?;
        validation::check_non_empty("collection", &self.collection)?;
        validation::check_range(
            "page_size",
            self.page_size,
            1,
            100,
            "The pager assumes 10 items per page.",
        )?;
        validation::check_range(
            "chunk_size",
            self.chunk_size,
            1,
            10_000,
            "Larger chunks mean fewer round trips but more over-fetching.",
        )?;
        validation::check_range(
            "query_max_chars",
            self.query_max_chars,
            1,
            256,
            "The search input is limited to 60 characters.",
        )?;
        validation::check_range(
            "description_max_chars",
            self.description_max_chars,
            1,
            100_000,
            "Card descriptions are cut at 800 characters by default.",
        )?;
        Ok(())
    }
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    #[serde(default)]
    pub listing: ListingConfig,
}

impl ListingConfig {
    /// Load and validate a YAML configuration file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;
        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        file.listing.validate()?;
        Ok(file.listing)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            listing: self.clone(),
        };
        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}
