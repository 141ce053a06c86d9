use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::Deserialize;

use crate::dataset::DatasetType;
use crate::error::DdragonError;
use crate::version::{Locale, Version};

const DEFAULT_CDN_BASE: &str = "https://ddragon.leagueoflegends.com";

/// CommunityDragon perk dump used to enrich legacy rune descriptions.
const DEFAULT_PERKS_URL: &str = "https://raw.communitydragon.org/latest/plugins/rcp-be-lol-game-data/global/default/v1/perks.json";

const DEFAULT_MINIMUM_MAJOR_VERSION: u64 = 8;
const DEFAULT_METADATA_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Configuration owned by the coordinator, fixed at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_root: Utf8PathBuf,
    pub cdn_base: String,
    pub perks_url: String,
    /// Locale-wide batch downloads skip versions below this major version.
    pub minimum_major_version: u64,
    pub metadata_ttl: Duration,
}

impl Config {
    pub fn new() -> Result<Self, DdragonError> {
        Ok(Self::with_storage_root(default_storage_root()?))
    }

    pub fn with_storage_root(storage_root: Utf8PathBuf) -> Self {
        Self {
            storage_root,
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            perks_url: DEFAULT_PERKS_URL.to_string(),
            minimum_major_version: DEFAULT_MINIMUM_MAJOR_VERSION,
            metadata_ttl: DEFAULT_METADATA_TTL,
        }
    }

    /// Reads overrides from a JSON file; absent fields keep their defaults.
    pub fn load(path: &str) -> Result<Self, DdragonError> {
        let content =
            fs::read_to_string(path).map_err(|_| DdragonError::ConfigRead(path.to_string()))?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|err| DdragonError::ConfigParse(err.to_string()))?;

        let storage_root = match file.storage_root {
            Some(root) => Utf8PathBuf::from(root),
            None => default_storage_root()?,
        };
        let mut config = Self::with_storage_root(storage_root);
        if let Some(base) = file.cdn_base {
            config.cdn_base = base;
        }
        if let Some(url) = file.perks_url {
            config.perks_url = url;
        }
        if let Some(major) = file.minimum_major_version {
            config.minimum_major_version = major;
        }
        if let Some(secs) = file.metadata_ttl_secs {
            config.metadata_ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn versions_url(&self) -> String {
        format!("{}/api/versions.json", self.cdn_base)
    }

    pub fn realms_url(&self) -> String {
        format!("{}/api/realms.json", self.cdn_base)
    }

    pub fn realm_url(&self, realm: &str) -> String {
        format!("{}/realms/{realm}.json", self.cdn_base)
    }

    pub fn languages_url(&self) -> String {
        format!("{}/cdn/languages.json", self.cdn_base)
    }

    pub fn dataset_url(&self, version: &Version, locale: &Locale, ty: DatasetType) -> String {
        format!(
            "{}/cdn/{}/data/{}/{}.json",
            self.cdn_base,
            version,
            locale,
            ty.file_name()
        )
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    storage_root: Option<String>,
    #[serde(default)]
    cdn_base: Option<String>,
    #[serde(default)]
    perks_url: Option<String>,
    #[serde(default)]
    minimum_major_version: Option<u64>,
    #[serde(default)]
    metadata_ttl_secs: Option<u64>,
}

fn default_storage_root() -> Result<Utf8PathBuf, DdragonError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("ddragon-cache")).ok()
        })
        .ok_or_else(|| DdragonError::Filesystem("unable to resolve cache directory".to_string()))
}
