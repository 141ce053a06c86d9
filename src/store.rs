use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use crate::dataset::DatasetType;
use crate::error::DdragonError;
use crate::version::{Locale, Version};

/// Filesystem-backed store for downloaded dataset files.
///
/// Layout is `{root}/{version}/{locale}/{type}.json`. Existence of the
/// `{version}/{locale}` directory is the sole signal that the pair has been
/// downloaded; file contents are never re-validated.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn storage_path(&self, version: &Version, locale: &Locale) -> Utf8PathBuf {
        self.root.join(version.as_str()).join(locale.as_str())
    }

    pub fn dataset_path(&self, version: &Version, locale: &Locale, ty: DatasetType) -> Utf8PathBuf {
        self.storage_path(version, locale)
            .join(format!("{}.json", ty.file_name()))
    }

    pub fn exists(&self, version: &Version, locale: &Locale) -> bool {
        self.storage_path(version, locale).as_std_path().is_dir()
    }

    pub fn locale_exists(&self, version: &Version, locale: &Locale) -> bool {
        self.exists(version, locale)
    }

    /// Compact JSON, written to a temp file and renamed into place so a
    /// crashed write never leaves a truncated dataset behind.
    pub async fn write_json(&self, path: &Utf8Path, value: &Value) -> Result<(), DdragonError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent.as_std_path())
                .await
                .map_err(|err| DdragonError::Filesystem(err.to_string()))?;
        }
        let content =
            serde_json::to_vec(value).map_err(|err| DdragonError::Filesystem(err.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(tmp_path.as_std_path(), &content)
            .await
            .map_err(|err| DdragonError::Filesystem(err.to_string()))?;
        tokio::fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .await
            .map_err(|err| DdragonError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub async fn read_json(
        &self,
        version: &Version,
        locale: &Locale,
        ty: DatasetType,
    ) -> Result<Value, DdragonError> {
        let path = self.dataset_path(version, locale, ty);
        let content = match tokio::fs::read_to_string(path.as_std_path()).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(DdragonError::NotFoundLocally(path.to_string()));
            }
            Err(err) => return Err(DdragonError::Filesystem(err.to_string())),
        };
        serde_json::from_str(&content).map_err(|err| DdragonError::Parse {
            context: path.to_string(),
            message: err.to_string(),
        })
    }

    /// Immediate children of the root that parse as versions; stray files
    /// are skipped.
    pub fn versions_on_disk(&self) -> Result<Vec<Version>, DdragonError> {
        let entries = match fs::read_dir(self.root.as_std_path()) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(DdragonError::Filesystem(err.to_string())),
        };
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| DdragonError::Filesystem(err.to_string()))?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(version) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<Version>().ok())
            {
                versions.push(version);
            }
        }
        Ok(versions)
    }

    /// Newest on-disk version that has the locale downloaded.
    pub fn latest_version_with_locale(
        &self,
        locale: &Locale,
    ) -> Result<Option<Version>, DdragonError> {
        let mut versions = self.versions_on_disk()?;
        Version::sort_descending(&mut versions);
        Ok(versions
            .into_iter()
            .find(|version| self.locale_exists(version, locale)))
    }
}
