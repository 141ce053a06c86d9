use serde_json::Value;

use crate::coordinator::Coordinator;
use crate::dataset::DatasetType;
use crate::error::DdragonError;
use crate::version::{Locale, Version};

/// The public read path: ensures the requested data is on disk, parses it
/// and returns it, self-healing through the version fallback chain.
///
/// Resolution is an iterative loop, never recursion: a requested version
/// that misses is retried once against the latest remote version, which on
/// a further miss falls back to the newest on-disk version carrying the
/// locale. The chain only moves forward; a version is never tried twice in
/// one resolution.
#[derive(Clone)]
pub struct Reader {
    coordinator: Coordinator,
}

impl Reader {
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub async fn read(
        &self,
        version: Option<Version>,
        ty: DatasetType,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        let requested = if ty == DatasetType::RunesReforged {
            version.map(Version::remap_legacy_runes)
        } else {
            version
        };
        let mut used_latest = requested.is_none();
        let mut fallback_used = false;
        let mut tried: Vec<Version> = Vec::new();
        let mut current = match requested {
            Some(version) => version,
            None => self.coordinator.latest_version().await?,
        };

        loop {
            tried.push(current.clone());
            if let Err(err) = self.coordinator.ensure_downloaded(locale, &current).await {
                // An unreachable CDN must not stop us from serving data that
                // is already on disk; the read below decides.
                self.coordinator
                    .sink()
                    .log_error(&format!("download failed for {locale} {current}: {err}"));
            }

            match self
                .coordinator
                .store()
                .read_json(&current, locale, ty)
                .await
            {
                Ok(value) => return extract(ty, value, &current),
                Err(DdragonError::NotFoundLocally(_)) => {
                    if fallback_used {
                        return Err(DdragonError::FallbackExhausted(locale.to_string()));
                    }
                    if !used_latest {
                        used_latest = true;
                        let latest = self.coordinator.latest_version().await?;
                        if !tried.contains(&latest) {
                            current = latest;
                            continue;
                        }
                        // Latest was the version that just missed; go
                        // straight to the on-disk fallback.
                    }
                    fallback_used = true;
                    match self.coordinator.store().latest_version_with_locale(locale)? {
                        Some(version) if !tried.contains(&version) => {
                            self.coordinator.sink().log_debug(&format!(
                                "falling back to downloaded version {version} for {locale}"
                            ));
                            current = version;
                        }
                        _ => return Err(DdragonError::FallbackExhausted(locale.to_string())),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn champions(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::Champion, locale).await
    }

    /// The `championFull` file; use [`Reader::champions`] for the summary.
    pub async fn champions_full(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::ChampionFull, locale).await
    }

    pub async fn items(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::Item, locale).await
    }

    pub async fn summoner_spells(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::Summoner, locale).await
    }

    pub async fn profile_icons(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::ProfileIcon, locale).await
    }

    /// Returns the rune tree array. Version 7.23 is remapped to 8.1.1, the
    /// earliest patch with usable reforged rune files.
    pub async fn runes_reforged(
        &self,
        version: Option<Version>,
        locale: &Locale,
    ) -> Result<Value, DdragonError> {
        self.read(version, DatasetType::RunesReforged, locale).await
    }

    /// Newest version present on disk, optionally restricted to versions
    /// that carry `locale`.
    pub async fn latest_downloaded_version(
        &self,
        locale: Option<&Locale>,
    ) -> Result<Version, DdragonError> {
        let mut versions = self.coordinator.store().versions_on_disk()?;
        if versions.is_empty() {
            return Err(DdragonError::NoLocalVersions);
        }
        Version::sort_descending(&mut versions);
        let found = match locale {
            None => versions.into_iter().next(),
            Some(locale) => versions
                .into_iter()
                .find(|version| self.coordinator.store().locale_exists(version, locale)),
        };
        match found {
            Some(version) => {
                self.coordinator
                    .sink()
                    .log_debug(&format!("latest version in downloads: {version}"));
                Ok(version)
            }
            None => Err(DdragonError::FallbackExhausted(
                locale.map(Locale::to_string).unwrap_or_default(),
            )),
        }
    }
}

fn extract(ty: DatasetType, mut value: Value, version: &Version) -> Result<Value, DdragonError> {
    if ty == DatasetType::RunesReforged {
        return Ok(value);
    }
    value
        .as_object_mut()
        .and_then(|obj| obj.remove("data"))
        .ok_or_else(|| DdragonError::Parse {
            context: format!("{} {version}", ty.file_name()),
            message: "missing data collection".to_string(),
        })
}
