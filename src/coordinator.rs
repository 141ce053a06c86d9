use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use crate::cdn::CdnClient;
use crate::config::Config;
use crate::dataset::DatasetType;
use crate::error::DdragonError;
use crate::events::EventSink;
use crate::metadata::MetadataCache;
use crate::normalize;
use crate::store::Store;
use crate::version::{Locale, Version};

type SharedDownload = Shared<BoxFuture<'static, Result<(), DdragonError>>>;
type SharedUpdate = Shared<BoxFuture<'static, Result<Vec<Version>, DdragonError>>>;

/// Identifies one in-flight download unit.
///
/// `LocaleKey::All` is the reserved batch key: its completion implies
/// completion for every individual locale at that version, and requests for
/// individual locales coalesce onto it while it is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocaleKey {
    All,
    One(Locale),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadKey {
    pub locale: LocaleKey,
    pub version: Version,
}

impl DownloadKey {
    pub fn one(locale: Locale, version: Version) -> Self {
        Self {
            locale: LocaleKey::One(locale),
            version,
        }
    }

    pub fn all(version: Version) -> Self {
        Self {
            locale: LocaleKey::All,
            version,
        }
    }
}

/// Deduplicates concurrent download requests and drives the per-type
/// fetch + normalize + persist pipeline for each (locale, version) pair.
///
/// Cheap to clone; all clones share one in-flight registry.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    store: Store,
    cdn: Arc<dyn CdnClient>,
    metadata: MetadataCache,
    sink: Arc<dyn EventSink>,
    in_flight: Mutex<HashMap<DownloadKey, SharedDownload>>,
    update_in_flight: Mutex<Option<SharedUpdate>>,
}

impl Coordinator {
    pub fn new(config: Config, cdn: Arc<dyn CdnClient>, sink: Arc<dyn EventSink>) -> Self {
        let store = Store::new(config.storage_root.clone());
        let metadata = MetadataCache::new(config.metadata_ttl);
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                cdn,
                metadata,
                sink,
                in_flight: Mutex::new(HashMap::new()),
                update_in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub(crate) fn sink(&self) -> &dyn EventSink {
        self.inner.sink.as_ref()
    }

    /// Makes sure the (locale, version) pair is on disk, downloading it if
    /// necessary. Concurrent callers for the same pair share one download;
    /// an already-downloaded pair returns without touching the network.
    pub async fn ensure_downloaded(
        &self,
        locale: &Locale,
        version: &Version,
    ) -> Result<(), DdragonError> {
        let download = {
            let mut in_flight = self.inner.lock_in_flight();
            let all_key = DownloadKey::all(version.clone());
            if let Some(existing) = in_flight.get(&all_key) {
                existing.clone()
            } else {
                let key = DownloadKey::one(locale.clone(), version.clone());
                if let Some(existing) = in_flight.get(&key) {
                    existing.clone()
                } else if self.inner.store.exists(version, locale) {
                    return Ok(());
                } else {
                    // Check-then-register happens under one lock acquisition
                    // so two first-time callers can never both start.
                    let download =
                        self.inner
                            .register_pair_download(key.clone(), locale.clone(), version.clone());
                    in_flight.insert(key, download.clone());
                    download
                }
            }
        };
        download.await
    }

    /// Downloads one version for a set of locales, strictly sequentially.
    pub async fn download_by_version(
        &self,
        version: &Version,
        locales: &[Locale],
    ) -> Result<(), DdragonError> {
        for locale in locales {
            self.ensure_downloaded(locale, version).await?;
        }
        Ok(())
    }

    /// Downloads every version from `versions` that is at or above the
    /// configured major-version floor and not yet on disk for `locale`.
    /// Pairs are processed one at a time to avoid hammering the CDN.
    /// Returns the versions that actually needed fetching.
    pub async fn download_by_locale(
        &self,
        locale: &Locale,
        versions: &[Version],
    ) -> Result<Vec<Version>, DdragonError> {
        let missing: Vec<Version> = versions
            .iter()
            .filter(|version| version.major() >= self.inner.config.minimum_major_version)
            .filter(|version| !self.inner.store.exists(version, locale))
            .cloned()
            .collect();
        for version in &missing {
            self.ensure_downloaded(locale, version).await?;
        }
        Ok(missing)
    }

    /// Downloads one version for every known locale under the reserved
    /// batch key, so individual requests for any locale at this version
    /// coalesce onto the batch while it runs.
    pub async fn download_all_locales(&self, version: &Version) -> Result<(), DdragonError> {
        let download = {
            let mut in_flight = self.inner.lock_in_flight();
            let key = DownloadKey::all(version.clone());
            if let Some(existing) = in_flight.get(&key) {
                existing.clone()
            } else {
                let download = self.inner.register_all_download(key.clone(), version.clone());
                in_flight.insert(key, download.clone());
                download
            }
        };
        download.await
    }

    /// Fetches the remote versions list and downloads everything missing
    /// for `locale`. The whole operation is deduplicated through a single
    /// slot: callers arriving while an update runs await the same result.
    pub async fn update(&self, locale: &Locale) -> Result<Vec<Version>, DdragonError> {
        let update = {
            let mut slot = self.inner.lock_update();
            if let Some(existing) = slot.as_ref() {
                existing.clone()
            } else {
                let this = self.clone();
                let locale = locale.clone();
                let update = async move {
                    let result = this.update_inner(&locale).await;
                    *this.inner.lock_update() = None;
                    if let Err(err) = &result {
                        this.inner.sink.error(err);
                    }
                    result
                }
                .boxed()
                .shared();
                *slot = Some(update.clone());
                update
            }
        };
        update.await
    }

    async fn update_inner(&self, locale: &Locale) -> Result<Vec<Version>, DdragonError> {
        let versions = self.versions().await?;
        self.download_by_locale(locale, &versions).await
    }

    /// Remote versions list, through the TTL metadata cache. Entries that
    /// do not parse as versions are skipped.
    pub async fn versions(&self) -> Result<Vec<Version>, DdragonError> {
        let url = self.inner.config.versions_url();
        let value = self.inner.get_metadata(&url, "versions").await?;
        let Some(entries) = value.as_array() else {
            return Err(DdragonError::Parse {
                context: url,
                message: "expected an array of version strings".to_string(),
            });
        };
        let mut versions = Vec::new();
        for entry in entries {
            match entry.as_str().map(str::parse::<Version>) {
                Some(Ok(version)) => versions.push(version),
                _ => self
                    .inner
                    .sink
                    .log_debug(&format!("skipping unparsable version entry: {entry}")),
            }
        }
        Ok(versions)
    }

    pub async fn latest_version(&self) -> Result<Version, DdragonError> {
        let url = self.inner.config.versions_url();
        self.versions()
            .await?
            .into_iter()
            .max()
            .ok_or(DdragonError::Parse {
                context: url,
                message: "empty version list".to_string(),
            })
    }

    pub async fn realms(&self) -> Result<Value, DdragonError> {
        let url = self.inner.config.realms_url();
        self.inner.get_metadata(&url, "realms").await
    }

    pub async fn realm_info(&self, realm: &str) -> Result<Value, DdragonError> {
        let url = self.inner.config.realm_url(realm);
        self.inner.get_metadata(&url, &format!("realm/{realm}")).await
    }

    pub async fn languages(&self) -> Result<Value, DdragonError> {
        let url = self.inner.config.languages_url();
        self.inner.get_metadata(&url, "languages").await
    }
}

impl Inner {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<DownloadKey, SharedDownload>> {
        self.in_flight.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn lock_update(&self) -> MutexGuard<'_, Option<SharedUpdate>> {
        self.update_in_flight
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }

    async fn get_metadata(&self, url: &str, key: &str) -> Result<Value, DdragonError> {
        self.metadata.get_or_fetch(self.cdn.as_ref(), url, key).await
    }

    fn register_pair_download(
        self: &Arc<Self>,
        key: DownloadKey,
        locale: Locale,
        version: Version,
    ) -> SharedDownload {
        let inner = Arc::clone(self);
        async move {
            let result = inner.download_pair(&locale, &version).await;
            // Registry cleanup runs on every exit path so a later request
            // re-attempts instead of replaying a stale failure.
            inner.lock_in_flight().remove(&key);
            match &result {
                Ok(()) => inner.sink.downloaded(
                    &locale,
                    &version,
                    &inner.store.storage_path(&version, &locale),
                ),
                Err(err) => inner.sink.error(err),
            }
            result
        }
        .boxed()
        .shared()
    }

    fn register_all_download(self: &Arc<Self>, key: DownloadKey, version: Version) -> SharedDownload {
        let inner = Arc::clone(self);
        async move {
            let result = inner.download_all(&version).await;
            inner.lock_in_flight().remove(&key);
            if let Err(err) = &result {
                inner.sink.error(err);
            }
            result
        }
        .boxed()
        .shared()
    }

    async fn download_all(&self, version: &Version) -> Result<(), DdragonError> {
        for locale in Locale::all() {
            if self.store.exists(version, &locale) {
                continue;
            }
            self.download_pair(&locale, version).await?;
            self.sink
                .downloaded(&locale, version, &self.store.storage_path(version, &locale));
        }
        Ok(())
    }

    /// Fetch + normalize + persist every dataset type applicable to the
    /// version. A file that fails to parse is skipped and the rest of the
    /// batch continues; a transport error aborts the whole pair.
    async fn download_pair(&self, locale: &Locale, version: &Version) -> Result<(), DdragonError> {
        let mut perks: Option<Value> = None;
        for ty in DatasetType::for_major(version.major()) {
            let url = self.config.dataset_url(version, locale, ty);
            self.sink.log_debug(&format!("downloading {url}"));
            let bytes = self.cdn.get(&url).await?;
            let mut json: Value = match serde_json::from_slice(&bytes) {
                Ok(json) => json,
                Err(err) => {
                    self.sink.log_error(&format!(
                        "skipping malformed {} file for {locale} {version}: {err}",
                        ty.file_name()
                    ));
                    continue;
                }
            };

            if ty == DatasetType::RunesReforged {
                if normalize::needs_rune_enrichment(version) {
                    if perks.is_none() {
                        let bytes = self.cdn.get(&self.config.perks_url).await?;
                        let parsed =
                            serde_json::from_slice(&bytes).map_err(|err| DdragonError::Parse {
                                context: self.config.perks_url.clone(),
                                message: err.to_string(),
                            })?;
                        perks = Some(parsed);
                    }
                    if let Some(perks) = perks.as_ref() {
                        normalize::enrich_runes(&mut json, perks, version, self.sink.as_ref());
                    }
                }
            } else {
                normalize::fix_key_and_id(&mut json);
            }

            let path = self.store.dataset_path(version, locale, ty);
            self.store.write_json(&path, &json).await?;
        }
        Ok(())
    }
}
