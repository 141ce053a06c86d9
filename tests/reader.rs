use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use camino::Utf8PathBuf;

use ddragon_cache::{
    CdnClient, Config, Coordinator, DatasetType, DdragonError, Locale, Reader, TracingSink,
    Version,
};

#[derive(Default)]
struct MockCdn {
    responses: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<String>>,
}

impl MockCdn {
    fn insert(&self, url: String, body: &[u8]) {
        self.responses.lock().unwrap().insert(url, body.to_vec());
    }
}

#[async_trait]
impl CdnClient for MockCdn {
    async fn get(&self, url: &str) -> Result<Vec<u8>, DdragonError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| DdragonError::CdnStatus {
                status: 403,
                message: format!("no file at {url}"),
            })
    }
}

fn dataset_body(ty: DatasetType) -> &'static [u8] {
    match ty {
        DatasetType::RunesReforged => {
            br#"[{"id":8100,"slots":[{"runes":[{"id":8112,"shortDesc":"@placeholder@","longDesc":"@placeholder@"}]}]}]"#
        }
        _ => br#"{"type":"x","data":{"Aatrox":{"id":"Aatrox","key":"266","name":"Aatrox"}}}"#,
    }
}

fn seed_version(cdn: &MockCdn, config: &Config, version: &Version, locale: &Locale) {
    for ty in DatasetType::for_major(version.major()) {
        cdn.insert(config.dataset_url(version, locale, ty), dataset_body(ty));
    }
}

fn reader_with(temp: &tempfile::TempDir, cdn: Arc<MockCdn>) -> (Reader, Config) {
    let config =
        Config::with_storage_root(Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap());
    let coordinator = Coordinator::new(config.clone(), cdn, Arc::new(TracingSink));
    (Reader::new(coordinator), config)
}

#[tokio::test]
async fn read_latest_returns_nested_data_collection() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let version: Version = "10.2.1".parse().unwrap();
    let locale: Locale = "en_US".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["10.2.1", "9.1.1"]"#);
    seed_version(&cdn, &config, &version, &locale);

    let champions = reader.champions(None, &locale).await.unwrap();
    // The data map itself comes back, with normalized ids.
    assert_eq!(champions["Aatrox"]["id"], serde_json::json!(266));
}

#[tokio::test]
async fn missing_requested_version_retries_with_latest() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let latest: Version = "10.2.1".parse().unwrap();
    let requested: Version = "9.1.1".parse().unwrap();
    let locale: Locale = "en_US".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["10.2.1", "9.1.1"]"#);
    // Only the latest version is still served with full data.
    seed_version(&cdn, &config, &latest, &locale);

    let items = reader.items(Some(requested), &locale).await.unwrap();
    assert!(items.get("Aatrox").is_some());
    assert!(
        reader
            .coordinator()
            .store()
            .dataset_path(&latest, &locale, DatasetType::Item)
            .as_std_path()
            .exists()
    );
}

#[tokio::test]
async fn fallback_exhausted_without_any_local_data() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let locale: Locale = "en_US".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["10.2.1"]"#);
    // No dataset files are served at all.

    let requested: Version = "99.99.99".parse().unwrap();
    let err = reader.items(Some(requested), &locale).await.unwrap_err();
    assert_matches!(err, DdragonError::FallbackExhausted(_));
}

#[tokio::test]
async fn fallback_serves_older_cached_version() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let locale: Locale = "en_US".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["10.2.1"]"#);

    // An older version is already cached on disk; the CDN serves nothing.
    let dir = temp.path().join("9.1.1/en_US");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("item.json"),
        br#"{"data":{"1001":{"id":1001,"name":"Boots"}}}"#,
    )
    .unwrap();

    let requested: Version = "11.1.1".parse().unwrap();
    let items = reader.items(Some(requested), &locale).await.unwrap();
    assert_eq!(items["1001"]["name"], serde_json::json!("Boots"));
}

#[tokio::test]
async fn fallback_requires_matching_locale() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let locale: Locale = "ja_JP".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["10.2.1"]"#);

    // Cached data exists, but only for another locale.
    let dir = temp.path().join("9.1.1/en_US");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("item.json"), br#"{"data":{}}"#).unwrap();

    let err = reader.items(None, &locale).await.unwrap_err();
    assert_matches!(err, DdragonError::FallbackExhausted(_));
}

#[tokio::test]
async fn legacy_runes_version_is_remapped_and_enriched() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, config) = reader_with(&temp, cdn.clone());

    let remapped: Version = "8.1.1".parse().unwrap();
    let locale: Locale = "en_US".parse().unwrap();
    cdn.insert(config.versions_url(), br#"["8.1.1"]"#);
    seed_version(&cdn, &config, &remapped, &locale);
    cdn.insert(
        config.perks_url.clone(),
        br#"[{"id":8112,"shortDesc":"Deal damage","longDesc":"Deal more damage"}]"#,
    );

    let requested: Version = "7.23".parse().unwrap();
    let runes = reader.runes_reforged(Some(requested), &locale).await.unwrap();

    // 7.23 resolves to the 8.1.1 files, stored as a bare array with
    // descriptions taken from the enrichment source.
    assert!(runes.is_array());
    assert_eq!(
        runes[0]["slots"][0]["runes"][0]["shortDesc"],
        serde_json::json!("Deal damage")
    );
    assert!(
        reader
            .coordinator()
            .store()
            .exists(&remapped, &locale)
    );
}

#[tokio::test]
async fn latest_downloaded_version_honors_locale() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, _config) = reader_with(&temp, cdn);

    std::fs::create_dir_all(temp.path().join("9.1.1/en_US")).unwrap();
    std::fs::create_dir_all(temp.path().join("10.2.1/de_DE")).unwrap();

    let any = reader.latest_downloaded_version(None).await.unwrap();
    assert_eq!(any.as_str(), "10.2.1");

    let en_us: Locale = "en_US".parse().unwrap();
    let for_locale = reader.latest_downloaded_version(Some(&en_us)).await.unwrap();
    assert_eq!(for_locale.as_str(), "9.1.1");

    let ja_jp: Locale = "ja_JP".parse().unwrap();
    assert_matches!(
        reader.latest_downloaded_version(Some(&ja_jp)).await,
        Err(DdragonError::FallbackExhausted(_))
    );
}

#[tokio::test]
async fn empty_store_has_no_latest_downloaded_version() {
    let temp = tempfile::tempdir().unwrap();
    let cdn = Arc::new(MockCdn::default());
    let (reader, _config) = reader_with(&temp, cdn);

    assert_matches!(
        reader.latest_downloaded_version(None).await,
        Err(DdragonError::NoLocalVersions)
    );
}
