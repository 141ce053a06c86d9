use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::cdn::CdnClient;
use crate::error::DdragonError;

struct CacheSlot {
    value: Value,
    expires_at: Instant,
}

/// TTL-based cache-or-fetch for the small CDN metadata lists (versions,
/// realms, languages). Expired entries are treated as absent.
///
/// Concurrent callers racing on a cold key each issue their own GET; the
/// download coordinator is the only place that guarantees deduplication.
pub struct MetadataCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheSlot>>,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch(
        &self,
        cdn: &dyn CdnClient,
        url: &str,
        key: &str,
    ) -> Result<Value, DdragonError> {
        {
            let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
            if let Some(slot) = entries.get(key) {
                if slot.expires_at > Instant::now() {
                    return Ok(slot.value.clone());
                }
            }
        }

        let bytes = cdn.get(url).await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|err| DdragonError::Parse {
            context: url.to_string(),
            message: err.to_string(),
        })?;

        let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
        entries.insert(
            key.to_string(),
            CacheSlot {
                value: value.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        Ok(value)
    }
}
