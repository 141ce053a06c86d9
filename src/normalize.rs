use serde_json::Value;

use crate::events::EventSink;
use crate::version::Version;

/// Normalizes the `id`/`key` fields of a `data`-keyed collection before it
/// is persisted.
///
/// The remote schema reuses the two fields inconsistently across versions:
/// sometimes `key` carries the numeric id, sometimes the numeric id only
/// exists as the collection key, sometimes `id` is a numeric string. After
/// this pass `id` is always an integer (or null when nothing parses).
pub fn fix_key_and_id(json: &mut Value) {
    let Some(data) = json.get_mut("data").and_then(Value::as_object_mut) else {
        return;
    };
    for (data_key, entry) in data.iter_mut() {
        let Some(obj) = entry.as_object_mut() else {
            continue;
        };
        if let Some(numeric_key) = obj.get("key").and_then(non_negative_int) {
            // Numeric key means key and id are switched.
            let previous_id = obj.get("id").cloned().unwrap_or(Value::Null);
            obj.insert("id".to_string(), Value::from(numeric_key));
            obj.insert("key".to_string(), previous_id);
        } else if !obj.contains_key("id") {
            // Some collections carry the id only as the map key.
            let id = data_key
                .parse::<i64>()
                .ok()
                .filter(|id| *id >= 0)
                .map(Value::from)
                .unwrap_or(Value::Null);
            obj.insert("id".to_string(), id);
        } else {
            let coerced = obj
                .get("id")
                .and_then(any_int)
                .map(Value::from)
                .unwrap_or(Value::Null);
            obj.insert("id".to_string(), coerced);
        }
    }
}

/// Data Dragon rune files before 8.9 contain client-side placeholders in the
/// description fields; the CommunityDragon perk dump carries the resolved
/// text.
pub fn needs_rune_enrichment(version: &Version) -> bool {
    version.major() == 8 && version.minor() < 9
}

/// Copies `shortDesc`/`longDesc` from the perk dump onto every rune that has
/// a matching id. A rune missing from the dump keeps its original fields;
/// the miss is logged, never fatal.
pub fn enrich_runes(json: &mut Value, perks: &Value, version: &Version, sink: &dyn EventSink) {
    let Some(paths) = json.as_array_mut() else {
        return;
    };
    for path in paths {
        let Some(slots) = path.get_mut("slots").and_then(Value::as_array_mut) else {
            continue;
        };
        for slot in slots {
            let Some(runes) = slot.get_mut("runes").and_then(Value::as_array_mut) else {
                continue;
            };
            for rune in runes {
                let Some(id) = rune.get("id").and_then(Value::as_i64) else {
                    continue;
                };
                let perk = perks.as_array().and_then(|list| {
                    list.iter()
                        .find(|perk| perk.get("id").and_then(Value::as_i64) == Some(id))
                });
                let Some(obj) = rune.as_object_mut() else {
                    continue;
                };
                match perk {
                    Some(perk) => {
                        obj.insert(
                            "shortDesc".to_string(),
                            perk.get("shortDesc").cloned().unwrap_or(Value::Null),
                        );
                        obj.insert(
                            "longDesc".to_string(),
                            perk.get("longDesc").cloned().unwrap_or(Value::Null),
                        );
                    }
                    None => sink.log_error(&format!(
                        "enrichment source is missing rune {id}; \
                         keeping original descriptions for version {version}"
                    )),
                }
            }
        }
    }
}

fn non_negative_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().filter(|n| *n >= 0),
        Value::String(text) => text.trim().parse::<i64>().ok().filter(|n| *n >= 0),
        _ => None,
    }
}

fn any_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}
