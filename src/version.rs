use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DdragonError;

/// A dotted numeric patch identifier, e.g. `10.2.1`.
///
/// Ordering compares numeric segments, never the raw string, so `10.2.1`
/// sorts above `9.14.1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    segments: Vec<u64>,
}

impl Version {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.segments.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u64 {
        self.segments.get(1).copied().unwrap_or(0)
    }

    /// Patches around 7.23 shipped reforged runes without serving their data
    /// files; the 8.1.1 files are the earliest usable ones.
    pub fn remap_legacy_runes(self) -> Version {
        if self.raw.contains("7.23") {
            Version {
                raw: "8.1.1".to_string(),
                segments: vec![8, 1, 1],
            }
        } else {
            self
        }
    }

    /// Sorts newest-first.
    pub fn sort_descending(versions: &mut [Version]) {
        versions.sort_by(|a, b| b.cmp(a));
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments.cmp(&other.segments)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = DdragonError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DdragonError::InvalidVersion(value.to_string()));
        }
        let segments = trimmed
            .split('.')
            .map(|segment| segment.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| DdragonError::InvalidVersion(value.to_string()))?;
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }
}

impl TryFrom<String> for Version {
    type Error = DdragonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.raw
    }
}

/// The full language set served by the Data Dragon CDN (`cdn/languages.json`).
pub const LANGUAGES: &[&str] = &[
    "cs_CZ", "de_DE", "el_GR", "en_AU", "en_GB", "en_PH", "en_SG", "en_US", "es_AR", "es_ES",
    "es_MX", "fr_FR", "hu_HU", "id_ID", "it_IT", "ja_JP", "ko_KR", "ms_MY", "pl_PL", "pt_BR",
    "ro_RO", "ru_RU", "th_TH", "tr_TR", "vi_VN", "zh_CN", "zh_MY", "zh_TW",
];

/// Each realm serves exactly one locale.
const REALM_LOCALES: &[(&str, &str)] = &[
    ("br", "pt_BR"),
    ("eune", "en_GB"),
    ("euw", "en_GB"),
    ("jp", "ja_JP"),
    ("kr", "ko_KR"),
    ("lan", "es_MX"),
    ("las", "es_AR"),
    ("na", "en_US"),
    ("oce", "en_AU"),
    ("pbe", "en_US"),
    ("ru", "ru_RU"),
    ("tr", "tr_TR"),
];

/// A language/region code from the fixed Data Dragon set, e.g. `en_US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn for_realm(realm: &str) -> Result<Locale, DdragonError> {
        REALM_LOCALES
            .iter()
            .find(|(name, _)| *name == realm)
            .map(|(_, locale)| Locale(locale.to_string()))
            .ok_or_else(|| DdragonError::InvalidRealm(realm.to_string()))
    }

    pub fn all() -> impl Iterator<Item = Locale> {
        LANGUAGES.iter().map(|name| Locale(name.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Locale {
    type Err = DdragonError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !LANGUAGES.contains(&trimmed) {
            return Err(DdragonError::InvalidLocale(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for Locale {
    type Error = DdragonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(value: Locale) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn sort_versions_numerically_descending() {
        let mut versions: Vec<Version> = ["9.1.1", "10.2.1", "9.14.1"]
            .iter()
            .map(|raw| raw.parse().unwrap())
            .collect();
        Version::sort_descending(&mut versions);
        let sorted: Vec<&str> = versions.iter().map(Version::as_str).collect();
        assert_eq!(sorted, vec!["10.2.1", "9.14.1", "9.1.1"]);
    }

    #[test]
    fn parse_version_valid() {
        let version: Version = "8.5.1".parse().unwrap();
        assert_eq!(version.major(), 8);
        assert_eq!(version.minor(), 5);
    }

    #[test]
    fn parse_version_invalid() {
        assert_matches!(
            "lolpatch_7.20".parse::<Version>(),
            Err(DdragonError::InvalidVersion(_))
        );
        assert_matches!("".parse::<Version>(), Err(DdragonError::InvalidVersion(_)));
    }

    #[test]
    fn legacy_runes_version_remaps() {
        let version: Version = "7.23".parse().unwrap();
        assert_eq!(version.remap_legacy_runes().as_str(), "8.1.1");

        let version: Version = "9.3.1".parse().unwrap();
        assert_eq!(version.remap_legacy_runes().as_str(), "9.3.1");
    }

    #[test]
    fn parse_locale() {
        let locale: Locale = "en_US".parse().unwrap();
        assert_eq!(locale.as_str(), "en_US");
        assert_matches!(
            "en_XX".parse::<Locale>(),
            Err(DdragonError::InvalidLocale(_))
        );
    }

    #[test]
    fn realm_locale_mapping() {
        assert_eq!(Locale::for_realm("kr").unwrap().as_str(), "ko_KR");
        assert_matches!(
            Locale::for_realm("moon"),
            Err(DdragonError::InvalidRealm(_))
        );
    }
}
