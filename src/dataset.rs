use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DdragonError;

/// One category of static reference data, mapping to a single remote file
/// and a single local file of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum DatasetType {
    ProfileIcon,
    Champion,
    ChampionFull,
    Item,
    Summoner,
    RunesReforged,
}

impl DatasetType {
    pub const ALL: [DatasetType; 6] = [
        DatasetType::ProfileIcon,
        DatasetType::Champion,
        DatasetType::ChampionFull,
        DatasetType::Item,
        DatasetType::Summoner,
        DatasetType::RunesReforged,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            DatasetType::ProfileIcon => "profileicon",
            DatasetType::Champion => "champion",
            DatasetType::ChampionFull => "championFull",
            DatasetType::Item => "item",
            DatasetType::Summoner => "summoner",
            DatasetType::RunesReforged => "runesReforged",
        }
    }

    /// Runes and masteries were replaced by reforged runes with patch 7.24;
    /// the CDN only serves runesReforged files from major version 8 on.
    pub fn for_major(major: u64) -> impl Iterator<Item = DatasetType> {
        Self::ALL
            .into_iter()
            .filter(move |ty| *ty != DatasetType::RunesReforged || major >= 8)
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

impl FromStr for DatasetType {
    type Err = DdragonError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.file_name() == value)
            .ok_or_else(|| DdragonError::InvalidDataset(value.to_string()))
    }
}
