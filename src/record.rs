//! Flat per-category records, serialized with the corpus' JSON keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Squad page for one club in one season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "TeamCost", default)]
    pub team_cost: Option<String>,
    #[serde(rename = "AverageAge", default)]
    pub average_age: Option<String>,
    #[serde(rename = "Legioners", default)]
    pub legioners: u32,
    #[serde(rename = "TeamSize", default)]
    pub team_size: u32,
    #[serde(rename = "PlayerIDS", default)]
    pub player_ids: Vec<String>,
    /// Set by the national-player derivation pass.
    #[serde(
        rename = "NationalPlayersCount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub national_players_count: Option<usize>,
    /// Outer `None`: not derived yet. `Some(None)`: derived, written as `null`.
    #[serde(
        rename = "TeamSizeRatio",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub team_size_ratio: Option<Option<f64>>,
}

/// Squad page for one national team in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSquadRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "PlayerIDS", default)]
    pub player_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragePointsRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    /// Kept as printed on the page, decimal comma included.
    #[serde(rename = "AveragePoints")]
    pub average_points: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferBalanceRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "TransferBalanceValue", default)]
    pub value: Option<String>,
    #[serde(rename = "TransferBalanceMer", default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitlesRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "NumberOfTitlesByYears", default)]
    pub titles_by_year: BTreeMap<i32, u32>,
    #[serde(rename = "NumberOfCups", default)]
    pub cups: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubImageRecord {
    #[serde(rename = "TeamID", alias = "TeamID ")]
    pub team_id: String,
    #[serde(rename = "ImageLink", default)]
    pub image_link: Option<String>,
}

/// One extracted result, whatever its category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Squad(SquadRecord),
    NationalSquad(NationalSquadRecord),
    AveragePoints(AveragePointsRecord),
    TransferBalance(TransferBalanceRecord),
    Titles(TitlesRecord),
    ClubImage(ClubImageRecord),
}

impl Record {
    pub fn team_id(&self) -> &str {
        match self {
            Record::Squad(r) => &r.team_id,
            Record::NationalSquad(r) => &r.team_id,
            Record::AveragePoints(r) => &r.team_id,
            Record::TransferBalance(r) => &r.team_id,
            Record::Titles(r) => &r.team_id,
            Record::ClubImage(r) => &r.team_id,
        }
    }

    pub fn year(&self) -> Option<i32> {
        match self {
            Record::Squad(r) => Some(r.year),
            Record::NationalSquad(r) => Some(r.year),
            Record::AveragePoints(r) => Some(r.year),
            Record::TransferBalance(r) => Some(r.year),
            Record::Titles(_) | Record::ClubImage(_) => None,
        }
    }

    /// Ordering key for emitted documents.
    pub fn sort_key(&self) -> (String, Option<i32>) {
        (self.team_id().trim().to_string(), self.year())
    }
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}
