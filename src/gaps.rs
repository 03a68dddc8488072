//! Which (entity, season) pairs a category is still missing.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::YearRange;
use crate::seed::Entity;

/// Keys an entity identifier may appear under in a category output.
const ID_KEYS: [&str; 3] = ["TeamID", "TeamID ", "NationalTeamID"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapReport {
    #[serde(rename = "EntityID", alias = "TeamID")]
    pub entity_id: String,
    #[serde(rename = "LeftYears")]
    pub left_years: Vec<i32>,
}

/// Reads `(id, year)` from every record of a category output. Records without
/// an id or a year are ignored.
pub fn collected_pairs(records: &[Value]) -> HashSet<(String, i32)> {
    let mut pairs = HashSet::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match record_key(record) {
            Some(key) => {
                pairs.insert(key);
            }
            None => debug!(index, "record has no (id, year) key"),
        }
    }
    pairs
}

fn record_key(record: &Value) -> Option<(String, i32)> {
    let id = ID_KEYS.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })?;
    let year = match record.get("Year")? {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Some((id, year))
}

/// For every entity, the sorted seasons in `years` that `collected` lacks.
/// Entities with nothing missing get no report.
pub fn detect_gaps(collected: &HashSet<(String, i32)>, entities: &[Entity], years: YearRange) -> Vec<GapReport> {
    let mut by_entity: HashMap<&str, BTreeSet<i32>> = HashMap::new();
    for (id, year) in collected {
        by_entity.entry(id.as_str()).or_default().insert(*year);
    }

    entities
        .iter()
        .filter_map(|entity| {
            let recorded = by_entity.get(entity.id.trim());
            let left_years: Vec<i32> = years
                .iter()
                .filter(|year| recorded.map_or(true, |r| !r.contains(year)))
                .collect();
            (!left_years.is_empty()).then(|| GapReport {
                entity_id: entity.id.clone(),
                left_years,
            })
        })
        .collect()
}
