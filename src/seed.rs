//! Seed entity lists: the teams and national teams every crawl starts from.

use std::collections::HashSet;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum SeedKind {
    #[value(name = "teams")]
    Team,
    #[value(name = "national")]
    NationalTeam,
}

impl SeedKind {
    /// JSON key holding the identifier in this kind of seed file.
    pub fn id_key(self) -> &'static str {
        match self {
            SeedKind::Team => "TeamID",
            SeedKind::NationalTeam => "NationalTeamID",
        }
    }

    pub fn name_key(self) -> &'static str {
        match self {
            SeedKind::Team => "Team_name",
            SeedKind::NationalTeam => "NationalTeamName",
        }
    }
}

pub const LINK_KEY: &str = "Link_to_team";
pub const COUNTRY_KEY: &str = "Country_Name";
pub const PAGE_KEY: &str = "Page";

/// A club or national team. `id` is an opaque token, never parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub kind: SeedKind,
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub link: String,
    pub page: u32,
}

impl Entity {
    /// The identifier is the last path segment of the team link.
    pub fn id_from_link(link: &str) -> Option<&str> {
        link.trim()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(self.kind.id_key(), &self.id)?;
        map.serialize_entry(self.kind.name_key(), &self.name)?;
        if self.kind == SeedKind::Team {
            map.serialize_entry(COUNTRY_KEY, &self.country)?;
        }
        map.serialize_entry(LINK_KEY, &self.link)?;
        map.serialize_entry(PAGE_KEY, &self.page)?;
        map.end()
    }
}

/// Identifiers already accepted during one load. First occurrence wins.
#[derive(Debug, Default)]
pub struct SeedSet {
    seen: HashSet<String>,
    entities: Vec<Entity>,
}

impl SeedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the identifier was already taken.
    pub fn insert(&mut self, entity: Entity) -> bool {
        if !self.seen.insert(entity.id.clone()) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}

/// Parses a seed file. Entries without an id or link are skipped with a
/// warning; a document that is not a JSON array is fatal.
pub fn load_seeds(text: &str, kind: SeedKind) -> Result<Vec<Entity>> {
    let doc: Value =
        serde_json::from_str(text).map_err(|e| Error::SeedLoad(format!("not valid JSON: {e}")))?;
    let Value::Array(entries) = doc else {
        return Err(Error::SeedLoad("expected a JSON array of entities".into()));
    };

    let mut seeds = SeedSet::new();
    let mut duplicates = 0usize;
    for (index, entry) in entries.iter().enumerate() {
        match entity_from_value(index, entry, kind) {
            Ok(entity) => {
                if !seeds.insert(entity) {
                    duplicates += 1;
                }
            }
            Err(e) => warn!("skipping seed entry: {e}"),
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "dropped duplicate seed identifiers");
    }
    Ok(seeds.into_entities())
}

pub async fn load_seed_file(path: impl AsRef<std::path::Path>, kind: SeedKind) -> Result<Vec<Entity>> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::SeedLoad(format!("{}: {e}", path.display())))?;
    load_seeds(&text, kind)
}

/// Stable sort by listing page; entries without a page sort first.
pub fn sort_by_page(entities: &mut [Entity]) {
    entities.sort_by_key(|e| e.page);
}

fn entity_from_value(index: usize, entry: &Value, kind: SeedKind) -> Result<Entity> {
    let id = opaque_string(entry.get(kind.id_key())).ok_or(Error::MalformedSeedData {
        index,
        field: kind.id_key(),
    })?;
    let link = entry
        .get(LINK_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Error::MalformedSeedData {
            index,
            field: LINK_KEY,
        })?;

    let page = match entry.get(PAGE_KEY).and_then(Value::as_u64) {
        Some(page) => u32::try_from(page).unwrap_or_else(|_| {
            warn!(index, page, "seed page out of range, sorting it first");
            0
        }),
        None => 0,
    };

    Ok(Entity {
        kind,
        id,
        name: opaque_string(entry.get(kind.name_key())).unwrap_or_default(),
        country: opaque_string(entry.get(COUNTRY_KEY)),
        link: link.to_string(),
        page,
    })
}

/// Strings are kept as-is (trimmed), numbers are turned into their decimal form.
fn opaque_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
