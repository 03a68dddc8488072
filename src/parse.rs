//! Structural extraction rules, one set per category.
//!
//! Every query may come back empty. Absent nodes turn into `None`, `0` or an
//! empty list on the record; they are never errors. The only anchor a record
//! needs is the team identifier, and that comes from the request target.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::category::Category;
use crate::config::YearRange;
use crate::record::{
    AveragePointsRecord, ClubImageRecord, NationalSquadRecord, Record, SquadRecord,
    TitlesRecord, TransferBalanceRecord,
};
use crate::request::RequestTarget;
use crate::seed::{Entity, SeedKind};
use crate::{Error, Result, NON_PLAYER_MARKER};

/// Compiled selectors for every category. Built once per run and shared by
/// the workers.
pub struct Extractor {
    roster_rows: Selector,
    club_player_link: Selector,
    national_player_link: Selector,
    country_flags: Selector,
    footer_rows: Selector,
    footer_age: Selector,
    content_paragraph: Selector,
    average_points: Regex,
    transfer_total: Selector,
    transfer_unit: Selector,
    cup_boxes: Selector,
    cup_header: Selector,
    any_row: Selector,
    centered_cell: Selector,
    profile_image: Selector,
    listing_link: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            roster_rows: create_selector(r#"tr[class="odd"], tr[class="even"]"#)?,
            club_player_link: create_selector(
                r#"td[class="posrela"] > table[class="inline-table"] a[href]"#,
            )?,
            national_player_link: create_selector(r#"td > table[class="inline-table"] a[href]"#)?,
            country_flags: create_selector(r#"td[class="zentriert"] > img[title]"#)?,
            footer_rows: create_selector("tfoot > tr")?,
            footer_age: create_selector(r#"tfoot > tr > td[class="zentriert"]"#)?,
            content_paragraph: create_selector(r#"p[class="content"]"#)?,
            average_points: Regex::new(r"\d+,\d+")
                .map_err(|_| Error::ParseMissingSelector(r"\d+,\d+".into()))?,
            transfer_total: create_selector(
                r#"div[class="box transfer-record"] > table > tfoot > tr > td[class*="rechts transfer-record__total"]"#,
            )?,
            transfer_unit: create_selector(r#"span[class="abloeseZusatz"]"#)?,
            cup_boxes: create_selector(r#"div[class="large-6 columns"] > div[class="box"]"#)?,
            cup_header: create_selector(r#"div[class="header"] > h2"#)?,
            any_row: create_selector("tr")?,
            centered_cell: create_selector(r#"td[class="zentriert"]"#)?,
            profile_image: create_selector(
                r#"header[class="data-header"] > div[class="data-header__profile-container"] > img[src]"#,
            )?,
            listing_link: create_selector(r#"td[class="hauptlink"] > a"#)?,
        })
    }

    /// Runs the category's rules against one response body.
    /// `None` means the page had nothing worth a record.
    pub fn extract(&self, target: &RequestTarget, html: &str, years: YearRange) -> Option<Record> {
        let doc = Html::parse_document(html);
        let team_id = target.entity_id.clone();
        let year = target.year;

        match (target.category, year) {
            (Category::Squad, Some(year)) => Some(Record::Squad(self.squad(
                &doc,
                team_id,
                year,
                target.country.as_deref().unwrap_or_default(),
            ))),
            (Category::NationalSquad, Some(year)) => {
                Some(Record::NationalSquad(self.national_squad(&doc, team_id, year)))
            }
            (Category::AveragePoints, Some(year)) => self
                .average_points(&doc)
                .map(|average_points| {
                    Record::AveragePoints(AveragePointsRecord {
                        team_id,
                        year,
                        average_points,
                    })
                }),
            (Category::TransferBalance, Some(year)) => {
                Some(Record::TransferBalance(self.transfer_balance(&doc, team_id, year)))
            }
            (Category::Titles, _) => Some(Record::Titles(self.titles(&doc, team_id, years))),
            (Category::ClubImage, _) => Some(Record::ClubImage(ClubImageRecord {
                team_id,
                image_link: first_attr(&doc.root_element(), &self.profile_image, "src"),
            })),
            (category, None) => {
                warn!(?category, url = %target.url, "yearly category without a year, skipping");
                None
            }
        }
    }

    pub fn squad(&self, doc: &Html, team_id: String, year: i32, home_country: &str) -> SquadRecord {
        let root = doc.root_element();
        let average_age = root.select(&self.footer_age).find_map(own_text);
        let team_cost = root.select(&self.footer_rows).find_map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| cell.value().name() == "td" && cell.value().attr("class") == Some("rechts"))
                .nth(1)
                .and_then(own_text)
        });

        let mut team_size = 0u32;
        let mut legioners = 0u32;
        let mut player_ids = Vec::new();
        for row in root.select(&self.roster_rows) {
            team_size += 1;
            if let Some(id) = first_attr(&row, &self.club_player_link, "href").and_then(|href| player_id(&href)) {
                player_ids.push(id);
            }
            let labels: Vec<String> = row
                .select(&self.country_flags)
                .filter_map(|img| img.value().attr("title"))
                .map(str::to_string)
                .collect();
            if is_legionnaire(&labels, home_country) {
                legioners += 1;
            }
        }
        warn_on_missing_links(&team_id, year, team_size, player_ids.len());

        SquadRecord {
            team_id,
            year,
            team_cost,
            average_age,
            legioners,
            team_size,
            player_ids,
            national_players_count: None,
            team_size_ratio: None,
        }
    }

    pub fn national_squad(&self, doc: &Html, team_id: String, year: i32) -> NationalSquadRecord {
        let mut rows = 0u32;
        let mut player_ids = Vec::new();
        for row in doc.root_element().select(&self.roster_rows) {
            rows += 1;
            if let Some(id) =
                first_attr(&row, &self.national_player_link, "href").and_then(|href| player_id(&href))
            {
                player_ids.push(id);
            }
        }
        warn_on_missing_links(&team_id, year, rows, player_ids.len());
        NationalSquadRecord {
            team_id,
            year,
            player_ids,
        }
    }

    pub fn average_points(&self, doc: &Html) -> Option<String> {
        let text = doc
            .root_element()
            .select(&self.content_paragraph)
            .find_map(first_text_node)?;
        self.average_points
            .find(&text)
            .map(|m| m.as_str().to_string())
    }

    pub fn transfer_balance(&self, doc: &Html, team_id: String, year: i32) -> TransferBalanceRecord {
        let total = doc.root_element().select(&self.transfer_total).next();
        TransferBalanceRecord {
            team_id,
            year,
            value: total.and_then(own_text),
            unit: total.and_then(|cell| cell.select(&self.transfer_unit).find_map(own_text)),
        }
    }

    /// Rows must already be in descending year order: iteration stops at the
    /// first season older than `years.start`, so an out-of-order page is
    /// truncated rather than re-sorted.
    pub fn titles(&self, doc: &Html, team_id: String, years: YearRange) -> TitlesRecord {
        let root = doc.root_element();

        let mut cups = 0u32;
        for header in root
            .select(&self.cup_boxes)
            .filter_map(|b| b.select(&self.cup_header).find_map(first_text_node))
        {
            match parse_cup_count(&header) {
                Some(n) => cups += n,
                None => warn!(%team_id, header = header.trim(), "unreadable cup count, counting 0"),
            }
        }

        let seasons = root.select(&self.any_row).filter_map(|row| {
            row.select(&self.centered_cell)
                .find_map(first_text_node)
                .filter(|s| !s.trim().is_empty())
        });
        let titles_by_year = count_titles(seasons, years);

        TitlesRecord {
            team_id,
            titles_by_year,
            cups,
        }
    }

    /// One page of a club or national team ranking.
    pub fn listing(&self, html: &str, page: u32, kind: SeedKind) -> Vec<Entity> {
        let doc = Html::parse_document(html);
        let mut entities = Vec::new();
        for row in doc.root_element().select(&self.roster_rows) {
            let Some(anchor) = row.select(&self.listing_link).next() else {
                warn!(page, "listing row without a team link, skipping");
                continue;
            };
            let name = first_text_node(anchor).map(|s| s.trim().to_string());
            let link = anchor.value().attr("href").map(str::trim);
            let (Some(name), Some(link)) = (name, link) else {
                warn!(page, "listing row missing name or link, skipping");
                continue;
            };
            let Some(id) = Entity::id_from_link(link) else {
                warn!(page, link, "listing link has no identifier segment, skipping");
                continue;
            };
            let country = match kind {
                SeedKind::Team => first_attr(&row, &self.country_flags, "title").map(|s| s.trim().to_string()),
                SeedKind::NationalTeam => None,
            };
            entities.push(Entity {
                kind,
                id: id.to_string(),
                name,
                country,
                link: link.to_string(),
                page,
            });
        }
        entities
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}

/// First text node directly under `el`, untrimmed.
fn first_text_node(el: ElementRef) -> Option<String> {
    el.children()
        .find_map(|node| node.value().as_text().map(|t| String::from(&**t)))
}

/// First non-blank text node directly under `el`, trimmed.
fn own_text(el: ElementRef) -> Option<String> {
    el.children()
        .filter_map(|node| node.value().as_text())
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

fn first_attr(scope: &ElementRef, selector: &Selector, attr: &str) -> Option<String> {
    scope
        .select(selector)
        .find_map(|el| el.value().attr(attr))
        .map(str::to_string)
}

fn warn_on_missing_links(team_id: &str, year: i32, rows: u32, ids: usize) {
    if rows as usize != ids {
        warn!(team_id, year, rows, ids, "player link not found for every roster row");
    }
}

/// Player id from a roster sub-link; links to clubs carry the non-player marker.
pub fn player_id(href: &str) -> Option<String> {
    if href.contains(NON_PLAYER_MARKER) {
        return None;
    }
    href.trim().rsplit('/').next().map(str::to_string)
}

/// A player is a legionnaire when the row lists several nationalities, or a
/// single one that is not exactly the team's home country.
pub fn is_legionnaire(labels: &[String], home_country: &str) -> bool {
    match labels {
        [] => false,
        [only] => only != home_country,
        _ => true,
    }
}

/// `"14/15"` -> 2014, `"2016"` -> 2016. Only the first part of a season
/// counts, and two-digit years get 2000 added.
pub fn parse_season_year(season: &str) -> Option<i32> {
    let first = season.trim().split('/').next()?.trim();
    let year: i32 = first.parse().ok()?;
    if first.chars().count() == 2 {
        Some(year + 2000)
    } else {
        Some(year)
    }
}

/// `"12x Champion"` -> 12.
pub fn parse_cup_count(header: &str) -> Option<u32> {
    let token = header.trim().split(' ').next()?;
    let mut chars = token.chars();
    chars.next_back()?;
    chars.as_str().parse().ok()
}

/// Counts titles per year for the seasons in `years`, stopping at the first
/// season older than `years.start`.
pub fn count_titles<I, S>(seasons: I, years: YearRange) -> BTreeMap<i32, u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut titles = BTreeMap::new();
    for season in seasons {
        let season = season.as_ref();
        let Some(year) = parse_season_year(season) else {
            debug!(season = season.trim(), "not a season cell");
            continue;
        };
        if year < years.start {
            break;
        }
        if year < years.end {
            *titles.entry(year).or_insert(0) += 1;
        }
    }
    titles
}
