use reqwest::Client;
use tracing::{debug, warn};

use crate::category::Category;
use crate::config::{CrawlConfig, YearRange};
use crate::gaps::GapReport;
use crate::seed::{Entity, SeedKind};
use crate::{Error, Result, NATIONAL_LISTING_PAGES, TEAM_LISTING_PAGES};

/// One unit of crawl work, carrying everything needed to attribute the
/// response once it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub category: Category,
    pub entity_id: String,
    pub url: String,
    pub year: Option<i32>,
    /// Home country, used for legionnaire classification.
    pub country: Option<String>,
}

/// Targets for one entity: one per season for yearly categories, a single one otherwise.
pub fn enumerate(entity: &Entity, category: Category, years: YearRange, base_url: &str) -> Vec<RequestTarget> {
    if category.is_yearly() {
        enumerate_years(entity, category, years.iter(), base_url)
    } else {
        vec![target(entity, category, None, base_url)]
    }
}

/// Targets for an explicit list of seasons.
pub fn enumerate_years(
    entity: &Entity,
    category: Category,
    years: impl IntoIterator<Item = i32>,
    base_url: &str,
) -> Vec<RequestTarget> {
    years
        .into_iter()
        .map(|year| target(entity, category, Some(year), base_url))
        .collect()
}

/// Targets for the whole seed list.
pub fn enumerate_all(entities: &[Entity], category: Category, years: YearRange, base_url: &str) -> Vec<RequestTarget> {
    entities
        .iter()
        .flat_map(|entity| enumerate(entity, category, years, base_url))
        .collect()
}

/// Targets for the seasons a gap report says are missing. Entities without a
/// report are skipped, and so are reports for categories that are not yearly.
pub fn enumerate_gaps(
    entities: &[Entity],
    category: Category,
    gaps: &[GapReport],
    base_url: &str,
) -> Vec<RequestTarget> {
    if !category.is_yearly() {
        warn!(?category, "gap re-crawl only applies to yearly categories");
        return Vec::new();
    }
    entities
        .iter()
        .filter_map(|entity| {
            gaps.iter()
                .find(|gap| gap.entity_id.trim() == entity.id)
                .map(|gap| enumerate_years(entity, category, gap.left_years.iter().copied(), base_url))
        })
        .flatten()
        .collect()
}

fn target(entity: &Entity, category: Category, year: Option<i32>, base_url: &str) -> RequestTarget {
    RequestTarget {
        category,
        entity_id: entity.id.clone(),
        url: format!("{}{}", base_url.trim_end_matches('/'), category.rewrite(&entity.link, year)),
        year,
        country: entity.country.clone(),
    }
}

pub fn listing_pages(kind: SeedKind) -> u32 {
    match kind {
        SeedKind::Team => TEAM_LISTING_PAGES,
        SeedKind::NationalTeam => NATIONAL_LISTING_PAGES,
    }
}

pub fn listing_url(base_url: &str, kind: SeedKind, page: u32) -> String {
    let ranking = match kind {
        SeedKind::Team => "klubrangliste",
        SeedKind::NationalTeam => "weltrangliste",
    };
    format!("{}/statistik/{ranking}?page={page}", base_url.trim_end_matches('/'))
}

pub fn build_client(config: &CrawlConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// Requests a page and returns the HTML, retrying transport errors and
/// non-2xx responses with exponential backoff.
pub async fn request_page_html(client: &Client, url: &str, config: &CrawlConfig) -> Result<String> {
    let attempts = config.max_retries + 1;
    let mut attempt = 0;
    loop {
        match fetch_once(client, url).await {
            Ok(html) => return Ok(html),
            Err(e) if attempt + 1 < attempts => {
                let wait = config.backoff(attempt);
                debug!(url, attempt, error = %e, wait_ms = wait.as_millis() as u64, "retrying");
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(Error::RetriesExhausted {
                    url: url.to_string(),
                    attempts,
                    last: Box::new(e),
                })
            }
        }
    }
}

async fn fetch_once(client: &Client, url: &str) -> Result<String> {
    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            url: url.to_string(),
            status,
        });
    }
    let html = res.text().await?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bayern() -> Entity {
        Entity {
            kind: SeedKind::Team,
            id: "27".into(),
            name: "Bayern Munich".into(),
            country: Some("Germany".into()),
            link: "/fc-bayern-munchen/startseite/verein/27".into(),
            page: 1,
        }
    }

    #[test]
    fn one_target_per_year() {
        let targets = enumerate(&bayern(), Category::Squad, YearRange::new(2014, 2017), "https://tm.test/");
        assert_eq!(targets.len(), 3);
        assert_eq!(
            targets[0].url,
            "https://tm.test/fc-bayern-munchen/kader/verein/27/plus/0/galerie/0?saison_id=2014"
        );
        assert_eq!(targets[2].year, Some(2016));
        assert!(targets.iter().all(|t| t.entity_id == "27" && t.country.as_deref() == Some("Germany")));
    }

    #[test]
    fn per_entity_category_has_one_target() {
        let targets = enumerate(&bayern(), Category::Titles, YearRange::default(), "https://tm.test");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].year, None);
        assert_eq!(targets[0].url, "https://tm.test/fc-bayern-munchen/erfolge/verein/27");
    }

    #[test]
    fn gap_targets_only_cover_missing_years() {
        let gaps = vec![GapReport {
            entity_id: "27".into(),
            left_years: vec![2015, 2019],
        }];
        let mut other = bayern();
        other.id = "418".into();
        let targets = enumerate_gaps(&[bayern(), other], Category::AveragePoints, &gaps, "https://tm.test");
        let years: Vec<_> = targets.iter().map(|t| t.year).collect();
        assert_eq!(years, vec![Some(2015), Some(2019)]);
        assert!(targets[0].url.ends_with("/plus/0?reldata=%262015"));
    }

    #[test]
    fn listing_urls() {
        assert_eq!(
            listing_url("https://tm.test", SeedKind::Team, 2),
            "https://tm.test/statistik/klubrangliste?page=2"
        );
        assert_eq!(
            listing_url("https://tm.test/", SeedKind::NationalTeam, 9),
            "https://tm.test/statistik/weltrangliste?page=9"
        );
        assert_eq!(listing_pages(SeedKind::Team), 22);
    }
}
