use mockito::{Matcher, Server};
use squad_scrape::category::Category;
use squad_scrape::config::{CrawlConfig, YearRange};
use squad_scrape::gaps::{collected_pairs, detect_gaps, GapReport};
use squad_scrape::process::{collect_seeds, crawl};
use squad_scrape::record::Record;
use squad_scrape::request::{enumerate_all, enumerate_gaps};
use squad_scrape::seed::{load_seeds, Entity, SeedKind};
use squad_scrape::emit;
use tempfile::TempDir;

fn test_config(base_url: &str) -> CrawlConfig {
    CrawlConfig {
        base_url: base_url.to_string(),
        years: YearRange::new(2014, 2016),
        concurrency: 4,
        max_retries: 1,
        backoff_base_ms: 1,
        timeout_secs: 5,
        ..CrawlConfig::default()
    }
}

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

const SQUAD_2014: &str = r#"<html><body><table>
    <tr class="odd">
      <td class="posrela"><table class="inline-table"><tr><td><a href="/manuel-neuer/profil/spieler/17259">Neuer</a></td></tr></table></td>
      <td class="zentriert"><img title="Germany"></td>
    </tr>
    <tr class="even">
      <td class="posrela"><table class="inline-table"><tr><td><a href="/arjen-robben/profil/spieler/4360">Robben</a></td></tr></table></td>
      <td class="zentriert"><img title="Netherlands"></td>
    </tr>
    <tfoot><tr><td class="zentriert">27.1</td><td class="rechts">x</td><td class="rechts">€560.00m</td></tr></tfoot>
</table></body></html>"#;

#[tokio::test(flavor = "multi_thread")]
async fn failing_target_is_dropped_without_stopping_the_crawl() {
    let mut server = Server::new_async().await;
    let ok = server
        .mock("GET", "/fc-bayern-munchen/kader/verein/27/plus/0/galerie/0?saison_id=2014")
        .with_status(200)
        .with_body(SQUAD_2014)
        .create_async()
        .await;
    // One try plus one retry.
    let broken = server
        .mock("GET", "/fc-bayern-munchen/kader/verein/27/plus/0/galerie/0?saison_id=2015")
        .with_status(503)
        .expect(2)
        .create_async()
        .await;

    let config = test_config(&server.url());
    let targets = enumerate_all(&[bayern()], Category::Squad, config.years, &config.base_url);
    let outcome = crawl(&config, targets).await.unwrap();

    ok.assert_async().await;
    broken.assert_async().await;
    assert_eq!(outcome.requested, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.records.len(), 1);

    let Record::Squad(squad) = &outcome.records[0] else {
        panic!("expected a squad record");
    };
    assert_eq!(squad.year, 2014);
    assert_eq!(squad.player_ids, vec!["17259", "4360"]);
    assert_eq!(squad.legioners, 1);
    assert_eq!(squad.team_cost.as_deref(), Some("€560.00m"));
}

#[tokio::test(flavor = "multi_thread")]
async fn gap_report_drives_targeted_recrawl() {
    let mut server = Server::new_async().await;
    let _points_2014 = server
        .mock(
            "GET",
            Matcher::Regex(r"^/fc-bayern-munchen/leistungsdaten/verein/27/plus/0\?reldata=.*2014$".into()),
        )
        .with_status(200)
        .with_body(r#"<p class="content">Points per match: 2,41</p>"#)
        .create_async()
        .await;
    // First pass finds no figure for 2015, so no record and a gap.
    let _points_2015 = server
        .mock(
            "GET",
            Matcher::Regex(r"^/fc-bayern-munchen/leistungsdaten/verein/27/plus/0\?reldata=.*2015$".into()),
        )
        .with_status(200)
        .with_body(r#"<p class="content">-</p>"#)
        .create_async()
        .await;

    let config = test_config(&server.url());
    let entities = vec![bayern()];
    let targets = enumerate_all(&entities, Category::AveragePoints, config.years, &config.base_url);
    let outcome = crawl(&config, targets).await.unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.empty, 1);

    let dir = TempDir::new().unwrap();
    let records_path = dir.path().join("average_points.json");
    emit::write_records(&records_path, outcome.records).await.unwrap();

    let persisted: Vec<serde_json::Value> = emit::read_json_array(&records_path).await.unwrap();
    let gaps = detect_gaps(&collected_pairs(&persisted), &entities, config.years);
    assert_eq!(
        gaps,
        vec![GapReport {
            entity_id: "27".into(),
            left_years: vec![2015]
        }]
    );

    let retry = enumerate_gaps(&entities, Category::AveragePoints, &gaps, &config.base_url);
    assert_eq!(retry.len(), 1);
    assert_eq!(retry[0].year, Some(2015));
}

fn listing_page(rows: &[(&str, &str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(name, link, country)| {
            format!(
                r#"<tr class="odd"><td class="hauptlink"><a href="{link}">{name}</a></td><td class="zentriert"><img title="{country}"></td></tr>"#
            )
        })
        .collect();
    format!("<table>{rows}</table>")
}

#[tokio::test(flavor = "multi_thread")]
async fn seeds_keep_first_page_for_duplicate_ids() {
    let mut server = Server::new_async().await;
    let _p1 = server
        .mock("GET", "/statistik/klubrangliste?page=1")
        .with_body(listing_page(&[
            ("Bayern Munich", "/fc-bayern-munchen/startseite/verein/27", "Germany"),
            ("Real Madrid", "/real-madrid/startseite/verein/418", "Spain"),
        ]))
        .create_async()
        .await;
    let _p2 = server
        .mock("GET", "/statistik/klubrangliste?page=2")
        .with_body(listing_page(&[
            ("FC Bayern", "/fc-bayern-munchen/startseite/verein/27", "Germany"),
            ("Ajax", "/ajax-amsterdam/startseite/verein/610", "Netherlands"),
        ]))
        .create_async()
        .await;

    let config = test_config(&server.url());
    let seeds = collect_seeds(&config, SeedKind::Team, Some(2)).await.unwrap();
    let ids: Vec<_> = seeds.iter().map(|e| (e.id.as_str(), e.page)).collect();
    assert_eq!(ids, vec![("27", 1), ("418", 1), ("610", 2)]);
    assert_eq!(seeds[0].name, "Bayern Munich");

    // Written seeds load back unchanged.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sorted_teams.json");
    emit::write_json_array(&path, &seeds).await.unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(load_seeds(&text, SeedKind::Team).unwrap(), seeds);
}
