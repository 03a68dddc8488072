use serde_json::{json, Value};
use squad_scrape::derive::{attach_national_counts, attach_size_ratios};
use squad_scrape::emit;
use squad_scrape::record::{NationalSquadRecord, SquadRecord};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, value: &Value) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn both_passes_over_legacy_files() {
    let dir = TempDir::new().unwrap();
    let clubs_path = write(
        &dir,
        "all_kader.json",
        &json!([
            {"TeamID ": "3", "Year": 2015, "TeamCost": "€10m", "AverageAge": "25.0", "Legioners": 2, "TeamSize": 25, "PlayerIDS": ["a", "b", "c"]},
            {"TeamID ": "3", "Year": 2014, "TeamCost": null, "AverageAge": null, "Legioners": 0, "TeamSize": 20, "PlayerIDS": ["a"]},
            {"TeamID ": "3", "Year": 2017, "TeamCost": null, "AverageAge": null, "Legioners": 0, "TeamSize": 0, "PlayerIDS": []},
            {"TeamID ": "3", "Year": 2018, "TeamCost": null, "AverageAge": null, "Legioners": 0, "TeamSize": 10, "PlayerIDS": ["d"]}
        ]),
    );
    let national_path = write(
        &dir,
        "national_kader.json",
        &json!([
            {"TeamID ": "3262", "Year": 2015, "PlayerIDS": ["b", "x"]},
            {"TeamID ": "3375", "Year": 2015, "PlayerIDS": ["c"]},
            {"TeamID ": "3375", "Year": 2018, "PlayerIDS": ["z"]}
        ]),
    );
    let original = std::fs::read(&clubs_path).unwrap();

    let clubs: Vec<SquadRecord> = emit::read_json_array(&clubs_path).await.unwrap();
    let nationals: Vec<NationalSquadRecord> = emit::read_json_array(&national_path).await.unwrap();
    let updated_path = dir.path().join("updated_club_teams.json");
    emit::write_json_array(&updated_path, &attach_national_counts(clubs, &nationals))
        .await
        .unwrap();

    let updated: Vec<SquadRecord> = emit::read_json_array(&updated_path).await.unwrap();
    let complete_path = dir.path().join("complete_clubs.json");
    emit::write_json_array(&complete_path, &attach_size_ratios(updated))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&clubs_path).unwrap(), original);

    let complete: Vec<Value> = emit::read_json_array(&complete_path).await.unwrap();
    let summary: Vec<_> = complete
        .iter()
        .map(|c| {
            (
                c["TeamID"].clone(),
                c["Year"].clone(),
                c["NationalPlayersCount"].clone(),
                c["TeamSizeRatio"].clone(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (json!("3"), json!(2014), json!(0), Value::Null),
            (json!("3"), json!(2015), json!(2), json!(1.25)),
            (json!("3"), json!(2017), json!(0), json!(0.0)),
            (json!("3"), json!(2018), json!(0), Value::Null),
        ]
    );
    assert!(complete.iter().all(|c| c.as_object().unwrap().contains_key("TeamSizeRatio")));
}
