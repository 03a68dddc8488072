//! Offline derivations joining persisted crawl outputs.
//!
//! Both passes take the records by value and hand back new vectors; writing
//! them out is the caller's job.

use std::collections::{HashMap, HashSet};

use crate::record::{NationalSquadRecord, SquadRecord};

/// Year -> every player id on any national roster that year.
pub fn national_players_by_year(nationals: &[NationalSquadRecord]) -> HashMap<i32, HashSet<&str>> {
    let mut by_year: HashMap<i32, HashSet<&str>> = HashMap::new();
    for record in nationals {
        by_year
            .entry(record.year)
            .or_default()
            .extend(record.player_ids.iter().map(String::as_str));
    }
    by_year
}

/// Attaches `NationalPlayersCount`: how many of the club's players were on a
/// national roster the same year. Years without national data count 0.
pub fn attach_national_counts(clubs: Vec<SquadRecord>, nationals: &[NationalSquadRecord]) -> Vec<SquadRecord> {
    let by_year = national_players_by_year(nationals);
    clubs
        .into_iter()
        .map(|mut club| {
            let count = by_year.get(&club.year).map_or(0, |national| {
                club.player_ids
                    .iter()
                    .map(String::as_str)
                    .collect::<HashSet<_>>()
                    .intersection(national)
                    .count()
            });
            club.national_players_count = Some(count);
            club
        })
        .collect()
}

/// Sorts by (trimmed id, year) and attaches `TeamSizeRatio` against the record
/// immediately before it. Neighbours count even when seasons in between are
/// missing: 2017 after 2015 is compared with 2015.
pub fn attach_size_ratios(mut clubs: Vec<SquadRecord>) -> Vec<SquadRecord> {
    clubs.sort_by(|a, b| {
        a.team_id
            .trim()
            .cmp(b.team_id.trim())
            .then(a.year.cmp(&b.year))
    });

    let mut previous: Option<(String, u32)> = None;
    for club in clubs.iter_mut() {
        let id = club.team_id.trim().to_string();
        let ratio = match &previous {
            Some((prev_id, prev_size)) if *prev_id == id => size_ratio(club.team_size, *prev_size),
            _ => None,
        };
        club.team_size_ratio = Some(ratio);
        previous = Some((id, club.team_size));
    }
    clubs
}

/// `current / previous` rounded to two places, ties to even; `None` when
/// previous is 0.
pub fn size_ratio(current: u32, previous: u32) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    let ratio = f64::from(current) / f64::from(previous);
    // Precision formatting rounds the exact binary value half to even.
    format!("{ratio:.2}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club(id: &str, year: i32, size: u32, players: &[&str]) -> SquadRecord {
        SquadRecord {
            team_id: id.into(),
            year,
            team_cost: None,
            average_age: None,
            legioners: 0,
            team_size: size,
            player_ids: players.iter().map(|p| p.to_string()).collect(),
            national_players_count: None,
            team_size_ratio: None,
        }
    }

    fn national(id: &str, year: i32, players: &[&str]) -> NationalSquadRecord {
        NationalSquadRecord {
            team_id: id.into(),
            year,
            player_ids: players.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn national_count_is_an_intersection() {
        let clubs = vec![club("X", 2020, 3, &["a", "b", "c"]), club("X", 2021, 3, &["a", "b", "c"])];
        let nationals = vec![national("France", 2020, &["b"]), national("Spain", 2020, &["d", "b"])];
        let out = attach_national_counts(clubs, &nationals);
        assert_eq!(out[0].national_players_count, Some(1));
        assert_eq!(out[1].national_players_count, Some(0));
    }

    #[test]
    fn duplicate_roster_ids_count_once() {
        let clubs = vec![club("X", 2020, 3, &["b", "b", "d"])];
        let nationals = vec![national("France", 2020, &["b", "d", "d"])];
        let out = attach_national_counts(clubs, &nationals);
        assert_eq!(out[0].national_players_count, Some(2));
    }

    #[test]
    fn ratios_follow_sorted_neighbours() {
        let clubs = vec![
            club("3", 2018, 10, &[]),
            club("3", 2014, 20, &[]),
            club("3", 2017, 0, &[]),
            club("3", 2015, 25, &[]),
        ];
        let out = attach_size_ratios(clubs);
        let years: Vec<_> = out.iter().map(|c| c.year).collect();
        let ratios: Vec<_> = out.iter().map(|c| c.team_size_ratio).collect();
        assert_eq!(years, vec![2014, 2015, 2017, 2018]);
        assert_eq!(ratios, vec![Some(None), Some(Some(1.25)), Some(Some(0.0)), Some(None)]);
    }

    #[test]
    fn first_year_of_each_team_has_no_ratio() {
        let clubs = vec![
            club(" 12", 2015, 30, &[]),
            club("11", 2014, 20, &[]),
            club("12 ", 2014, 20, &[]),
            club("11", 2015, 21, &[]),
        ];
        let out = attach_size_ratios(clubs);
        let keyed: Vec<_> = out
            .iter()
            .map(|c| (c.team_id.trim(), c.year, c.team_size_ratio))
            .collect();
        assert_eq!(
            keyed,
            vec![
                ("11", 2014, Some(None)),
                ("11", 2015, Some(Some(1.05))),
                ("12", 2014, Some(None)),
                ("12", 2015, Some(Some(1.5))),
            ]
        );
    }

    #[test]
    fn ratio_rounding() {
        assert_eq!(size_ratio(2, 3), Some(0.67));
        assert_eq!(size_ratio(5, 0), None);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(size_ratio(27, 24), Some(1.12));
        assert_eq!(size_ratio(15, 24), Some(0.62));
        assert_eq!(size_ratio(17, 40), Some(0.42));
        assert_eq!(size_ratio(18, 16), Some(1.12));
        assert_eq!(size_ratio(20, 32), Some(0.62));
    }
}
