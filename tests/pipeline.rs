use chrono::NaiveDate;

use statfluence::aggregation::Metric;
use statfluence::directory::{PlayerDirectory, RosterRow};
use statfluence::game_store::{GameStatLine, SeasonScope, SqliteGameStore};
use statfluence::pipeline::{PipelineOptions, current_rankings, rank_scope, select_scope};
use statfluence::trend::Trend;

fn game(id: &str, year: i32, kind: &str, day: u32, pts: u32) -> GameStatLine {
    GameStatLine {
        team: "LVA".to_string(),
        minutes: 30.0,
        points: pts,
        ..GameStatLine::blank(id, year, kind, NaiveDate::from_ymd_opt(year, 6, day).unwrap())
    }
}

fn directory() -> PlayerDirectory {
    PlayerDirectory::build(
        vec![
            ("Aʼja Wilson".to_string(), "a".to_string()),
            ("Kelsey Plum".to_string(), "b".to_string()),
        ],
        vec![RosterRow {
            name: "Kelsey Plum".to_string(),
            position: "G".to_string(),
            team: "LAS".to_string(),
        }],
    )
}

#[test]
fn prefers_regular_season_in_the_newest_year() {
    let store = SqliteGameStore::open_in_memory().unwrap();
    store
        .insert_games(&[
            game("a", 2024, "Regular Season", 1, 10),
            game("a", 2025, "Playoffs", 1, 30),
            game("a", 2025, "Regular Season", 2, 20),
        ])
        .unwrap();

    let (scope, games) = select_scope(&store).unwrap().unwrap();
    assert_eq!(scope, SeasonScope::new(2025, Some("Regular Season")));
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].points, 20);
}

#[test]
fn falls_back_to_all_types_when_preferred_has_no_rows() {
    let store = SqliteGameStore::open_in_memory().unwrap();
    store
        .insert_games(&[
            game("a", 2024, "Regular Season", 1, 10),
            game("a", 2025, "Playoffs", 1, 30),
        ])
        .unwrap();

    let (scope, games) = select_scope(&store).unwrap().unwrap();
    assert_eq!(scope, SeasonScope::new(2025, None));
    assert_eq!(games.len(), 1);
}

#[test]
fn empty_store_has_no_scope() {
    let store = SqliteGameStore::open_in_memory().unwrap();
    assert!(select_scope(&store).unwrap().is_none());
    let opts = PipelineOptions::default();
    assert!(current_rankings(&store, &directory(), &opts).unwrap().is_none());
}

#[test]
fn ranked_rows_carry_directory_data_and_trends() {
    let store = SqliteGameStore::open_in_memory().unwrap();
    let mut lines = Vec::new();
    // "a" heats up over the last five games; "b" is flat.
    for day in 1..=10 {
        lines.push(game("a", 2025, "Regular Season", day, if day > 5 { 30 } else { 10 }));
        lines.push(game("b", 2025, "Regular Season", day, 15));
    }
    store.insert_games(&lines).unwrap();

    let scope = SeasonScope::new(2025, Some("Regular Season"));
    let rows = rank_scope(&store, &scope, &directory(), &PipelineOptions::default()).unwrap();
    assert_eq!(rows.len(), 2);

    let a = &rows[0];
    assert_eq!(a.player_id, "a");
    assert_eq!(a.rank, 1);
    assert_eq!(a.name, "Aʼja Wilson");
    assert_eq!(a.slug, "aja-wilson");
    assert_eq!(a.team, "");
    assert!(a.position.is_none());
    assert_eq!(a.metric(Metric::Points), 20.0);
    assert_eq!(a.trailing.points, 30.0);
    assert_eq!(a.trend(Metric::Points), Trend::Up);

    let b = &rows[1];
    assert_eq!(b.rank, 2);
    assert_eq!(b.team, "LAS");
    assert_eq!(b.position.as_deref(), Some("G"));
    assert_eq!(b.trend(Metric::Points), Trend::Neutral);
}

#[test]
fn current_rankings_reports_the_chosen_scope() {
    let store = SqliteGameStore::open_in_memory().unwrap();
    store
        .insert_games(&[
            game("a", 2025, "Regular Season", 1, 12),
            game("b", 2025, "Regular Season", 1, 18),
        ])
        .unwrap();
    let rankings = current_rankings(&store, &directory(), &PipelineOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(rankings.scope.label(), "2025 Regular Season");
    let order: Vec<&str> = rankings.rows.iter().map(|r| r.player_id.as_str()).collect();
    assert_eq!(order, vec!["b", "a"]);
}
