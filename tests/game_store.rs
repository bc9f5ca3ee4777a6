use std::time::Duration;

use chrono::NaiveDate;

use statfluence::StatsError;
use statfluence::cache::PlayerIdCache;
use statfluence::game_store::{GameQuery, GameSource, GameStatLine, SqliteGameStore};

fn game(id: &str, year: i32, month: u32, day: u32, team: &str) -> GameStatLine {
    GameStatLine {
        team: team.to_string(),
        points: day,
        ..GameStatLine::blank(
            id,
            year,
            "Regular Season",
            NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        )
    }
}

fn seeded() -> SqliteGameStore {
    let store = SqliteGameStore::open_in_memory().unwrap();
    store
        .insert_games(&[
            game("a", 2023, 6, 1, "LVA"),
            game("a", 2024, 6, 1, "LVA"),
            game("a", 2024, 6, 9, "LVA"),
            game("a", 2024, 7, 2, "LVA"),
            game("b", 2024, 6, 3, "NYL"),
        ])
        .unwrap();
    store
}

#[test]
fn page_rejects_bad_input_before_querying() {
    let store = seeded();
    assert!(matches!(
        store.player_games_page("  ", None, None),
        Err(StatsError::InvalidInput(_))
    ));
    assert!(matches!(
        store.player_games_page("a", Some(0), None),
        Err(StatsError::InvalidInput(_))
    ));
    assert!(matches!(
        store.player_games_page("a", Some(1001), None),
        Err(StatsError::InvalidInput(_))
    ));
    let err = store.player_games_page("", None, None).unwrap_err();
    assert!(!err.is_data_fault());
}

#[test]
fn page_is_newest_first_with_offset() {
    let store = seeded();
    let page = store.player_games_page("a", Some(2), Some(1)).unwrap();
    let dates: Vec<String> = page.iter().map(|g| g.game_date.to_string()).collect();
    assert_eq!(dates, vec!["2024-06-09", "2024-06-01"]);
    assert!(store.player_games_page("nobody", None, None).unwrap().is_empty());
}

#[test]
fn distinct_values_and_filters() {
    let store = seeded();
    assert_eq!(store.distinct_years().unwrap(), vec![2024, 2023]);
    assert_eq!(
        store.distinct_season_types(Some(2024)).unwrap(),
        vec!["Regular Season".to_string()]
    );
    assert_eq!(store.distinct_player_ids().unwrap(), vec!["a", "b"]);

    let nyl = store.games_for(&GameQuery::default().team("nyl")).unwrap();
    assert!(nyl.is_empty(), "year 0 has no rows");
    let nyl = store
        .games_for(&GameQuery {
            year: 2024,
            ..GameQuery::default()
        }
        .team("nyl"))
        .unwrap();
    assert_eq!(nyl.len(), 1);
    assert_eq!(nyl[0].player_id, "b");
}

#[test]
fn deletes_by_year_and_by_player_year() {
    let store = seeded();
    assert_eq!(store.delete_player_year("a", 2024).unwrap(), 3);
    assert_eq!(store.delete_year(2023).unwrap(), 1);
    assert_eq!(store.distinct_player_ids().unwrap(), vec!["b"]);
    assert_eq!(store.delete_year(1999).unwrap(), 0);
}

#[test]
fn unusable_db_directory_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("not_a_dir");
    std::fs::write(&blocker, "x").unwrap();
    let err = SqliteGameStore::open(&blocker.join("games.sqlite")).err().unwrap();
    assert!(matches!(err, StatsError::Io { .. }), "{err}");
    assert!(err.to_string().contains("create db directory"));
    assert!(err.is_data_fault());
}

#[test]
fn timeout_is_configurable() {
    let store = seeded().with_timeout(Duration::from_millis(250));
    assert_eq!(store.timeout(), Duration::from_millis(250));
    assert_eq!(store.distinct_years().unwrap().len(), 2);
}

#[test]
fn slow_queries_time_out_and_the_store_recovers() {
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let lines: Vec<GameStatLine> = (0..50_000)
        .map(|i| GameStatLine::blank(format!("p{i:05}"), 2025, "Regular Season", date))
        .collect();
    let store = SqliteGameStore::open_in_memory().unwrap();
    assert_eq!(store.insert_games(&lines).unwrap(), 50_000);

    let query = GameQuery {
        year: 2025,
        ..GameQuery::default()
    };
    let store = store.with_timeout(Duration::from_nanos(1));
    let err = store.games_for(&query).unwrap_err();
    assert!(matches!(err, StatsError::Timeout(_)), "{err}");
    assert!(err.is_data_fault());

    let store = store.with_timeout(Duration::from_secs(5));
    assert_eq!(store.games_for(&query).unwrap().len(), 50_000);
}

#[test]
fn player_id_cache_serves_until_may_first() {
    let store = seeded();
    let cache = PlayerIdCache::new();
    let march = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    assert_eq!(cache.player_ids_at(&store, march).unwrap(), vec!["a", "b"]);

    store.insert_games(&[game("c", 2025, 5, 20, "MIN")]).unwrap();
    let april = NaiveDate::from_ymd_opt(2025, 4, 30)
        .unwrap()
        .and_hms_opt(23, 0, 0)
        .unwrap();
    assert_eq!(cache.player_ids_at(&store, april).unwrap(), vec!["a", "b"]);

    let may = NaiveDate::from_ymd_opt(2025, 5, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(cache.player_ids_at(&store, may).unwrap(), vec!["a", "b", "c"]);
}
