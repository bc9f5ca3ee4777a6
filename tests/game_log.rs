use std::fs;

use statfluence::game_log::{collect_log_files, read_game_log};
use statfluence::game_store::{GameSource, SqliteGameStore};

const HEADER: &str = "Rk,Date,Age,Tm,,Opp,WDiff,GS,MP,FG,FGA,FG%,3P,3PA,3P%,FT,FTA,FT%,ORB,DRB,TRB,AST,STL,BLK,TOV,PF,PTS,GmSc,SeasonType";

#[test]
fn reads_a_game_log_and_seeds_the_store() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("wilsoaj01w_game_log_2025.csv");
    fs::write(
        &path,
        format!(
            "{HEADER}\n\
             1,2025-05-16,28-272,lva,,CON,+12,1,34:30,10,18,.556,1,2,.500,6,7,.857,2,9,11,3,2,2,1,2,27,25.1,Regular Season\n\
             ,Date,,,,,,,,,,,,,,,,,,,,,,,,,,,\n\
             2,2025-05-18,28-274,LVA,@,NYL,-4,1,31,8,20,.400,0,1,.000,4,4,1.000,1,7,8,2,1,3,4,3,20,13.0,Regular Season\n"
        ),
    )
    .unwrap();

    let lines = read_game_log(&path).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].player_id, "wilsoaj01w");
    assert_eq!(lines[0].year, 2025);
    assert_eq!(lines[0].team, "LVA");
    assert_eq!(lines[0].minutes, 34.5);
    assert_eq!(lines[0].points, 27);
    assert_eq!(lines[0].trb, 11);
    assert_eq!(lines[1].tov, 4);
    assert_eq!(lines[1].season_type, "Regular Season");

    let store = SqliteGameStore::open_in_memory().unwrap();
    assert_eq!(store.insert_games(&lines).unwrap(), 2);
    assert_eq!(store.distinct_player_ids().unwrap(), vec!["wilsoaj01w"]);
}

#[test]
fn badly_named_files_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("game_log.csv");
    fs::write(&path, format!("{HEADER}\n")).unwrap();
    assert!(read_game_log(&path).is_err());
}

#[test]
fn directories_yield_sorted_csv_files() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("b_game_log_2025.csv"), HEADER).unwrap();
    fs::write(tmp.path().join("a_game_log_2025.csv"), HEADER).unwrap();
    fs::write(tmp.path().join("notes.txt"), "skip").unwrap();

    let files = collect_log_files(tmp.path()).unwrap();
    let names: Vec<String> = files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a_game_log_2025.csv", "b_game_log_2025.csv"]);
    assert!(collect_log_files(&tmp.path().join("notes.txt")).is_err());
}
