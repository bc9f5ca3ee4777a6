use std::fs;

use statfluence::directory::{
    PlayerDirectory, PositionBucket, RosterRow, compact_slug, load_roster, slug_for,
};

fn sample() -> PlayerDirectory {
    let names = vec![
        ("Aʼja Wilson".to_string(), "wilsoaj01w".to_string()),
        ("Breanna Stewart".to_string(), "stewabr01w".to_string()),
        ("Sabrina Ionescu".to_string(), "ionessa01w".to_string()),
    ];
    let roster = vec![
        RosterRow {
            name: "Aʼja Wilson".to_string(),
            position: "c-f".to_string(),
            team: "lva".to_string(),
        },
        RosterRow {
            name: "Breanna Stewart".to_string(),
            position: "F".to_string(),
            team: "NYL".to_string(),
        },
        RosterRow {
            name: "Caitlin Clark".to_string(),
            position: "G".to_string(),
            team: "IND".to_string(),
        },
    ];
    PlayerDirectory::build(names, roster)
}

#[test]
fn slug_drops_modifier_apostrophe() {
    assert_eq!(slug_for("Aʼja Wilson"), "aja-wilson");
    assert_eq!(compact_slug("Aʼja Wilson"), "ajawilson");
}

#[test]
fn resolves_by_id_then_slug_then_compact() {
    let dir = sample();
    assert_eq!(
        dir.resolve("stewabr01w").map(|e| e.name.as_str()),
        Some("Breanna Stewart")
    );
    assert_eq!(
        dir.resolve("aja-wilson").map(|e| e.player_id.as_str()),
        Some("wilsoaj01w")
    );
    assert_eq!(
        dir.resolve("Sabrina Ionescu").map(|e| e.player_id.as_str()),
        Some("ionessa01w")
    );
    assert_eq!(
        dir.resolve("ajawilson").map(|e| e.player_id.as_str()),
        Some("wilsoaj01w")
    );
    assert!(dir.resolve("nobody-here").is_none());
    assert!(dir.resolve("   ").is_none());
}

#[test]
fn unknown_ids_fall_back() {
    let dir = sample();
    assert_eq!(dir.name_for("ghost01w"), "ghost01w");
    assert_eq!(dir.position_bucket_for("ghost01w"), PositionBucket::Unknown);
    assert_eq!(dir.team_for("ghost01w"), "");
    assert!(dir.position_code_for("ghost01w").is_none());
}

#[test]
fn roster_join_fills_position_and_team() {
    let dir = sample();
    assert_eq!(dir.position_code_for("wilsoaj01w"), Some("C-F"));
    assert_eq!(dir.team_for("wilsoaj01w"), "LVA");
    assert_eq!(dir.position_bucket_for("wilsoaj01w"), PositionBucket::Centers);
    let buckets = dir.position_buckets_for("wilsoaj01w");
    assert!(buckets.contains(PositionBucket::Centers));
    assert!(buckets.contains(PositionBucket::Forwards));
    assert!(!buckets.contains(PositionBucket::Guards));
}

#[test]
fn unmatched_names_are_reported_both_ways() {
    let dir = sample();
    assert_eq!(dir.unmatched_roster_names(), ["Caitlin Clark".to_string()]);
    assert_eq!(dir.ids_without_roster(), vec!["ionessa01w".to_string()]);
}

#[test]
fn loads_csv_files_with_loose_headers() {
    let tmp = tempfile::tempdir().unwrap();
    let names = tmp.path().join("ids.csv");
    let roster = tmp.path().join("2025_per_game.csv");
    fs::write(
        &names,
        "name,player_id\nAʼja Wilson,wilsoaj01w\nNapheesa Collier,collina01w\n,orphan\n",
    )
    .unwrap();
    fs::write(
        &roster,
        "Rk,Player,Tm,Pos,G\n1,Napheesa Collier,MIN,F,40\n2,Aʼja Wilson,LVA,C,40\n",
    )
    .unwrap();

    let rows = load_roster(&roster).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].team, "MIN");

    let dir = PlayerDirectory::load(&names, Some(&roster));
    assert_eq!(dir.len(), 2);
    assert_eq!(dir.team_for("collina01w"), "MIN");
    assert_eq!(dir.position_code_for("wilsoaj01w"), Some("C"));
}

#[test]
fn missing_files_give_an_empty_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = PlayerDirectory::load(&tmp.path().join("missing.csv"), None);
    assert!(dir.is_empty());
    assert_eq!(dir.name_for("x"), "x");
}

#[test]
fn roster_without_position_column_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let roster = tmp.path().join("bad.csv");
    fs::write(&roster, "Player,Team\nA,B\n").unwrap();
    assert!(load_roster(&roster).is_err());
}

#[test]
fn shared_display_names_join_the_first_id_and_are_reported() {
    let names = vec![
        ("Jordan Smith".to_string(), "smithjo02w".to_string()),
        ("Jordan Smith".to_string(), "smithjo01w".to_string()),
        ("Kelsey Plum".to_string(), "plumke01w".to_string()),
    ];
    let roster = vec![
        RosterRow {
            name: "Jordan Smith".to_string(),
            position: "G".to_string(),
            team: "SEA".to_string(),
        },
        RosterRow {
            name: "Kelsey Plum".to_string(),
            position: "G".to_string(),
            team: "LAS".to_string(),
        },
    ];
    for _ in 0..8 {
        let dir = PlayerDirectory::build(names.clone(), roster.clone());
        assert_eq!(dir.team_for("smithjo02w"), "SEA");
        assert_eq!(dir.position_code_for("smithjo01w"), None);
        assert_eq!(dir.unmatched_roster_names(), ["Jordan Smith".to_string()]);
        assert_eq!(dir.ids_without_roster(), vec!["smithjo01w".to_string()]);
    }
}
