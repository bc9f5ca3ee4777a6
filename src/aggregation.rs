use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game_store::GameStatLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonAverageRow {
    pub player_id: String,
    pub games: usize,
    pub minutes: f64,
    pub points: f64,
    pub fg: f64,
    pub fga: f64,
    /// Fraction in [0, 1], from accumulated makes/attempts.
    pub fg_pct: f64,
    pub trb: f64,
    pub ast: f64,
    pub stl: f64,
    pub blk: f64,
    pub tov: f64,
}

pub type TrailingWindowRow = SeasonAverageRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Minutes,
    Points,
    FieldGoalPct,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Minutes,
        Metric::Points,
        Metric::FieldGoalPct,
        Metric::Rebounds,
        Metric::Assists,
        Metric::Steals,
        Metric::Blocks,
        Metric::Turnovers,
    ];

    pub fn value(self, row: &SeasonAverageRow) -> f64 {
        match self {
            Metric::Minutes => row.minutes,
            Metric::Points => row.points,
            Metric::FieldGoalPct => row.fg_pct,
            Metric::Rebounds => row.trb,
            Metric::Assists => row.ast,
            Metric::Steals => row.stl,
            Metric::Blocks => row.blk,
            Metric::Turnovers => row.tov,
        }
    }

    /// Valence only. Trend direction never depends on this.
    pub fn higher_is_better(self) -> bool {
        !matches!(self, Metric::Turnovers)
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Minutes => "MP",
            Metric::Points => "PTS",
            Metric::FieldGoalPct => "FG%",
            Metric::Rebounds => "TRB",
            Metric::Assists => "AST",
            Metric::Steals => "STL",
            Metric::Blocks => "BLK",
            Metric::Turnovers => "TOV",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAggregate {
    pub season: SeasonAverageRow,
    pub trailing: TrailingWindowRow,
}

pub fn group_by_player(lines: &[GameStatLine]) -> BTreeMap<&str, Vec<&GameStatLine>> {
    let mut groups: BTreeMap<&str, Vec<&GameStatLine>> = BTreeMap::new();
    for line in lines {
        groups.entry(line.player_id.as_str()).or_default().push(line);
    }
    groups
}

/// Averages one player's games. `None` for an empty slice: a player without
/// games has no row at all.
pub fn average_games(player_id: &str, games: &[&GameStatLine]) -> Option<SeasonAverageRow> {
    if games.is_empty() {
        return None;
    }

    let mut minutes = 0.0;
    let mut points = 0u64;
    let mut fg = 0u64;
    let mut fga = 0u64;
    let mut trb = 0u64;
    let mut ast = 0u64;
    let mut stl = 0u64;
    let mut blk = 0u64;
    let mut tov = 0u64;
    for g in games {
        minutes += g.minutes;
        points += u64::from(g.points);
        fg += u64::from(g.fg);
        fga += u64::from(g.fga);
        trb += u64::from(g.trb);
        ast += u64::from(g.ast);
        stl += u64::from(g.stl);
        blk += u64::from(g.blk);
        tov += u64::from(g.tov);
    }

    let n = games.len() as f64;
    let fg_pct = if fga > 0 { fg as f64 / fga as f64 } else { 0.0 };
    Some(SeasonAverageRow {
        player_id: player_id.to_string(),
        games: games.len(),
        minutes: minutes / n,
        points: points as f64 / n,
        fg: fg as f64 / n,
        fga: fga as f64 / n,
        fg_pct,
        trb: trb as f64 / n,
        ast: ast as f64 / n,
        stl: stl as f64 / n,
        blk: blk as f64 / n,
        tov: tov as f64 / n,
    })
}

pub fn season_averages(lines: &[GameStatLine]) -> Vec<SeasonAverageRow> {
    let groups = group_by_player(lines);
    groups
        .into_par_iter()
        .filter_map(|(player_id, games)| average_games(player_id, &games))
        .collect()
}

/// The chronologically last `k` games, oldest first. Dates are compared as
/// parsed calendar dates; ties keep their input order.
pub fn trailing_window<'a>(games: &[&'a GameStatLine], k: usize) -> Vec<&'a GameStatLine> {
    let mut sorted = games.to_vec();
    sorted.sort_by_key(|g| g.game_date);
    let start = sorted.len().saturating_sub(k);
    sorted.split_off(start)
}

pub fn trailing_averages(lines: &[GameStatLine], k: usize) -> Vec<TrailingWindowRow> {
    let groups = group_by_player(lines);
    groups
        .into_par_iter()
        .filter_map(|(player_id, games)| average_games(player_id, &trailing_window(&games, k)))
        .collect()
}

pub fn aggregate_players(lines: &[GameStatLine], k: usize) -> Vec<PlayerAggregate> {
    let groups = group_by_player(lines);
    groups
        .into_par_iter()
        .filter_map(|(player_id, games)| {
            let season = average_games(player_id, &games)?;
            let trailing = average_games(player_id, &trailing_window(&games, k))
                .unwrap_or_else(|| season.clone());
            Some(PlayerAggregate { season, trailing })
        })
        .collect()
}
