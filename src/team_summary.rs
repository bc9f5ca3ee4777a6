use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::game_store::{GameQuery, GameSource, GameStatLine};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonSummary {
    pub team: String,
    pub year: i32,
    pub season_type: String,
    pub games: usize,
    pub pts: u64,
    pub reb: u64,
    pub oreb: u64,
    pub dreb: u64,
    pub ast: u64,
    pub stl: u64,
    pub blk: u64,
    pub tov: u64,
    pub fgm: u64,
    pub fga: u64,
    pub ftm: u64,
    pub fta: u64,
    pub fg_pct: f64,
    pub ft_pct: f64,
    /// `pts / (2 * (fga + 0.44 * fta))`
    pub ts_pct: f64,
}

impl TeamSeasonSummary {
    fn add(&mut self, line: &GameStatLine) {
        self.games += 1;
        self.pts += u64::from(line.points);
        self.reb += u64::from(line.trb);
        self.oreb += u64::from(line.orb);
        self.dreb += u64::from(line.drb);
        self.ast += u64::from(line.ast);
        self.stl += u64::from(line.stl);
        self.blk += u64::from(line.blk);
        self.tov += u64::from(line.tov);
        self.fgm += u64::from(line.fg);
        self.fga += u64::from(line.fga);
        self.ftm += u64::from(line.ft);
        self.fta += u64::from(line.fta);
    }

    fn finish(mut self) -> Self {
        self.fg_pct = ratio(self.fgm as f64, self.fga as f64);
        self.ft_pct = ratio(self.ftm as f64, self.fta as f64);
        let shots = self.fga as f64 + 0.44 * self.fta as f64;
        self.ts_pct = ratio(self.pts as f64, 2.0 * shots);
        self
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter {
    pub year: Option<i32>,
    pub season_type: Option<String>,
    /// Empty means every team. Compared case-insensitively.
    pub teams: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamFilterOptions {
    pub years: Vec<i32>,
    pub season_types: Vec<String>,
}

pub fn filter_options(source: &dyn GameSource) -> Result<TeamFilterOptions> {
    Ok(TeamFilterOptions {
        years: source.distinct_years()?,
        season_types: source.distinct_season_types(None)?,
    })
}

/// Totals grouped by (team, year, season type) from raw lines. Rows with an
/// empty team code are skipped.
pub fn summarize(lines: &[GameStatLine]) -> Vec<TeamSeasonSummary> {
    let mut groups: BTreeMap<(i32, String, String), TeamSeasonSummary> = BTreeMap::new();
    for line in lines {
        if line.team.is_empty() {
            continue;
        }
        let key = (line.year, line.team.clone(), line.season_type.clone());
        groups
            .entry(key)
            .or_insert_with(|| TeamSeasonSummary {
                team: line.team.clone(),
                year: line.year,
                season_type: line.season_type.clone(),
                ..TeamSeasonSummary::default()
            })
            .add(line);
    }

    let mut out: Vec<TeamSeasonSummary> =
        groups.into_values().map(TeamSeasonSummary::finish).collect();
    out.sort_by(|a, b| {
        b.year
            .cmp(&a.year)
            .then_with(|| a.team.cmp(&b.team))
            .then_with(|| a.season_type.cmp(&b.season_type))
    });
    out
}

pub fn team_summary(source: &dyn GameSource, filter: &TeamFilter) -> Result<Vec<TeamSeasonSummary>> {
    let years = match filter.year {
        Some(year) => vec![year],
        None => source.distinct_years()?,
    };
    let wanted: BTreeSet<String> = filter
        .teams
        .iter()
        .map(|t| t.trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .collect();

    let mut lines = Vec::new();
    for year in years {
        let query = GameQuery {
            year,
            season_type: filter.season_type.clone(),
            ..GameQuery::default()
        };
        lines.extend(
            source
                .games_for(&query)?
                .into_iter()
                .filter(|g| wanted.is_empty() || wanted.contains(&g.team)),
        );
    }
    Ok(summarize(&lines))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn line(team: &str, pts: u32, fga: u32, fta: u32) -> GameStatLine {
        GameStatLine {
            team: team.to_string(),
            points: pts,
            fga,
            fta,
            ..GameStatLine::blank(
                "p",
                2024,
                "Regular Season",
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            )
        }
    }

    #[test]
    fn true_shooting_uses_free_throw_weight() {
        let rows = summarize(&[line("NYL", 20, 10, 5), line("NYL", 10, 5, 0)]);
        assert_eq!(rows.len(), 1);
        let expected = 30.0 / (2.0 * (15.0 + 0.44 * 5.0));
        assert!((rows[0].ts_pct - expected).abs() < 1e-12);
        assert_eq!(rows[0].games, 2);
    }

    #[test]
    fn zero_attempts_give_zero_percentages() {
        let rows = summarize(&[line("LVA", 0, 0, 0)]);
        assert_eq!(rows[0].fg_pct, 0.0);
        assert_eq!(rows[0].ft_pct, 0.0);
        assert_eq!(rows[0].ts_pct, 0.0);
    }
}
