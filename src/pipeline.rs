use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregation::{self, Metric, SeasonAverageRow, TrailingWindowRow};
use crate::config::DashboardConfig;
use crate::directory::{PlayerDirectory, PositionBuckets};
use crate::error::Result;
use crate::game_store::{GameQuery, GameSource, GameStatLine, SeasonScope};
use crate::power_rank::{self, PowerFormula, PowerPreset};
use crate::trend::{self, Trend, TrendAnnotation, TrendRule};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayerRow {
    pub player_id: String,
    pub name: String,
    pub slug: String,
    pub position: Option<String>,
    pub buckets: PositionBuckets,
    pub team: String,
    pub season: SeasonAverageRow,
    pub trailing: TrailingWindowRow,
    pub trends: TrendAnnotation,
    pub power: f64,
    pub rank: usize,
}

impl RankedPlayerRow {
    pub fn metric(&self, metric: Metric) -> f64 {
        metric.value(&self.season)
    }

    pub fn trend(&self, metric: Metric) -> Trend {
        self.trends.get(metric)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineOptions {
    pub trailing_games: usize,
    pub formula: PowerFormula,
    pub trend_rule: TrendRule,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            trailing_games: crate::config::DEFAULT_TRAILING_GAMES,
            formula: PowerPreset::Simple.formula(),
            trend_rule: TrendRule::recent_form(),
        }
    }
}

impl From<&DashboardConfig> for PipelineOptions {
    fn from(cfg: &DashboardConfig) -> Self {
        Self {
            trailing_games: cfg.trailing_games.max(1),
            formula: cfg.power_preset.formula(),
            trend_rule: cfg.trend_rule,
        }
    }
}

pub fn rank_games(
    lines: &[GameStatLine],
    directory: &PlayerDirectory,
    opts: &PipelineOptions,
) -> Vec<RankedPlayerRow> {
    let players = aggregation::aggregate_players(lines, opts.trailing_games);
    let scores = power_rank::rank_players(&opts.formula, &players);

    let mut by_id: std::collections::HashMap<&str, &aggregation::PlayerAggregate> = players
        .iter()
        .map(|p| (p.season.player_id.as_str(), p))
        .collect();

    let mut out = Vec::with_capacity(scores.len());
    for score in scores {
        let Some(agg) = by_id.remove(score.player_id.as_str()) else {
            continue;
        };
        let name = directory.name_for(&score.player_id);
        out.push(RankedPlayerRow {
            slug: crate::directory::slug_for(&name),
            name,
            position: directory
                .position_code_for(&score.player_id)
                .map(|s| s.to_string()),
            buckets: directory.position_buckets_for(&score.player_id),
            team: directory.team_for(&score.player_id),
            trends: trend::annotate(&agg.season, &agg.trailing, &opts.trend_rule),
            season: agg.season.clone(),
            trailing: agg.trailing.clone(),
            power: score.score,
            rank: score.rank,
            player_id: score.player_id,
        });
    }
    out
}

pub fn rank_scope(
    source: &dyn GameSource,
    scope: &SeasonScope,
    directory: &PlayerDirectory,
    opts: &PipelineOptions,
) -> Result<Vec<RankedPlayerRow>> {
    let games = source.games_for(&GameQuery::for_scope(scope))?;
    debug!(scope = %scope.label(), games = games.len(), "ranking scope");
    Ok(rank_games(&games, directory, opts))
}

fn is_regular_season(label: &str) -> bool {
    label.trim().to_lowercase().starts_with("regular season")
}

/// Picks the scope the landing table shows: newest year, regular season if
/// that label exists and has rows, otherwise every season type, then older
/// years in the same order. Returns the scope with its games.
pub fn select_scope(
    source: &dyn GameSource,
) -> Result<Option<(SeasonScope, Vec<GameStatLine>)>> {
    let years = source.distinct_years()?;
    let season_types = source.distinct_season_types(None)?;
    let preferred = season_types.iter().find(|s| is_regular_season(s)).cloned();

    for year in years {
        let mut candidates = Vec::with_capacity(2);
        if let Some(kind) = preferred.as_deref() {
            candidates.push(SeasonScope::new(year, Some(kind)));
        }
        candidates.push(SeasonScope::new(year, None));

        for scope in candidates {
            let games = source.games_for(&GameQuery::for_scope(&scope))?;
            if !games.is_empty() {
                return Ok(Some((scope, games)));
            }
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub scope: SeasonScope,
    pub rows: Vec<RankedPlayerRow>,
}

/// Landing-page rankings. `Ok(None)` when the store holds no games at all.
pub fn current_rankings(
    source: &dyn GameSource,
    directory: &PlayerDirectory,
    opts: &PipelineOptions,
) -> Result<Option<Rankings>> {
    let Some((scope, games)) = select_scope(source)? else {
        return Ok(None);
    };
    let rows = rank_games(&games, directory, opts);
    info!(scope = %scope.label(), players = rows.len(), "rankings computed");
    Ok(Some(Rankings { scope, rows }))
}
