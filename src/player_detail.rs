use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::{self, Metric, SeasonAverageRow};
use crate::error::{Result, StatsError};
use crate::game_store::{GameQuery, GameSource, GameStatLine};
use crate::trend::{self, TrendAnnotation, TrendRule};

pub const PAST_SEASONS: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetail {
    pub player_id: String,
    pub year: i32,
    pub current: SeasonAverageRow,
    /// `None` when the player has no games in the comparison years.
    pub past: Option<SeasonAverageRow>,
    pub trends: TrendAnnotation,
}

impl PlayerDetail {
    pub fn metric_rows(&self) -> impl Iterator<Item = (Metric, f64, Option<f64>)> + '_ {
        Metric::ALL.into_iter().map(|m| {
            (
                m,
                m.value(&self.current),
                self.past.as_ref().map(|p| m.value(p)),
            )
        })
    }
}

fn checked_id(player_id: &str) -> Result<&str> {
    let id = player_id.trim();
    if id.is_empty() {
        return Err(StatsError::invalid("player id is required"));
    }
    Ok(id)
}

pub fn season_summary(
    source: &dyn GameSource,
    player_id: &str,
    year: i32,
) -> Result<Option<SeasonAverageRow>> {
    let id = checked_id(player_id)?;
    let games = source.games_for(&GameQuery {
        year,
        ..GameQuery::default()
    }
    .player(id))?;
    let refs: Vec<&GameStatLine> = games.iter().collect();
    Ok(aggregation::average_games(id, &refs))
}

/// Averages over the `PAST_SEASONS` years before `current_year`, pooled by game.
pub fn past_seasons_summary(
    source: &dyn GameSource,
    player_id: &str,
    current_year: i32,
) -> Result<Option<SeasonAverageRow>> {
    let id = checked_id(player_id)?;
    let mut games = Vec::new();
    for year in (current_year - PAST_SEASONS)..current_year {
        games.extend(source.games_for(&GameQuery {
            year,
            ..GameQuery::default()
        }
        .player(id))?);
    }
    let refs: Vec<&GameStatLine> = games.iter().collect();
    Ok(aggregation::average_games(id, &refs))
}

/// `Ok(None)` when the player has no games in `current_year`.
pub fn player_detail(
    source: &dyn GameSource,
    player_id: &str,
    current_year: i32,
) -> Result<Option<PlayerDetail>> {
    let Some(current) = season_summary(source, player_id, current_year)? else {
        debug!(player_id, current_year, "no games in current season");
        return Ok(None);
    };
    let past = past_seasons_summary(source, player_id, current_year)?;
    let trends = match &past {
        Some(past) => trend::annotate(past, &current, &TrendRule::stable_band()),
        None => TrendAnnotation::neutral(),
    };
    Ok(Some(PlayerDetail {
        player_id: current.player_id.clone(),
        year: current_year,
        current,
        past,
        trends,
    }))
}
