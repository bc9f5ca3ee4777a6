use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::aggregation::{PlayerAggregate, SeasonAverageRow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatWeights {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub steals: f64,
    pub blocks: f64,
    /// Signed: a penalty is a negative weight.
    pub turnovers: f64,
}

impl StatWeights {
    pub fn apply(&self, row: &SeasonAverageRow) -> f64 {
        self.points * row.points
            + self.rebounds * row.trb
            + self.assists * row.ast
            + self.steals * row.stl
            + self.blocks * row.blk
            + self.turnovers * row.tov
    }
}

/// `score = season_share * w·season + trailing_share * w·trailing`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerFormula {
    pub weights: StatWeights,
    pub season_share: f64,
    pub trailing_share: f64,
}

impl PowerFormula {
    pub fn score(&self, agg: &PlayerAggregate) -> f64 {
        let mut score = self.season_share * self.weights.apply(&agg.season);
        if self.trailing_share != 0.0 {
            score += self.trailing_share * self.weights.apply(&agg.trailing);
        }
        if score.is_nan() { f64::NEG_INFINITY } else { score }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerPreset {
    /// Season box score with a turnover penalty.
    Simple,
    /// Rebound/assist/steal/block rates scaled toward points, blended 75/25
    /// with the trailing window. Carries no turnover term.
    ProductionBlend,
}

impl PowerPreset {
    pub const ALL: [PowerPreset; 2] = [PowerPreset::Simple, PowerPreset::ProductionBlend];

    pub fn formula(self) -> PowerFormula {
        match self {
            PowerPreset::Simple => PowerFormula {
                weights: StatWeights {
                    points: 1.0,
                    rebounds: 0.0,
                    assists: 1.1,
                    steals: 1.2,
                    blocks: 1.0,
                    turnovers: -1.3,
                },
                season_share: 1.0,
                trailing_share: 0.0,
            },
            PowerPreset::ProductionBlend => PowerFormula {
                weights: StatWeights {
                    points: 1.0,
                    rebounds: 10.0 / 12.5,
                    assists: 10.0 / 6.5,
                    steals: 10.0 / 3.0,
                    blocks: 10.0 / 3.0,
                    turnovers: 0.0,
                },
                season_share: 0.75,
                trailing_share: 0.25,
            },
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "simple" | "a" => Some(PowerPreset::Simple),
            "blend" | "production" | "production_blend" | "b" => {
                Some(PowerPreset::ProductionBlend)
            }
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PowerPreset::Simple => "simple",
            PowerPreset::ProductionBlend => "blend",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PowerPreset::Simple => PowerPreset::ProductionBlend,
            PowerPreset::ProductionBlend => PowerPreset::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerScore {
    pub player_id: String,
    pub score: f64,
    /// 1-based; 1 is the highest score.
    pub rank: usize,
}

/// Score descending, then player id ascending so equal scores rank stably.
pub fn power_order(a_score: f64, a_id: &str, b_score: f64, b_id: &str) -> Ordering {
    b_score.total_cmp(&a_score).then_with(|| a_id.cmp(b_id))
}

pub fn rank_players(formula: &PowerFormula, players: &[PlayerAggregate]) -> Vec<PowerScore> {
    let mut scored: Vec<PowerScore> = players
        .iter()
        .map(|agg| PowerScore {
            player_id: agg.season.player_id.clone(),
            score: formula.score(agg),
            rank: 0,
        })
        .collect();
    scored.sort_by(|a, b| power_order(a.score, &a.player_id, b.score, &b.player_id));
    for (idx, row) in scored.iter_mut().enumerate() {
        row.rank = idx + 1;
    }
    scored
}
