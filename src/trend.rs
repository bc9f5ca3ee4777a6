use serde::{Deserialize, Serialize};

use crate::aggregation::{Metric, SeasonAverageRow, TrailingWindowRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

impl Trend {
    pub fn arrow(self) -> &'static str {
        match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Neutral => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    /// A delta exactly at the threshold counts as a move.
    Inclusive,
    /// A delta exactly at the threshold is still neutral.
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRule {
    pub threshold: f64,
    pub boundary: Boundary,
}

impl TrendRule {
    pub fn inclusive(threshold: f64) -> Self {
        Self {
            threshold,
            boundary: Boundary::Inclusive,
        }
    }

    /// Last-K games against the season: ±10%, boundary counts.
    pub fn recent_form() -> Self {
        Self::inclusive(0.10)
    }

    /// Current season against prior seasons: moves beyond ±5%.
    pub fn stable_band() -> Self {
        Self {
            threshold: 0.05,
            boundary: Boundary::Exclusive,
        }
    }

    pub fn classify(&self, reference: f64, current: f64) -> Trend {
        if reference == 0.0 || !reference.is_finite() || !current.is_finite() {
            return Trend::Neutral;
        }
        let delta = (current - reference) / reference;
        let moved = |d: f64| match self.boundary {
            Boundary::Inclusive => d >= self.threshold,
            Boundary::Exclusive => d > self.threshold,
        };
        if moved(delta) {
            Trend::Up
        } else if moved(-delta) {
            Trend::Down
        } else {
            Trend::Neutral
        }
    }
}

impl Default for TrendRule {
    fn default() -> Self {
        Self::recent_form()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendAnnotation {
    pub minutes: Trend,
    pub points: Trend,
    pub fg_pct: Trend,
    pub trb: Trend,
    pub ast: Trend,
    pub stl: Trend,
    pub blk: Trend,
    pub tov: Trend,
}

impl TrendAnnotation {
    pub fn neutral() -> Self {
        Self {
            minutes: Trend::Neutral,
            points: Trend::Neutral,
            fg_pct: Trend::Neutral,
            trb: Trend::Neutral,
            ast: Trend::Neutral,
            stl: Trend::Neutral,
            blk: Trend::Neutral,
            tov: Trend::Neutral,
        }
    }

    pub fn get(&self, metric: Metric) -> Trend {
        match metric {
            Metric::Minutes => self.minutes,
            Metric::Points => self.points,
            Metric::FieldGoalPct => self.fg_pct,
            Metric::Rebounds => self.trb,
            Metric::Assists => self.ast,
            Metric::Steals => self.stl,
            Metric::Blocks => self.blk,
            Metric::Turnovers => self.tov,
        }
    }

    fn set(&mut self, metric: Metric, trend: Trend) {
        let slot = match metric {
            Metric::Minutes => &mut self.minutes,
            Metric::Points => &mut self.points,
            Metric::FieldGoalPct => &mut self.fg_pct,
            Metric::Rebounds => &mut self.trb,
            Metric::Assists => &mut self.ast,
            Metric::Steals => &mut self.stl,
            Metric::Blocks => &mut self.blk,
            Metric::Turnovers => &mut self.tov,
        };
        *slot = trend;
    }
}

pub fn annotate(
    season: &SeasonAverageRow,
    trailing: &TrailingWindowRow,
    rule: &TrendRule,
) -> TrendAnnotation {
    let mut out = TrendAnnotation::neutral();
    for metric in Metric::ALL {
        out.set(
            metric,
            rule.classify(metric.value(season), metric.value(trailing)),
        );
    }
    out
}

/// Colour for a trend arrow: an upward move in a lower-is-better metric reads
/// as bad news.
pub fn trend_tone(trend: Trend, metric: Metric) -> Tone {
    let good = match trend {
        Trend::Neutral => return Tone::Plain,
        Trend::Up => metric.higher_is_better(),
        Trend::Down => !metric.higher_is_better(),
    };
    if good { Tone::Positive } else { Tone::Negative }
}
