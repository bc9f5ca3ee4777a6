use std::collections::BTreeSet;

use crate::aggregation::Metric;
use crate::directory::PositionBucket;
use crate::pipeline::RankedPlayerRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Power,
    Minutes,
    Points,
    FieldGoalPct,
    Assists,
    Steals,
    Blocks,
    Turnovers,
}

impl SortKey {
    pub const ALL: [SortKey; 8] = [
        SortKey::Power,
        SortKey::Minutes,
        SortKey::Points,
        SortKey::FieldGoalPct,
        SortKey::Assists,
        SortKey::Steals,
        SortKey::Blocks,
        SortKey::Turnovers,
    ];

    pub fn metric(self) -> Option<Metric> {
        match self {
            SortKey::Power => None,
            SortKey::Minutes => Some(Metric::Minutes),
            SortKey::Points => Some(Metric::Points),
            SortKey::FieldGoalPct => Some(Metric::FieldGoalPct),
            SortKey::Assists => Some(Metric::Assists),
            SortKey::Steals => Some(Metric::Steals),
            SortKey::Blocks => Some(Metric::Blocks),
            SortKey::Turnovers => Some(Metric::Turnovers),
        }
    }

    pub fn label(self) -> &'static str {
        match self.metric() {
            Some(metric) => metric.label(),
            None => "Power",
        }
    }

    pub fn value(self, row: &RankedPlayerRow) -> f64 {
        match self.metric() {
            Some(metric) => row.metric(metric),
            None => row.power,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "power" => Some(SortKey::Power),
            "mp" => Some(SortKey::Minutes),
            "pts" => Some(SortKey::Points),
            "fgpct" | "fg%" => Some(SortKey::FieldGoalPct),
            "ast" => Some(SortKey::Assists),
            "stl" => Some(SortKey::Steals),
            "blk" => Some(SortKey::Blocks),
            "tov" => Some(SortKey::Turnovers),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn flipped(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDir::Asc => "▲",
            SortDir::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowLimit {
    Ten,
    #[default]
    Fifteen,
    TwentyFive,
    Fifty,
}

impl RowLimit {
    pub const ALL: [RowLimit; 4] = [
        RowLimit::Ten,
        RowLimit::Fifteen,
        RowLimit::TwentyFive,
        RowLimit::Fifty,
    ];

    pub fn count(self) -> usize {
        match self {
            RowLimit::Ten => 10,
            RowLimit::Fifteen => 15,
            RowLimit::TwentyFive => 25,
            RowLimit::Fifty => 50,
        }
    }

    pub fn from_count(n: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.count() == n)
    }

    pub fn next(self) -> Self {
        match self {
            RowLimit::Ten => RowLimit::Fifteen,
            RowLimit::Fifteen => RowLimit::TwentyFive,
            RowLimit::TwentyFive => RowLimit::Fifty,
            RowLimit::Fifty => RowLimit::Ten,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionFilter {
    /// Hybrid codes match every bucket they belong to.
    Bucket(PositionBucket),
    /// Matches the code itself or any hyphen-separated part of it.
    Code(String),
}

impl PositionFilter {
    pub fn code(raw: &str) -> Self {
        PositionFilter::Code(raw.trim().to_ascii_uppercase())
    }

    pub fn matches(&self, row: &RankedPlayerRow) -> bool {
        match self {
            PositionFilter::Bucket(bucket) => row.buckets.contains(*bucket),
            PositionFilter::Code(code) => {
                let value = row.position.as_deref().unwrap_or_default().to_ascii_uppercase();
                value == *code || value.split('-').any(|part| part == code)
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            PositionFilter::Bucket(bucket) => bucket.label().to_string(),
            PositionFilter::Code(code) => code.clone(),
        }
    }
}

/// Sort, filter and page state for the rankings table. Operates on rows the
/// pipeline has already ranked; never touches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub sort_key: SortKey,
    pub sort_dir: SortDir,
    pub limit: RowLimit,
    team: Option<String>,
    position: Option<PositionFilter>,
}

impl Default for TableView {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Power,
            sort_dir: SortDir::Desc,
            limit: RowLimit::default(),
            team: None,
            position: None,
        }
    }
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clicking the active column flips direction; any other column starts
    /// descending.
    pub fn on_header(&mut self, key: SortKey) {
        if key == self.sort_key {
            self.sort_dir = self.sort_dir.flipped();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Desc;
        }
    }

    pub fn team(&self) -> Option<&str> {
        self.team.as_deref()
    }

    pub fn set_team(&mut self, team: Option<&str>) {
        self.team = team
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty());
    }

    pub fn position(&self) -> Option<&PositionFilter> {
        self.position.as_ref()
    }

    pub fn set_position(&mut self, filter: Option<PositionFilter>) {
        self.position = filter;
    }

    pub fn matches(&self, row: &RankedPlayerRow) -> bool {
        let team_ok = match &self.team {
            Some(team) => row.team.eq_ignore_ascii_case(team),
            None => true,
        };
        let pos_ok = self.position.as_ref().is_none_or(|f| f.matches(row));
        team_ok && pos_ok
    }

    pub fn sorted_rows<'a>(&self, rows: &'a [RankedPlayerRow]) -> Vec<&'a RankedPlayerRow> {
        let mut out: Vec<&RankedPlayerRow> = rows.iter().filter(|r| self.matches(r)).collect();
        let key = self.sort_key;
        // Stable: equal values keep power-rank order.
        out.sort_by(|a, b| {
            let ord = key.value(a).total_cmp(&key.value(b));
            match self.sort_dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });
        out
    }

    pub fn visible_rows<'a>(&self, rows: &'a [RankedPlayerRow]) -> Vec<&'a RankedPlayerRow> {
        let mut out = self.sorted_rows(rows);
        out.truncate(self.limit.count());
        out
    }

    pub fn header_label(&self, key: SortKey) -> String {
        if key == self.sort_key {
            format!("{} {}", key.label(), self.sort_dir.arrow())
        } else {
            key.label().to_string()
        }
    }
}

pub fn team_options(rows: &[RankedPlayerRow]) -> Vec<String> {
    let set: BTreeSet<String> = rows
        .iter()
        .filter(|r| !r.team.is_empty())
        .map(|r| r.team.to_ascii_uppercase())
        .collect();
    set.into_iter().collect()
}

pub fn position_options(rows: &[RankedPlayerRow]) -> Vec<String> {
    let set: BTreeSet<String> = rows
        .iter()
        .filter_map(|r| r.position.as_deref())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_ascii_uppercase())
        .collect();
    set.into_iter().collect()
}

/// Next entry after `current` in `options`, wrapping through "all" (`None`).
pub fn cycle_option(options: &[String], current: Option<&str>) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(cur) => {
            let idx = options.iter().position(|o| o == cur)?;
            options.get(idx + 1).cloned()
        }
    }
}
