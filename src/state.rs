use std::collections::VecDeque;

use crate::directory::{PlayerDirectory, PositionBucket};
use crate::error::StatsError;
use crate::game_store::{GameStatLine, SeasonScope};
use crate::pipeline::{self, PipelineOptions, RankedPlayerRow};
use crate::player_detail::PlayerDetail;
use crate::power_rank::PowerPreset;
use crate::table::{self, PositionFilter, SortKey, TableView};
use crate::team_summary::TeamSeasonSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Rankings,
    Teams,
    Player { player_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready,
    Empty,
    Failed(String),
}

/// Everything the dashboard draws. Holds the scope's raw games so a preset
/// switch can re-rank without another query.
pub struct AppState {
    pub screen: Screen,
    pub status: LoadStatus,
    pub scope: Option<SeasonScope>,
    pub games: Vec<GameStatLine>,
    pub directory: PlayerDirectory,
    pub options: PipelineOptions,
    pub preset: PowerPreset,
    pub rows: Vec<RankedPlayerRow>,
    pub view: TableView,
    pub selected: usize,
    pub teams: Vec<TeamSeasonSummary>,
    pub team_scroll: usize,
    pub detail: Option<PlayerDetail>,
    pub recent_games: Vec<GameStatLine>,
    pub detail_error: Option<String>,
    pub search: Option<String>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(options: PipelineOptions, preset: PowerPreset) -> Self {
        Self {
            screen: Screen::Rankings,
            status: LoadStatus::Loading,
            scope: None,
            games: Vec::new(),
            directory: PlayerDirectory::default(),
            options,
            preset,
            rows: Vec::new(),
            view: TableView::new(),
            selected: 0,
            teams: Vec::new(),
            team_scroll: 0,
            detail: None,
            recent_games: Vec::new(),
            detail_error: None,
            search: None,
            help_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn load_scope(
        &mut self,
        scope: SeasonScope,
        games: Vec<GameStatLine>,
        directory: PlayerDirectory,
    ) {
        self.scope = Some(scope);
        self.games = games;
        self.directory = directory;
        self.rerank();
    }

    pub fn load_failed(&mut self, err: &StatsError) {
        self.status = LoadStatus::Failed(err.to_string());
        self.rows.clear();
        self.push_log(format!("[WARN] {err}"));
    }

    pub fn load_empty(&mut self) {
        self.status = LoadStatus::Empty;
        self.rows.clear();
    }

    pub fn rerank(&mut self) {
        self.options.formula = self.preset.formula();
        self.rows = pipeline::rank_games(&self.games, &self.directory, &self.options);
        self.status = if self.rows.is_empty() {
            LoadStatus::Empty
        } else {
            LoadStatus::Ready
        };
        self.clamp_selection();
    }

    pub fn cycle_preset(&mut self) {
        self.preset = self.preset.next();
        self.rerank();
        self.push_log(format!("[INFO] Power preset: {}", self.preset.label()));
    }

    pub fn visible_rows(&self) -> Vec<&RankedPlayerRow> {
        self.view.visible_rows(&self.rows)
    }

    pub fn selected_row(&self) -> Option<&RankedPlayerRow> {
        self.visible_rows().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.visible_rows().len();
        if total > 0 && self.selected + 1 < total {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let total = self.visible_rows().len();
        if self.selected >= total {
            self.selected = total.saturating_sub(1);
        }
    }

    pub fn on_header(&mut self, key: SortKey) {
        self.view.on_header(key);
        self.selected = 0;
    }

    pub fn cycle_limit(&mut self) {
        self.view.limit = self.view.limit.next();
        self.clamp_selection();
    }

    pub fn cycle_team(&mut self) {
        let options = table::team_options(&self.rows);
        let next = table::cycle_option(&options, self.view.team());
        self.view.set_team(next.as_deref());
        self.selected = 0;
    }

    /// All → Centers → Forwards → Guards → each raw code → All.
    pub fn cycle_position(&mut self) {
        let codes = table::position_options(&self.rows);
        let next = match self.view.position() {
            None => Some(PositionFilter::Bucket(PositionBucket::Centers)),
            Some(PositionFilter::Bucket(PositionBucket::Centers)) => {
                Some(PositionFilter::Bucket(PositionBucket::Forwards))
            }
            Some(PositionFilter::Bucket(PositionBucket::Forwards)) => {
                Some(PositionFilter::Bucket(PositionBucket::Guards))
            }
            Some(PositionFilter::Bucket(_)) => codes.first().map(|c| PositionFilter::code(c)),
            Some(PositionFilter::Code(code)) => {
                table::cycle_option(&codes, Some(code)).map(|c| PositionFilter::code(&c))
            }
        };
        self.view.set_position(next);
        self.selected = 0;
    }

    pub fn status_message(&self) -> Option<String> {
        match &self.status {
            LoadStatus::Loading => Some("Loading…".to_string()),
            LoadStatus::Empty => Some("No players found".to_string()),
            LoadStatus::Failed(msg) => Some(format!("Something went wrong: {msg}")),
            LoadStatus::Ready if self.visible_rows().is_empty() => {
                Some("No players found".to_string())
            }
            LoadStatus::Ready => None,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}
