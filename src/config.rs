use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::power_rank::PowerPreset;
use crate::trend::TrendRule;

const APP_DIR: &str = "statfluence";
const DB_FILE: &str = "player_stats.sqlite";
const DEFAULT_DATA_DIR: &str = "Data";
const DEFAULT_NAME_MAP: &str = "wnba_player_ids_master.csv";

pub const DEFAULT_TRAILING_GAMES: usize = 5;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub db_path: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub name_map_path: PathBuf,
    pub trailing_games: usize,
    pub power_preset: PowerPreset,
    pub trend_rule: TrendRule,
    pub query_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        Self {
            db_path: default_db_path(),
            name_map_path: data_dir.join(DEFAULT_NAME_MAP),
            data_dir,
            trailing_games: DEFAULT_TRAILING_GAMES,
            power_preset: PowerPreset::Simple,
            trend_rule: TrendRule::recent_form(),
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Some(path) = env_path("STATFLUENCE_DB") {
            cfg.db_path = Some(path);
        }
        if let Some(dir) = env_path("STATFLUENCE_DATA_DIR") {
            cfg.name_map_path = dir.join(DEFAULT_NAME_MAP);
            cfg.data_dir = dir;
        }
        if let Some(path) = env_path("STATFLUENCE_NAME_MAP") {
            cfg.name_map_path = path;
        }
        cfg.trailing_games = env::var("STATFLUENCE_TRAILING_GAMES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TRAILING_GAMES)
            .max(1);
        if let Ok(raw) = env::var("STATFLUENCE_POWER_PRESET") {
            match PowerPreset::parse(&raw) {
                Some(preset) => cfg.power_preset = preset,
                None => tracing::warn!("unknown power preset {raw:?}, keeping {:?}", cfg.power_preset),
            }
        }
        if let Some(threshold) = env::var("STATFLUENCE_TREND_THRESHOLD")
            .ok()
            .and_then(|val| val.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
        {
            cfg.trend_rule = TrendRule::inclusive(threshold);
        }
        let timeout_ms = env::var("STATFLUENCE_QUERY_TIMEOUT_MS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_QUERY_TIMEOUT_MS)
            .max(100);
        cfg.query_timeout = Duration::from_millis(timeout_ms);
        cfg
    }

    /// Roster table for one season: `<data_dir>/rosters/<year>_per_game.csv`.
    pub fn roster_path(&self, year: i32) -> PathBuf {
        self.data_dir
            .join("rosters")
            .join(format!("{year}_per_game.csv"))
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
