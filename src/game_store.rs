use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, params, params_from_iter};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DEFAULT_QUERY_TIMEOUT_MS;
use crate::error::{DataContext, Result, StatsError};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 1000;

const PROGRESS_OPS: i32 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatLine {
    pub player_id: String,
    pub year: i32,
    pub season_type: String,
    pub game_date: NaiveDate,
    pub team: String,
    pub minutes: f64,
    pub points: u32,
    pub fg: u32,
    pub fga: u32,
    pub ft: u32,
    pub fta: u32,
    pub orb: u32,
    pub drb: u32,
    pub trb: u32,
    pub ast: u32,
    pub stl: u32,
    pub blk: u32,
    pub tov: u32,
}

impl GameStatLine {
    pub fn blank(
        player_id: impl Into<String>,
        year: i32,
        season_type: impl Into<String>,
        game_date: NaiveDate,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            year,
            season_type: season_type.into(),
            game_date,
            team: String::new(),
            minutes: 0.0,
            points: 0,
            fg: 0,
            fga: 0,
            ft: 0,
            fta: 0,
            orb: 0,
            drb: 0,
            trb: 0,
            ast: 0,
            stl: 0,
            blk: 0,
            tov: 0,
        }
    }
}

/// A (year, season type) pair. `season_type: None` means every type in the year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonScope {
    pub year: i32,
    pub season_type: Option<String>,
}

impl SeasonScope {
    pub fn new(year: i32, season_type: Option<&str>) -> Self {
        Self {
            year,
            season_type: season_type.map(|s| s.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match self.season_type.as_deref() {
            Some(kind) => format!("{} {kind}", self.year),
            None => self.year.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameQuery {
    pub year: i32,
    pub season_type: Option<String>,
    pub player_id: Option<String>,
    pub team: Option<String>,
}

impl GameQuery {
    pub fn for_scope(scope: &SeasonScope) -> Self {
        Self {
            year: scope.year,
            season_type: scope.season_type.clone(),
            ..Self::default()
        }
    }

    pub fn player(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }
}

/// Read-only access to per-game rows. Empty results are never errors.
pub trait GameSource: Send + Sync {
    fn distinct_years(&self) -> Result<Vec<i32>>;

    fn distinct_season_types(&self, year: Option<i32>) -> Result<Vec<String>>;

    /// Unordered rows matching every set filter.
    fn games_for(&self, query: &GameQuery) -> Result<Vec<GameStatLine>>;

    fn distinct_player_ids(&self) -> Result<Vec<String>>;
}

pub struct SqliteGameStore {
    conn: Mutex<Connection>,
    timeout: Duration,
}

impl SqliteGameStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .data_context(format!("create db directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .data_context(format!("open sqlite db {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().data_context("open in-memory sqlite db")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
            timeout: Duration::ZERO,
        };
        Ok(store.with_timeout(Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        if let Ok(conn) = self.conn.get_mut() {
            if let Err(err) = conn.busy_timeout(timeout) {
                warn!("failed to set sqlite busy timeout: {err}");
            }
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `f` with a deadline armed on the connection. SQLite polls the
    /// progress handler every few VM ops and aborts once the deadline passes.
    fn run<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let deadline = Instant::now() + self.timeout;
        conn.progress_handler(PROGRESS_OPS, Some(move || Instant::now() >= deadline));
        let out = f(&conn);
        conn.progress_handler(0, None::<fn() -> bool>);
        out.map_err(|err| self.classify(err))
    }

    fn classify(&self, err: StatsError) -> StatsError {
        match err {
            StatsError::DataSource {
                source: rusqlite::Error::SqliteFailure(ref inner, _),
                ..
            } if inner.code == ErrorCode::OperationInterrupted => StatsError::Timeout(self.timeout),
            other => other,
        }
    }

    pub fn player_games_page(
        &self,
        player_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<GameStatLine>> {
        let player_id = require_player_id(player_id)?;
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(StatsError::invalid(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}, got {limit}"
            )));
        }
        let offset = offset.unwrap_or(0);
        self.run(|conn| {
            let sql = format!(
                "{SELECT_GAMES} WHERE player_id = ?1 ORDER BY date DESC, id DESC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&sql).data_context("prepare player page query")?;
            let rows = stmt
                .query_map(params![player_id, limit as i64, offset as i64], read_raw_row)
                .data_context("query player page")?;
            decode_rows(rows)
        })
    }

    pub fn insert_games(&self, lines: &[GameStatLine]) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let tx = conn.transaction().data_context("begin insert transaction")?;
        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO player_stats (
                        player_id, year, season_type, date, tm, mp,
                        fg, fga, ft, fta, orb, drb, trb, ast, stl, blk, tov, pts
                    ) VALUES (
                        ?1, ?2, ?3, ?4, ?5, ?6,
                        ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
                    )
                    "#,
                )
                .data_context("prepare insert")?;
            for line in lines {
                stmt.execute(params![
                    line.player_id,
                    line.year,
                    line.season_type,
                    line.game_date.format("%Y-%m-%d").to_string(),
                    line.team,
                    line.minutes,
                    line.fg,
                    line.fga,
                    line.ft,
                    line.fta,
                    line.orb,
                    line.drb,
                    line.trb,
                    line.ast,
                    line.stl,
                    line.blk,
                    line.tov,
                    line.points,
                ])
                .data_context("insert game row")?;
            }
        }
        tx.commit().data_context("commit insert transaction")?;
        Ok(lines.len())
    }

    pub fn delete_year(&self, year: i32) -> Result<usize> {
        self.run(|conn| {
            conn.execute("DELETE FROM player_stats WHERE year = ?1", params![year])
                .data_context("delete year")
        })
    }

    pub fn delete_player_year(&self, player_id: &str, year: i32) -> Result<usize> {
        let player_id = require_player_id(player_id)?;
        self.run(|conn| {
            conn.execute(
                "DELETE FROM player_stats WHERE player_id = ?1 AND year = ?2",
                params![player_id, year],
            )
            .data_context("delete player year")
        })
    }
}

impl GameSource for SqliteGameStore {
    fn distinct_years(&self) -> Result<Vec<i32>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare("SELECT DISTINCT year FROM player_stats WHERE year IS NOT NULL ORDER BY year DESC")
                .data_context("prepare years query")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, i32>(0))
                .data_context("query years")?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .data_context("decode year")
        })
    }

    fn distinct_season_types(&self, year: Option<i32>) -> Result<Vec<String>> {
        self.run(|conn| {
            let mut sql = String::from(
                "SELECT DISTINCT season_type FROM player_stats WHERE season_type IS NOT NULL AND season_type <> ''",
            );
            let mut args: Vec<Value> = Vec::new();
            if let Some(year) = year {
                sql.push_str(" AND year = ?1");
                args.push(Value::Integer(year as i64));
            }
            sql.push_str(" ORDER BY season_type");
            let mut stmt = conn.prepare(&sql).data_context("prepare season types query")?;
            let rows = stmt
                .query_map(params_from_iter(args), |row| row.get::<_, String>(0))
                .data_context("query season types")?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .data_context("decode season type")
        })
    }

    fn games_for(&self, query: &GameQuery) -> Result<Vec<GameStatLine>> {
        let mut clauses = vec!["year = ?1".to_string()];
        let mut args = vec![Value::Integer(query.year as i64)];
        if let Some(kind) = query.season_type.as_deref() {
            args.push(Value::Text(kind.to_string()));
            clauses.push(format!("season_type = ?{}", args.len()));
        }
        if let Some(player_id) = query.player_id.as_deref() {
            args.push(Value::Text(require_player_id(player_id)?.to_string()));
            clauses.push(format!("player_id = ?{}", args.len()));
        }
        if let Some(team) = query.team.as_deref() {
            args.push(Value::Text(team.trim().to_ascii_uppercase()));
            clauses.push(format!("UPPER(tm) = ?{}", args.len()));
        }
        let sql = format!("{SELECT_GAMES} WHERE {}", clauses.join(" AND "));
        debug!(year = query.year, season_type = ?query.season_type, "games_for");

        self.run(|conn| {
            let mut stmt = conn.prepare(&sql).data_context("prepare games query")?;
            let rows = stmt
                .query_map(params_from_iter(args), read_raw_row)
                .data_context("query games")?;
            decode_rows(rows)
        })
    }

    fn distinct_player_ids(&self) -> Result<Vec<String>> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT DISTINCT player_id FROM player_stats
                     WHERE player_id IS NOT NULL AND player_id <> ''
                     ORDER BY player_id",
                )
                .data_context("prepare player ids query")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .data_context("query player ids")?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .data_context("decode player id")
        })
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS player_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            player_id TEXT NULL,
            year INTEGER NULL,
            season_type TEXT NULL,
            date TEXT NULL,
            tm TEXT NULL,
            mp REAL NULL,
            fg INTEGER NULL,
            fga INTEGER NULL,
            ft INTEGER NULL,
            fta INTEGER NULL,
            orb INTEGER NULL,
            drb INTEGER NULL,
            trb INTEGER NULL,
            ast INTEGER NULL,
            stl INTEGER NULL,
            blk INTEGER NULL,
            tov INTEGER NULL,
            pts INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_player_stats_scope ON player_stats(year, season_type);
        CREATE INDEX IF NOT EXISTS idx_player_stats_player ON player_stats(player_id);
        "#,
    )
    .data_context("create sqlite schema")
}

/// Accepts `YYYY-MM-DD` (padding optional), `M/D/YYYY`, and RFC 3339 timestamps.
pub fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn require_player_id(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StatsError::invalid("player id is required"));
    }
    Ok(trimmed)
}

const SELECT_GAMES: &str = r#"
    SELECT player_id, year, season_type, date, tm, mp,
           fg, fga, ft, fta, orb, drb, trb, ast, stl, blk, tov, pts
    FROM player_stats
"#;

struct RawGameRow {
    player_id: Option<String>,
    year: Option<i32>,
    season_type: Option<String>,
    date: Option<String>,
    team: Option<String>,
    minutes: Option<f64>,
    counts: [Option<i64>; 12],
}

fn read_raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawGameRow> {
    let mut counts = [None; 12];
    for (idx, slot) in counts.iter_mut().enumerate() {
        *slot = row.get::<_, Option<i64>>(6 + idx)?;
    }
    Ok(RawGameRow {
        player_id: row.get(0)?,
        year: row.get(1)?,
        season_type: row.get(2)?,
        date: row.get(3)?,
        team: row.get(4)?,
        minutes: row.get(5)?,
        counts,
    })
}

impl TryFrom<RawGameRow> for GameStatLine {
    type Error = StatsError;

    fn try_from(raw: RawGameRow) -> Result<Self> {
        let player_id = raw
            .player_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(StatsError::Malformed {
                field: "player_id",
                detail: "missing".to_string(),
            })?;
        let year = raw.year.ok_or_else(|| StatsError::Malformed {
            field: "year",
            detail: format!("missing for player {player_id}"),
        })?;
        let date_raw = raw.date.unwrap_or_default();
        let game_date = parse_game_date(&date_raw).ok_or_else(|| StatsError::Malformed {
            field: "date",
            detail: format!("{date_raw:?} for player {player_id}"),
        })?;

        let mut counts = [0u32; 12];
        for (idx, value) in raw.counts.iter().enumerate() {
            let v = value.unwrap_or(0);
            counts[idx] = u32::try_from(v).map_err(|_| StatsError::Malformed {
                field: "counting stat",
                detail: format!("{v} for player {player_id} on {game_date}"),
            })?;
        }
        let [fg, fga, ft, fta, orb, drb, trb, ast, stl, blk, tov, points] = counts;

        Ok(GameStatLine {
            player_id,
            year,
            season_type: raw.season_type.unwrap_or_default(),
            game_date,
            team: raw.team.unwrap_or_default().trim().to_ascii_uppercase(),
            minutes: raw.minutes.unwrap_or(0.0).max(0.0),
            points,
            fg,
            fga,
            ft,
            fta,
            orb,
            drb,
            trb,
            ast,
            stl,
            blk,
            tov,
        })
    }
}

fn decode_rows(
    rows: impl Iterator<Item = rusqlite::Result<RawGameRow>>,
) -> Result<Vec<GameStatLine>> {
    let mut out = Vec::new();
    for row in rows {
        let raw = row.data_context("decode game row")?;
        out.push(GameStatLine::try_from(raw)?);
    }
    Ok(out)
}
