use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::game_store::{GameStatLine, parse_game_date};

// Column positions in a per-player game log export.
const COL_DATE: usize = 1;
const COL_TEAM: usize = 3;
const COL_MP: usize = 8;
const COL_FG: usize = 9;
const COL_FGA: usize = 10;
const COL_FT: usize = 15;
const COL_FTA: usize = 16;
const COL_ORB: usize = 18;
const COL_DRB: usize = 19;
const COL_TRB: usize = 20;
const COL_AST: usize = 21;
const COL_STL: usize = 22;
const COL_BLK: usize = 23;
const COL_TOV: usize = 24;
const COL_PTS: usize = 26;
const COL_SEASON_TYPE: usize = 28;

/// `<playerId>_game_log_<year>.csv` → (player id, year).
pub fn parse_log_file_name(path: &Path) -> Option<(String, i32)> {
    let stem = path.file_stem()?.to_str()?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 4 || parts[0].is_empty() {
        return None;
    }
    let year = parts[3].trim().parse::<i32>().ok()?;
    Some((parts[0].to_string(), year))
}

/// `MM:SS` or a plain number; anything else reads as zero.
pub fn parse_minutes(raw: &str) -> f64 {
    let raw = raw.trim();
    if let Some((mins, secs)) = raw.split_once(':') {
        let mins = mins.parse::<f64>().unwrap_or(0.0);
        let secs = secs.parse::<f64>().unwrap_or(0.0);
        return mins + secs / 60.0;
    }
    raw.parse::<f64>().unwrap_or(0.0)
}

fn count(record: &csv::StringRecord, idx: usize) -> u32 {
    record
        .get(idx)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0)
}

/// Reads one game log. Rows without a parseable date (repeated headers,
/// "Did Not Play" notes) are skipped.
pub fn read_game_log(path: &Path) -> Result<Vec<GameStatLine>> {
    let Some((player_id, year)) = parse_log_file_name(path) else {
        bail!(
            "invalid file name {}: expected <playerId>_game_log_<year>.csv",
            path.display()
        );
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open game log {}", path.display()))?;

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record.with_context(|| format!("read row in {}", path.display()))?;
        let Some(game_date) = record.get(COL_DATE).and_then(parse_game_date) else {
            skipped += 1;
            continue;
        };
        let season_type = record.get(COL_SEASON_TYPE).unwrap_or_default().to_string();
        out.push(GameStatLine {
            team: record.get(COL_TEAM).unwrap_or_default().to_ascii_uppercase(),
            minutes: parse_minutes(record.get(COL_MP).unwrap_or_default()),
            fg: count(&record, COL_FG),
            fga: count(&record, COL_FGA),
            ft: count(&record, COL_FT),
            fta: count(&record, COL_FTA),
            orb: count(&record, COL_ORB),
            drb: count(&record, COL_DRB),
            trb: count(&record, COL_TRB),
            ast: count(&record, COL_AST),
            stl: count(&record, COL_STL),
            blk: count(&record, COL_BLK),
            tov: count(&record, COL_TOV),
            points: count(&record, COL_PTS),
            ..GameStatLine::blank(player_id.as_str(), year, season_type, game_date)
        });
    }
    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped rows without a date");
    }
    Ok(out)
}

pub fn collect_log_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if !meta.is_dir() {
        if !is_csv(path) {
            bail!("{} is not a CSV file", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("read dir {}", path.display()))? {
        let entry = entry.context("read dir entry")?;
        let file = entry.path();
        if file.is_file() && is_csv(&file) {
            files.push(file);
        } else {
            warn!("skipping {}", file.display());
        }
    }
    files.sort();
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_carries_player_and_year() {
        assert_eq!(
            parse_log_file_name(Path::new("Data/wilsoa01w_game_log_2024.csv")),
            Some(("wilsoa01w".to_string(), 2024))
        );
        assert_eq!(parse_log_file_name(Path::new("wilsoa01w_2024.csv")), None);
        assert_eq!(parse_log_file_name(Path::new("x_game_log_year.csv")), None);
    }

    #[test]
    fn minutes_accept_clock_format() {
        assert_eq!(parse_minutes("32:30"), 32.5);
        assert_eq!(parse_minutes("28"), 28.0);
        assert_eq!(parse_minutes("Inactive"), 0.0);
    }
}
