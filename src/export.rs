use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::aggregation::Metric;
use crate::game_store::SeasonScope;
use crate::pipeline::{RankedPlayerRow, Rankings};
use crate::team_summary::TeamSeasonSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub players: usize,
    pub teams: usize,
}

pub fn export_rankings(
    path: &Path,
    rankings: &Rankings,
    teams: &[TeamSeasonSummary],
) -> Result<ExportReport> {
    let Some(format) = ExportFormat::from_path(path) else {
        bail!("unsupported export extension: {}", path.display());
    };
    match format {
        ExportFormat::Xlsx => write_xlsx(path, rankings, teams)?,
        ExportFormat::Json => write_json(path, rankings, teams)?,
    }
    Ok(ExportReport {
        players: rankings.rows.len(),
        teams: teams.len(),
    })
}

#[derive(Serialize)]
struct JsonExport<'a> {
    scope: &'a SeasonScope,
    players: &'a [RankedPlayerRow],
    teams: &'a [TeamSeasonSummary],
}

fn write_json(path: &Path, rankings: &Rankings, teams: &[TeamSeasonSummary]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let payload = JsonExport {
        scope: &rankings.scope,
        players: &rankings.rows,
        teams,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &payload).context("write json export")?;
    Ok(())
}

fn write_xlsx(path: &Path, rankings: &Rankings, teams: &[TeamSeasonSummary]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Rankings")?;
        write_rows(sheet, &ranking_rows(rankings))?;
    }
    if !teams.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Teams")?;
        write_rows(sheet, &team_rows(teams))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(())
}

fn ranking_rows(rankings: &Rankings) -> Vec<Vec<String>> {
    let mut header = vec![
        "Rank".to_string(),
        "Player ID".to_string(),
        "Player".to_string(),
        "Pos".to_string(),
        "Team".to_string(),
        "Games".to_string(),
        "Power".to_string(),
    ];
    for metric in Metric::ALL {
        header.push(metric.label().to_string());
        header.push(format!("{} L5", metric.label()));
        header.push(format!("{} trend", metric.label()));
    }

    let mut rows = vec![header];
    rows.extend(rankings.rows.iter().map(ranking_row));
    rows
}

fn ranking_row(row: &RankedPlayerRow) -> Vec<String> {
    let mut out = vec![
        row.rank.to_string(),
        row.player_id.clone(),
        row.name.clone(),
        row.position.clone().unwrap_or_default(),
        row.team.clone(),
        row.season.games.to_string(),
        format!("{:.2}", row.power),
    ];
    for metric in Metric::ALL {
        out.push(format_metric(metric, metric.value(&row.season)));
        out.push(format_metric(metric, metric.value(&row.trailing)));
        out.push(row.trend(metric).arrow().to_string());
    }
    out
}

fn team_rows(teams: &[TeamSeasonSummary]) -> Vec<Vec<String>> {
    let mut rows = vec![
        [
            "Team", "Year", "Season Type", "PTS", "REB", "AST", "STL", "BLK", "TOV", "FGM",
            "FGA", "FTM", "FTA", "FG%", "FT%", "TS%",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    ];
    rows.extend(teams.iter().map(|t| {
        vec![
            t.team.clone(),
            t.year.to_string(),
            t.season_type.clone(),
            t.pts.to_string(),
            t.reb.to_string(),
            t.ast.to_string(),
            t.stl.to_string(),
            t.blk.to_string(),
            t.tov.to_string(),
            t.fgm.to_string(),
            t.fga.to_string(),
            t.ftm.to_string(),
            t.fta.to_string(),
            format!("{:.3}", t.fg_pct),
            format!("{:.3}", t.ft_pct),
            format!("{:.3}", t.ts_pct),
        ]
    }));
    rows
}

pub fn format_metric(metric: Metric, value: f64) -> String {
    match metric {
        Metric::FieldGoalPct => format!("{:.1}%", value * 100.0),
        _ => format!("{value:.1}"),
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/rank.XLSX")),
            Some(ExportFormat::Xlsx)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("rank.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(ExportFormat::from_path(Path::new("rank.csv")), None);
    }

    #[test]
    fn fg_pct_renders_as_percent() {
        assert_eq!(format_metric(Metric::FieldGoalPct, 0.4567), "45.7%");
        assert_eq!(format_metric(Metric::Points, 18.26), "18.3");
    }
}
