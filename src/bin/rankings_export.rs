use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use statfluence::config::{self, DashboardConfig};
use statfluence::directory::PlayerDirectory;
use statfluence::export;
use statfluence::game_store::{GameSource, SqliteGameStore};
use statfluence::pipeline::{self, PipelineOptions};
use statfluence::power_rank::PowerPreset;
use statfluence::team_summary::{self, TeamFilter};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut cfg = DashboardConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if let Some(raw) = arg_value(&args, "--preset") {
        cfg.power_preset =
            PowerPreset::parse(&raw).ok_or_else(|| anyhow!("unknown preset {raw:?}"))?;
    }
    let out = arg_value(&args, "--out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("rankings.xlsx"));
    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or(cfg.db_path.clone())
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;

    let store = SqliteGameStore::open(&db_path)?.with_timeout(cfg.query_timeout);
    let opts = PipelineOptions::from(&cfg);

    // The roster file is per season, so the scope is needed before the directory.
    let year = store
        .distinct_years()?
        .first()
        .copied()
        .ok_or_else(|| anyhow!("no games in {}", db_path.display()))?;
    let roster = cfg.roster_path(year);
    let directory =
        PlayerDirectory::load(&cfg.name_map_path, roster.exists().then_some(roster.as_path()));

    let Some(rankings) = pipeline::current_rankings(&store, &directory, &opts)? else {
        println!("No players found");
        return Ok(());
    };
    let teams = team_summary::team_summary(
        &store,
        &TeamFilter {
            year: Some(rankings.scope.year),
            ..TeamFilter::default()
        },
    )?;

    let report = export::export_rankings(&out, &rankings, &teams)?;
    println!("Scope: {}", rankings.scope.label());
    println!("Preset: {}", cfg.power_preset.label());
    println!(
        "Wrote {} players and {} team rows to {}",
        report.players,
        report.teams,
        out.display()
    );
    for row in rankings.rows.iter().take(10) {
        println!("{:>3}. {:<28} {:>7.2}", row.rank, row.name, row.power);
    }
    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn db_override_accepts_both_spellings() {
        let spaced = args(&["--preset", "blend", "--db", "/tmp/games.sqlite"]);
        assert_eq!(arg_value(&spaced, "--db").as_deref(), Some("/tmp/games.sqlite"));
        let joined = args(&["--db=/data/wnba.sqlite", "--out", "r.json"]);
        assert_eq!(arg_value(&joined, "--db").as_deref(), Some("/data/wnba.sqlite"));
        assert_eq!(arg_value(&args(&["--db", " "]), "--db"), None);
        assert_eq!(arg_value(&args(&["--out", "r.xlsx"]), "--db"), None);
    }
}
