use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

use statfluence::config::{self, DashboardConfig};
use statfluence::game_store::SqliteGameStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DashboardConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let year = arg_value(&args, "--year")
        .ok_or_else(|| anyhow!("usage: prune_games --year YEAR [--player ID] [--db PATH]"))?
        .parse::<i32>()
        .context("--year must be a number")?;
    let player = arg_value(&args, "--player");

    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or(cfg.db_path.clone())
        .or_else(config::default_db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteGameStore::open(&db_path)?.with_timeout(cfg.query_timeout);

    let deleted = match player.as_deref() {
        Some(player_id) => store.delete_player_year(player_id, year)?,
        None => store.delete_year(year)?,
    };

    match player {
        Some(player_id) => {
            println!("Deleted {deleted} records for player {player_id} in year {year}.")
        }
        None => println!("Deleted {deleted} records for year {year}."),
    }
    Ok(())
}

/// `--flag value` or `--flag=value`.
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
