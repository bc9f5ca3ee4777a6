use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use statfluence::config::{self, DashboardConfig};
use statfluence::game_log;
use statfluence::game_store::SqliteGameStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DashboardConfig::from_env();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let dry_run = args.iter().any(|a| a == "--dry-run");
    let input = parse_input_arg(&args).ok_or_else(|| {
        anyhow!("usage: seed_games [--db PATH] [--dry-run] <file.csv | directory>")
    })?;

    let files = game_log::collect_log_files(&input)?;
    if files.is_empty() {
        println!("No CSV files under {}", input.display());
        return Ok(());
    }

    let store = if dry_run {
        None
    } else {
        let db_path = parse_db_path_arg(&args)
            .or(cfg.db_path.clone())
            .or_else(config::default_db_path)
            .context("unable to resolve sqlite path")?;
        info!(db = %db_path.display(), "seeding");
        Some(SqliteGameStore::open(&db_path)?.with_timeout(cfg.query_timeout))
    };

    let mut inserted = 0usize;
    let mut failed = 0usize;
    for file in &files {
        let lines = match game_log::read_game_log(file) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("{err:#}");
                failed += 1;
                continue;
            }
        };
        if lines.is_empty() {
            println!("{}: no rows", file.display());
            continue;
        }
        match &store {
            Some(store) => {
                let n = store
                    .insert_games(&lines)
                    .with_context(|| format!("insert rows from {}", file.display()))?;
                inserted += n;
                println!("{}: inserted {n} rows", file.display());
            }
            None => println!("{}: parsed {} rows (dry run)", file.display(), lines.len()),
        }
    }

    println!("Seed complete");
    println!("Files: {} ({} failed)", files.len(), failed);
    println!("Rows inserted: {inserted}");
    Ok(())
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

/// First positional argument, skipping flags and the value after `--db`.
fn parse_input_arg(args: &[String]) -> Option<PathBuf> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        return Some(PathBuf::from(arg));
    }
    None
}
