use chrono::{Duration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use statfluence::aggregation::aggregate_players;
use statfluence::directory::{PlayerDirectory, RosterRow, slug_for};
use statfluence::game_store::GameStatLine;
use statfluence::pipeline::{PipelineOptions, rank_games};
use statfluence::power_rank::{PowerPreset, rank_players};
use statfluence::table::{SortKey, TableView};

const PLAYERS: usize = 150;
const GAMES: usize = 40;

fn sample_season() -> Vec<GameStatLine> {
    let opener = NaiveDate::from_ymd_opt(2025, 5, 16).unwrap();
    let mut out = Vec::with_capacity(PLAYERS * GAMES);
    for p in 0..PLAYERS {
        for g in 0..GAMES {
            let seed = (p * 31 + g * 17) as u32;
            out.push(GameStatLine {
                team: ["LVA", "NYL", "MIN", "SEA"][p % 4].to_string(),
                minutes: 12.0 + (seed % 25) as f64,
                points: seed % 30,
                fg: seed % 11,
                fga: 6 + seed % 14,
                trb: seed % 12,
                ast: seed % 9,
                stl: seed % 4,
                blk: seed % 3,
                tov: seed % 5,
                ..GameStatLine::blank(
                    format!("p{p:03}"),
                    2025,
                    "Regular Season",
                    opener + Duration::days((GAMES - g) as i64 * 2),
                )
            });
        }
    }
    out
}

fn sample_directory() -> PlayerDirectory {
    let names = (0..PLAYERS)
        .map(|p| (format!("Player Número {p}"), format!("p{p:03}")))
        .collect();
    let roster = (0..PLAYERS)
        .map(|p| RosterRow {
            name: format!("Player Número {p}"),
            position: ["G", "F", "C", "F-G", "C-F"][p % 5].to_string(),
            team: ["LVA", "NYL", "MIN", "SEA"][p % 4].to_string(),
        })
        .collect();
    PlayerDirectory::build(names, roster)
}

fn bench_aggregate(c: &mut Criterion) {
    let lines = sample_season();
    c.bench_function("aggregate_players", |b| {
        b.iter(|| {
            let rows = aggregate_players(black_box(&lines), 5);
            black_box(rows.len());
        })
    });
}

fn bench_power_rank(c: &mut Criterion) {
    let players = aggregate_players(&sample_season(), 5);
    let formula = PowerPreset::ProductionBlend.formula();
    c.bench_function("rank_players", |b| {
        b.iter(|| {
            let ranked = rank_players(&formula, black_box(&players));
            black_box(ranked.len());
        })
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let lines = sample_season();
    let directory = sample_directory();
    let opts = PipelineOptions::default();
    c.bench_function("rank_games", |b| {
        b.iter(|| {
            let rows = rank_games(black_box(&lines), &directory, &opts);
            black_box(rows.len());
        })
    });
}

fn bench_table_view(c: &mut Criterion) {
    let rows = rank_games(&sample_season(), &sample_directory(), &PipelineOptions::default());
    let mut view = TableView::new();
    view.on_header(SortKey::Points);
    view.set_team(Some("nyl"));
    c.bench_function("table_visible_rows", |b| {
        b.iter(|| {
            let visible = view.visible_rows(black_box(&rows));
            black_box(visible.len());
        })
    });
}

fn bench_slug(c: &mut Criterion) {
    c.bench_function("slug_for", |b| {
        b.iter(|| black_box(slug_for(black_box("Aʼja Wilson-Núñez  Jr."))))
    });
}

criterion_group!(
    perf,
    bench_aggregate,
    bench_power_rank,
    bench_full_pipeline,
    bench_table_view,
    bench_slug
);
criterion_main!(perf);
