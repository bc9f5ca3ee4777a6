use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{Datelike, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use statfluence::aggregation::Metric;
use statfluence::cache::PLAYER_IDS;
use statfluence::config::{self, DashboardConfig};
use statfluence::directory::PlayerDirectory;
use statfluence::export::{self, format_metric};
use statfluence::game_store::SqliteGameStore;
use statfluence::pipeline::{self, PipelineOptions, Rankings};
use statfluence::player_detail;
use statfluence::state::{AppState, Screen};
use statfluence::table::SortKey;
use statfluence::team_summary::{self, TeamFilter};
use statfluence::trend::{Tone, Trend, trend_tone};

const RECENT_GAMES: u32 = 10;

struct App {
    state: AppState,
    cfg: DashboardConfig,
    store: Option<SqliteGameStore>,
    should_quit: bool,
}

impl App {
    fn new(cfg: DashboardConfig) -> Self {
        let options = PipelineOptions::from(&cfg);
        let mut state = AppState::new(options, cfg.power_preset);
        let store = match cfg.db_path.as_deref() {
            Some(path) => match SqliteGameStore::open(path) {
                Ok(store) => Some(store.with_timeout(cfg.query_timeout)),
                Err(err) => {
                    error!("open store {}: {err}", path.display());
                    state.load_failed(&err);
                    None
                }
            },
            None => {
                warn!("no database path; set STATFLUENCE_DB");
                state.load_empty();
                None
            }
        };
        Self {
            state,
            cfg,
            store,
            should_quit: false,
        }
    }

    fn reload(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        match pipeline::select_scope(store) {
            Ok(Some((scope, games))) => {
                let roster = self.cfg.roster_path(scope.year);
                let directory = PlayerDirectory::load(
                    &self.cfg.name_map_path,
                    roster.exists().then_some(roster.as_path()),
                );
                let year = scope.year;
                self.state
                    .push_log(format!("[INFO] Scope {} ({} games)", scope.label(), games.len()));
                self.state.load_scope(scope, games, directory);

                let filter = TeamFilter {
                    year: Some(year),
                    ..TeamFilter::default()
                };
                match team_summary::team_summary(store, &filter) {
                    Ok(teams) => self.state.teams = teams,
                    Err(err) => self.state.push_log(format!("[WARN] Team summary: {err}")),
                }
                match PLAYER_IDS.player_ids(store) {
                    Ok(ids) => self
                        .state
                        .push_log(format!("[INFO] {} players on file", ids.len())),
                    Err(err) => self.state.push_log(format!("[WARN] Player list: {err}")),
                }
            }
            Ok(None) => self.state.load_empty(),
            Err(err) => {
                error!("load rankings: {err}");
                self.state.load_failed(&err);
            }
        }
    }

    fn open_player(&mut self, player_id: String) {
        let Some(store) = &self.store else {
            return;
        };
        let year = self
            .state
            .scope
            .as_ref()
            .map(|s| s.year)
            .unwrap_or_else(|| Local::now().year());

        self.state.detail_error = None;
        match player_detail::player_detail(store, &player_id, year) {
            Ok(detail) => self.state.detail = detail,
            Err(err) => {
                self.state.detail = None;
                self.state.detail_error = Some(err.to_string());
            }
        }
        match store.player_games_page(&player_id, Some(RECENT_GAMES), None) {
            Ok(games) => self.state.recent_games = games,
            Err(err) => {
                self.state.recent_games.clear();
                self.state.push_log(format!("[WARN] Recent games: {err}"));
            }
        }
        self.state.screen = Screen::Player { player_id };
    }

    fn export(&mut self, ext: &str) {
        let Some(scope) = self.state.scope.clone() else {
            self.state.push_log("[INFO] Nothing to export");
            return;
        };
        let path = PathBuf::from(format!("statfluence_rankings_{}.{ext}", scope.year));
        let rankings = Rankings {
            scope,
            rows: self.state.rows.clone(),
        };
        match export::export_rankings(&path, &rankings, &self.state.teams) {
            Ok(report) => {
                info!(path = %path.display(), players = report.players, "export written");
                self.state.push_log(format!(
                    "[INFO] Exported {} players to {}",
                    report.players,
                    path.display()
                ));
            }
            Err(err) => self.state.push_log(format!("[WARN] Export failed: {err:#}")),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        let Some(query) = self.state.search.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.state.search = None,
            KeyCode::Backspace => {
                query.pop();
            }
            KeyCode::Char(ch) => query.push(ch),
            KeyCode::Enter => {
                let raw = query.clone();
                self.state.search = None;
                let found = self
                    .state
                    .directory
                    .resolve(&raw)
                    .map(|entry| entry.player_id.clone());
                match found {
                    Some(player_id) => self.open_player(player_id),
                    None => self
                        .state
                        .push_log(format!("[INFO] Player not found: {raw:?}")),
                }
            }
            _ => {}
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.search.is_some() {
            self.on_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('b') | KeyCode::Esc => self.state.screen = Screen::Rankings,
            KeyCode::Char('T') => self.state.screen = Screen::Teams,
            KeyCode::Char('/') => self.state.search = Some(String::new()),
            KeyCode::Char('r') => self.reload(),
            _ => match self.state.screen {
                Screen::Rankings => self.on_rankings_key(key),
                Screen::Teams => match key.code {
                    KeyCode::Char('j') | KeyCode::Down => self.state.team_scroll += 1,
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.state.team_scroll = self.state.team_scroll.saturating_sub(1)
                    }
                    _ => {}
                },
                Screen::Player { .. } => {}
            },
        }
    }

    fn on_rankings_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char(ch @ '1'..='8') => {
                let idx = ch as usize - '1' as usize;
                self.state.on_header(SortKey::ALL[idx]);
            }
            KeyCode::Char('n') => self.state.cycle_limit(),
            KeyCode::Char('t') => self.state.cycle_team(),
            KeyCode::Char('o') => self.state.cycle_position(),
            KeyCode::Char('p') => self.state.cycle_preset(),
            KeyCode::Char('e') => self.export("xlsx"),
            KeyCode::Char('E') => self.export("json"),
            KeyCode::Char('d') | KeyCode::Enter => {
                if let Some(row) = self.state.selected_row() {
                    let player_id = row.player_id.clone();
                    self.open_player(player_id);
                }
            }
            _ => {}
        }
    }
}

fn init_logging() {
    let Some(dir) = config::app_cache_dir() else {
        return;
    };
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dashboard.log"))
    else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let cfg = DashboardConfig::from_env();
    init_logging();

    let mut app = App::new(cfg);
    app.reload();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &app.state.screen {
        Screen::Rankings => render_rankings(frame, chunks[1], &app.state),
        Screen::Teams => render_teams(frame, chunks[1], &app.state),
        Screen::Player { player_id } => render_player(frame, chunks[1], &app.state, player_id),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let scope = state
        .scope
        .as_ref()
        .map(|s| s.label())
        .unwrap_or_else(|| "-".to_string());
    let team = state.view.team().unwrap_or("All");
    let pos = state
        .view
        .position()
        .map(|p| p.label())
        .unwrap_or_else(|| "All".to_string());
    format!(
        "STATFLUENCE | {scope} | Power: {} | Team: {team} | Pos: {pos} | Show {}",
        state.preset.label(),
        state.view.limit.count()
    )
}

fn footer_text(state: &AppState) -> String {
    if let Some(query) = &state.search {
        return format!("Find player: {query}_   (Enter open, Esc cancel)");
    }
    match state.screen {
        Screen::Rankings => {
            "j/k Move | 1-8 Sort | n Rows | t Team | o Pos | p Power | Enter Player | / Find | T Teams | e/E Export | ? Help | q Quit".to_string()
        }
        Screen::Teams => "j/k Scroll | b/Esc Back | / Find | ? Help | q Quit".to_string(),
        Screen::Player { .. } => "b/Esc Back | / Find | T Teams | ? Help | q Quit".to_string(),
    }
}

fn ranking_columns() -> [Constraint; 12] {
    [
        Constraint::Length(5),
        Constraint::Min(20),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ]
}

fn render_rankings(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = ranking_columns();
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    render_cell_text(frame, cols[0], "Rank", bold);
    render_cell_text(frame, cols[1], "Player", bold);
    render_cell_text(frame, cols[2], "Pos", bold);
    render_cell_text(frame, cols[3], "Team", bold);
    for (i, key) in SortKey::ALL.into_iter().enumerate() {
        let label = format!("{}:{}", i + 1, state.view.header_label(key));
        render_cell_text(frame, cols[4 + i], &label, bold);
    }

    let list_area = sections[1];
    if let Some(msg) = state.status_message() {
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let rows = state.visible_rows();
    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        let row = rows[idx];
        render_cell_text(frame, cols[0], &row.rank.to_string(), row_style);
        render_cell_text(frame, cols[1], &row.name, row_style);
        render_cell_text(frame, cols[2], row.position.as_deref().unwrap_or("-"), row_style);
        render_cell_text(frame, cols[3], &row.team, row_style);
        render_cell_text(frame, cols[4], &format!("{:.1}", row.power), row_style);
        for (i, key) in SortKey::ALL.into_iter().skip(1).enumerate() {
            if let Some(metric) = key.metric() {
                let value = format_metric(metric, row.metric(metric));
                render_trend_cell(frame, cols[5 + i], &value, row.trend(metric), metric, row_style);
            }
        }
    }
}

fn tone_style(tone: Tone, base: Style) -> Style {
    match tone {
        Tone::Positive => base.fg(Color::Green),
        Tone::Negative => base.fg(Color::Red),
        Tone::Plain => base,
    }
}

fn render_trend_cell(
    frame: &mut Frame,
    area: Rect,
    value: &str,
    trend: Trend,
    metric: Metric,
    base: Style,
) {
    let line = Line::from(vec![
        Span::styled(format!("{value} "), base),
        Span::styled(trend.arrow(), tone_style(trend_tone(trend, metric), base)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_player(frame: &mut Frame, area: Rect, state: &AppState, player_id: &str) {
    let sections = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let name = state.directory.name_for(player_id);
    let pos = state.directory.position_code_for(player_id).unwrap_or("-");
    let team = state.directory.team_for(player_id);
    let title = format!("{name} | {pos} | {team}");

    let mut lines = Vec::new();
    if let Some(err) = &state.detail_error {
        lines.push(Line::from(format!("Something went wrong: {err}")));
    } else if let Some(detail) = &state.detail {
        lines.push(Line::styled(
            format!(
                "{:<6}{:>12}{:>14}",
                "",
                format!("{} ({}g)", detail.year, detail.current.games),
                "Past 3"
            ),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for (metric, current, past) in detail.metric_rows() {
            let trend = detail.trends.get(metric);
            let past = past
                .map(|v| format_metric(metric, v))
                .unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(vec![
                Span::raw(format!(
                    "{:<6}{:>12}{:>14} ",
                    metric.label(),
                    format_metric(metric, current),
                    past
                )),
                Span::styled(trend.arrow(), tone_style(trend_tone(trend, metric), Style::default())),
            ]));
        }
    } else {
        lines.push(Line::from("No games this season"));
    }
    let summary = Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(summary, sections[0]);

    let mut recent = vec![Line::styled(
        format!(
            "{:<11}{:<5}{:>6}{:>5}{:>5}{:>5}{:>5}",
            "Date", "Tm", "MP", "PTS", "TRB", "AST", "TOV"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    for g in &state.recent_games {
        recent.push(Line::from(format!(
            "{:<11}{:<5}{:>6.1}{:>5}{:>5}{:>5}{:>5}",
            g.game_date.format("%Y-%m-%d"),
            g.team,
            g.minutes,
            g.points,
            g.trb,
            g.ast,
            g.tov
        )));
    }
    let games = Paragraph::new(recent)
        .block(Block::default().title("Recent games").borders(Borders::ALL));
    frame.render_widget(games, sections[1]);
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.teams.is_empty() {
        let empty = Paragraph::new("No teams found").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }
    let mut lines = vec![Line::styled(
        format!(
            "{:<6}{:<6}{:<18}{:>7}{:>7}{:>7}{:>7}{:>8}{:>8}{:>8}",
            "Team", "Year", "Season", "PTS", "REB", "AST", "TOV", "FG%", "FT%", "TS%"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    let skip = state
        .team_scroll
        .min(state.teams.len().saturating_sub(1));
    for t in state.teams.iter().skip(skip) {
        lines.push(Line::from(format!(
            "{:<6}{:<6}{:<18}{:>7}{:>7}{:>7}{:>7}{:>8}{:>8}{:>8}",
            t.team,
            t.year,
            t.season_type,
            t.pts,
            t.reb,
            t.ast,
            t.tov,
            format!("{:.1}%", t.fg_pct * 100.0),
            format!("{:.1}%", t.ft_pct * 100.0),
            format!("{:.1}%", t.ts_pct * 100.0),
        )));
    }
    let table = Paragraph::new(lines).block(Block::default().title("Team totals").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    state
        .logs
        .iter()
        .rev()
        .take(1)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Statfluence - Help",
        "",
        "Global:",
        "  /            Find player by name or id",
        "  T            Team totals",
        "  b / Esc      Back to rankings",
        "  r            Reload",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Rankings:",
        "  j/k or ↑/↓   Move",
        "  1-8          Sort by column (again to flip)",
        "  n            Rows shown (10/15/25/50)",
        "  t / o        Team / position filter",
        "  p            Power formula",
        "  Enter / d    Player detail",
        "  e / E        Export xlsx / json",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
