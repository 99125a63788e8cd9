//! Watch command implementation - Interactive TUI viewer.
//!
//! Shows a live bot game from one player's fogged perspective.

// CLI watch uses intentional casts for display
#![allow(clippy::cast_possible_truncation)]

use super::session::{GameArgs, Session};
use super::CliError;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kingsgrid::game::PlayerView;
use kingsgrid::{Block as Cell, BroadcastEvent, EngineConfig, GameStatus, Map, Owner};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io::stdout;
use std::time::Duration;

/// Lines kept in the event log panel.
const LOG_LINES: usize = 8;

/// Execute the watch command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up or the TUI fails.
pub(crate) fn execute(config: &EngineConfig, args: &GameArgs, player: u8) -> Result<(), CliError> {
    if player == 0 || usize::from(player) > args.bots {
        return Err(CliError::new(format!(
            "player must be 1-{}, got {player}",
            args.bots
        )));
    }
    let session = Session::start(config, args)?;
    run_tui(session, args.turns, player)
}

/// App state for the TUI.
struct App {
    session: Session,
    max_turns: u32,
    viewer: u8,
    paused: bool,
    map: Option<Map>,
    roster: Vec<PlayerView>,
    status: GameStatus,
    turn: u32,
    ended: Option<String>,
    log: VecDeque<String>,
}

impl App {
    fn new(session: Session, max_turns: u32, viewer: u8) -> Self {
        Self {
            session,
            max_turns,
            viewer,
            paused: false,
            map: None,
            roster: Vec::new(),
            status: GameStatus::Waiting,
            turn: 0,
            ended: None,
            log: VecDeque::with_capacity(LOG_LINES),
        }
    }

    fn viewer_id(&self) -> String {
        format!("p{}", self.viewer)
    }

    /// Pull queued broadcasts. Bots always answer; the view freezes while
    /// paused.
    fn pump(&mut self) {
        for event in self.session.drain() {
            if !self.paused {
                self.apply(event);
            }
        }
    }

    fn apply(&mut self, event: BroadcastEvent) {
        match event {
            BroadcastEvent::MapUpdate {
                viewer,
                map,
                turn_number,
            } if viewer == self.viewer_id() => {
                self.map = Some(map);
                self.turn = turn_number;
            }
            BroadcastEvent::GameStatusUpdate {
                status,
                players,
                turn_number,
            } => {
                self.status = status;
                self.roster = players;
                self.turn = turn_number;
            }
            BroadcastEvent::TurnAdvanced { turn_number } => self.turn = turn_number,
            BroadcastEvent::PlayerJoined { player } => {
                self.push_log(format!("{} joined", player.id));
            }
            BroadcastEvent::PlayerLeft { player_id } => self.push_log(format!("{player_id} left")),
            BroadcastEvent::PlayerError { player_id, message } => {
                self.push_log(format!("{player_id}: {message}"));
            }
            BroadcastEvent::StartFailed { message } => {
                self.push_log(format!("start failed: {message}"));
            }
            BroadcastEvent::GameEnded { winners, reason } => {
                self.status = GameStatus::Finished;
                let summary = if winners.is_empty() {
                    format!("no winner ({reason})")
                } else {
                    format!("{} won ({reason})", winners.join(", "))
                };
                self.push_log(summary.clone());
                self.ended = Some(summary);
            }
            _ => {}
        }
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    fn switch_viewer(&mut self, viewer: u8) {
        if usize::from(viewer) <= self.session.bots().len() && viewer != self.viewer {
            self.viewer = viewer;
            self.map = None;
        }
    }

    fn owner(&self) -> Option<Owner> {
        let id = self.viewer_id();
        self.roster.iter().find(|p| p.id == id).map(|p| p.index)
    }
}

fn run_tui(session: Session, max_turns: u32, viewer: u8) -> Result<(), CliError> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(|e| CliError::new(e.to_string()))?;

    let mut app = App::new(session, max_turns, viewer);
    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result?;
    app.session.finish()?;
    Ok(())
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<(), CliError> {
    loop {
        app.pump();

        // Draw
        terminal.draw(|f| ui(f, app)).map_err(|e| CliError::new(e.to_string()))?;

        // Handle input with timeout
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char(' ') => app.toggle_pause(),
                KeyCode::Char(c @ '1'..='8') => {
                    if let Some(num) = c.to_digit(10) {
                        app.switch_viewer(num as u8);
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], app);

    // Main content - map and side panels
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);

    render_map(f, main_chunks[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(LOG_LINES as u16 + 2)])
        .split(main_chunks[1]);
    render_stats(f, side[0], app);
    render_log(f, side[1], app);

    render_footer(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let status = match (app.status, app.paused) {
        (GameStatus::Finished, _) => "GAME OVER",
        (_, true) => "PAUSED",
        (GameStatus::Waiting, false) => "WAITING",
        (GameStatus::InProgress, false) => "RUNNING",
    };

    let title = format!(
        " Kingsgrid | {} | Turn {}/{} | {} | Viewing {} ",
        app.session.mode().name,
        app.turn,
        app.max_turns,
        status,
        app.viewer_id()
    );

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn render_map(f: &mut Frame, area: Rect, app: &App) {
    let mut lines: Vec<Line> = Vec::new();

    if let Some(map) = &app.map {
        // Two columns per cell; show the part that fits
        let visible_width = (usize::from(area.width).saturating_sub(2) / 2).min(usize::from(map.width()));
        let visible_height = usize::from(area.height).saturating_sub(2).min(usize::from(map.height()));
        let width = usize::from(map.width());

        for row in map.blocks().chunks(width.max(1)).take(visible_height) {
            let spans: Vec<Span> = row
                .iter()
                .take(visible_width)
                .map(|cell| {
                    let (ch, color) = cell_to_char_color(cell);
                    Span::styled(format!("{ch} "), Style::default().fg(color))
                })
                .collect();
            lines.push(Line::from(spans));
        }
    } else {
        lines.push(Line::from("waiting for map..."));
    }

    let title = app
        .map
        .as_ref()
        .map_or_else(|| " Map ".to_string(), |m| format!(" {} ", m.info().id));
    let map_widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(map_widget, area);
}

fn cell_to_char_color(cell: &Cell) -> (char, Color) {
    let color = player_color(cell.owner());
    let ch = match cell {
        Cell::Blank => '.',
        Cell::Mountain => '^',
        Cell::Castle { .. } => 'C',
        Cell::King { .. } => 'K',
        Cell::Soldier { num, .. } => char::from_digit(*num, 10).unwrap_or('+'),
    };
    (ch, color)
}

fn render_stats(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();
    let viewer = app.owner();

    lines.push(Line::from(""));

    for player in &app.roster {
        let color = player_color(player.index);
        let marker = if Some(player.index) == viewer { " *" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(
                format!("Player {}{marker} ", player.index),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("({})", player.id)),
        ]));
        lines.push(Line::from(format!("  {:?}", player.status)));
        if Some(player.index) == viewer
            && let Some(map) = &app.map
        {
            lines.push(Line::from(format!(
                "  Troops: {}  Cells: {}",
                map.troops(player.index),
                map.owned_cells(player.index).count()
            )));
        }
        if let Some(reason) = &player.finish_reason {
            lines.push(Line::from(format!("  {reason}")));
        }
        lines.push(Line::from(""));
    }

    if let Some(ended) = &app.ended {
        lines.push(Line::from(Span::styled(
            ended.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    let stats_widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Players "))
        .wrap(Wrap { trim: false });

    f.render_widget(stats_widget, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app.log.iter().map(|l| Line::from(l.as_str())).collect();
    let log_widget = Paragraph::new(lines)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title(" Events "))
        .wrap(Wrap { trim: true });

    f.render_widget(log_widget, area);
}

fn player_color(owner: Owner) -> Color {
    match owner {
        1 => Color::Red,
        2 => Color::Blue,
        3 => Color::Green,
        4 => Color::Yellow,
        5 => Color::Magenta,
        6 => Color::Cyan,
        7 => Color::LightRed,
        8 => Color::LightBlue,
        _ => Color::DarkGray,
    }
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let controls = if app.status == GameStatus::Finished {
        " [q] Quit  [1-8] Player view "
    } else {
        " [q] Quit  [Space] Pause view  [1-8] Player view "
    };

    let footer = Paragraph::new(controls)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}
