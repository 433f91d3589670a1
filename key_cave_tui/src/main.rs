use anyhow::{Context, Result};
use clap::Parser;
use key_cave_core::{
    Direction,
    engine::{GameState, GameStatus, MoveOutcome, Notice},
    entity::Entity,
    level::{self, Level, LevelError, Tile},
    save::SaveData,
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::Direction as LayoutDirection,
    prelude::*,
    widgets::*,
};
use std::{
    fs,
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

/// Move budget used when a level comes from a file and no budget was given.
const FILE_LEVEL_DEFAULT_MOVES: i32 = 20;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Built-in level identifier (game1, game2, game3) or path to a level file
    #[arg(short, long, default_value = "game1")]
    level: String,

    /// Move budget when the level is loaded from a file
    #[arg(short, long)]
    moves: Option<i32>,

    /// Resume from a save file instead of starting fresh
    #[arg(long, value_name = "SAVE_FILE")]
    load: Option<PathBuf>,

    /// Where the save key writes its file
    #[arg(long, value_name = "SAVE_FILE", default_value = "key_cave_save.json")]
    save: PathBuf,
}

/// Loads a level by identifier: the embedded registry first, then the
/// filesystem.
fn load_level(id: &str, moves: Option<i32>) -> Result<Level> {
    match level::builtin(id) {
        Ok(level) => Ok(level),
        Err(LevelError::UnknownLevel(_)) => {
            let text = fs::read_to_string(id)
                .with_context(|| format!("no built-in level or level file named '{id}'"))?;
            let level = Level::parse(id, &text, moves.unwrap_or(FILE_LEVEL_DEFAULT_MOVES))?;
            Ok(level)
        }
        Err(err) => Err(err.into()),
    }
}

struct App {
    /// The core game engine.
    game: GameState,
    /// Identifier the current level was loaded by, for restarts and saves.
    level_id: String,
    /// Move-budget override for file-based levels.
    moves_override: Option<i32>,
    /// Where the save key writes its file.
    save_path: PathBuf,
    /// Wall-clock start of the current session.
    started: Instant,
    /// Elapsed seconds carried over from a restored save.
    elapsed_offset: u64,
    /// One-line message shown in the status pane.
    message: Option<String>,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let (game, level_id, elapsed_offset) = match &args.load {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading save file {}", path.display()))?;
                let data: SaveData = serde_json::from_str(&text)
                    .with_context(|| format!("parsing save file {}", path.display()))?;
                let level = load_level(&data.level, args.moves)?;
                let game = data.restore_with(level);
                (game, data.level.clone(), data.elapsed_secs)
            }
            None => {
                let level = load_level(&args.level, args.moves)?;
                (GameState::new(level), args.level.clone(), 0)
            }
        };

        Ok(App {
            game,
            level_id,
            moves_override: args.moves,
            save_path: args.save.clone(),
            started: Instant::now(),
            elapsed_offset,
            message: None,
            should_quit: false,
        })
    }

    /// Total play time in seconds, including time from a restored save.
    fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs() + self.elapsed_offset
    }

    /// Drives one attempted move. Ignored once the game is terminal; the
    /// engine leaves that suppression to its driver.
    fn move_player(&mut self, direction: Direction) {
        if self.game.status().is_terminal() {
            return;
        }
        let outcome = self.game.attempt_move(direction);
        self.message = match outcome {
            MoveOutcome::Blocked { .. } => Some("You can't go that way.".to_string()),
            MoveOutcome::Moved {
                notice: Some(Notice::DoorLocked),
                ..
            } => Some("You don't have the key!".to_string()),
            MoveOutcome::Moved { .. } => None,
        };
    }

    /// Restarts the current level from scratch.
    fn new_game(&mut self) -> Result<()> {
        let level = load_level(&self.level_id, self.moves_override)?;
        self.game = GameState::new(level);
        self.started = Instant::now();
        self.elapsed_offset = 0;
        self.message = Some("New game.".to_string());
        Ok(())
    }

    /// Writes the resume snapshot to the save path.
    fn save(&mut self) {
        let data = SaveData::capture(&self.game, self.elapsed_secs());
        let result = serde_json::to_string_pretty(&data)
            .map_err(anyhow::Error::from)
            .and_then(|json| fs::write(&self.save_path, json).map_err(anyhow::Error::from));
        self.message = Some(match result {
            Ok(()) => format!("Game saved to {}.", self.save_path.display()),
            Err(err) => {
                log::warn!("saving to {} failed: {err}", self.save_path.display());
                format!("Save failed: {err}")
            }
        });
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut app = App::new(&args)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
///
/// The tick only refreshes the elapsed-time display; the engine mutates
/// solely in response to key presses, one move per press.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char('n') => app.new_game()?,
                    KeyCode::Char('S') => app.save(),
                    KeyCode::Char('w') | KeyCode::Up => app.move_player(Direction::North),
                    KeyCode::Char('s') | KeyCode::Down => app.move_player(Direction::South),
                    KeyCode::Char('a') | KeyCode::Left => app.move_player(Direction::West),
                    KeyCode::Char('d') | KeyCode::Right => app.move_player(Direction::East),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([
            Constraint::Min(5),    // Area for the dungeon map
            Constraint::Length(6), // Area for game status
            Constraint::Length(1), // Area for the help line
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.game);
    render_status(frame, main_layout[1], app);

    let help_text =
        Paragraph::new("Move: WASD/arrows | Save: Shift+S | New game: n | Quit: q or Esc")
            .alignment(Alignment::Center);
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the dungeon grid with the player overlaid.
fn render_map(frame: &mut Frame, area: Rect, game: &GameState) {
    let dungeon = game.dungeon();
    let player_pos = game.player().position();

    let mut lines: Vec<Line> = Vec::with_capacity(dungeon.rows());
    for row in 0..dungeon.rows() as i32 {
        let mut spans: Vec<Span> = Vec::with_capacity(dungeon.cols());
        for col in 0..dungeon.cols() as i32 {
            let pos = key_cave_core::Position::new(row, col);
            // The player may have walked off the grid; then nothing is drawn
            // for them.
            if pos == player_pos {
                spans.push(Span::styled(
                    Entity::Player.id().to_string(),
                    Style::default().fg(Color::Cyan).bold(),
                ));
                continue;
            }
            let tile = dungeon.tile(pos).unwrap_or(Tile::Empty);
            let style = match tile {
                Tile::Wall => Style::default().fg(Color::DarkGray),
                Tile::Key => Style::default().fg(Color::Yellow),
                Tile::MoveBonus => Style::default().fg(Color::Green),
                Tile::Door => Style::default().fg(Color::Magenta),
                Tile::Empty | Tile::PlayerStart => Style::default(),
            };
            // Inert duplicate start cells render as floor.
            let code = match tile {
                Tile::PlayerStart => ' ',
                other => other.code(),
            };
            spans.push(Span::styled(code.to_string(), style));
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Key Cave").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

/// Renders move budget, elapsed time, inventory, and any pending message.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let elapsed = app.elapsed_secs();
    let keys_held = app
        .game
        .player()
        .inventory()
        .iter()
        .filter(|item| matches!(item, Entity::Key))
        .count();

    let mut lines = vec![
        Line::from(format!(
            "Moves remaining: {}",
            app.game.player().moves_remaining()
        )),
        Line::from(format!("Time elapsed: {}m {}s", elapsed / 60, elapsed % 60)),
        Line::from(format!("Keys held: {keys_held}")),
    ];

    match app.game.status() {
        GameStatus::Won => lines.push(Line::styled(
            "You escaped the cave! Press 'n' for a new game.",
            Style::default().fg(Color::Green).bold(),
        )),
        GameStatus::Lost => lines.push(Line::styled(
            "Out of moves. Press 'n' to try again.",
            Style::default().fg(Color::Red).bold(),
        )),
        GameStatus::Active => {
            if let Some(message) = &app.message {
                lines.push(Line::from(message.clone()));
            }
        }
    }

    let status_widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, area);
}
