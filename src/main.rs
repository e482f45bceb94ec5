pub mod ui;

use std::{
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    time::{Duration, Instant},
};

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use flick::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    history::{summarize, HistoryStore, HistorySummary, SessionRecord},
    runtime::{
        CrosstermEventSource, FixedTicker, FlickEvent, FlickEventSource, Runner, Ticker,
    },
    viewport::Viewport,
    GameController, SessionState,
};

/// sleek aim trainer tui: click targets before they vanish
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal aim trainer. Targets pop up across the play area and vanish after three seconds; click them with the mouse to score, keep a streak going for combo bonuses, and see how you did after sixty seconds."
)]
pub struct Cli {
    /// logical width of the play area
    #[clap(long)]
    width: Option<f64>,

    /// logical height of the play area
    #[clap(long)]
    height: Option<f64>,

    /// milliseconds between frames
    #[clap(short = 't', long, value_parser = clap::value_parser!(u64).range(1..))]
    tick_rate: Option<u64>,

    /// seed target placement for a reproducible session
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// record finished sessions to the history file
    #[clap(long)]
    history: bool,

    /// store the given options as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line values win over the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(width) = self.width {
            config.play_width = width;
        }
        if let Some(height) = self.height {
            config.play_height = height;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate_ms = tick_rate;
        }
        if self.history {
            config.record_history = true;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub game: GameController,
    pub config: Config,
    pub history: Option<HistoryStore>,
    pub history_summary: HistorySummary,
    /// Play rectangle from the last frame, needed to map mouse cells
    pub viewport: Option<Viewport>,
}

impl App {
    pub fn new(config: Config, seed: Option<u64>, history: Option<HistoryStore>) -> Self {
        let area = config.play_area();
        let game = match seed {
            Some(seed) => GameController::with_seed(area, seed),
            None => GameController::new(area),
        };

        let mut app = Self {
            game,
            config,
            history,
            history_summary: HistorySummary::default(),
            viewport: None,
        };
        app.refresh_history_summary();
        app
    }

    /// Fire due timers. Returns whether the frame needs redrawing.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        let was_playing = self.game.is_playing();
        let changed = self.game.advance(now);
        if was_playing && self.game.state() == SessionState::Ended {
            self.record_finished_session();
        }
        changed || self.game.is_playing()
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.game.state() {
            SessionState::Menu => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => {
                    self.game.start(now);
                }
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
            SessionState::Playing => match key.code {
                KeyCode::Esc | KeyCode::Char('e') => {
                    if self.game.end_now(now) {
                        self.record_finished_session();
                    }
                }
                _ => {}
            },
            SessionState::Ended => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => {
                    self.game.start(now);
                }
                KeyCode::Char('m') => {
                    self.game.return_to_menu();
                }
                KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
        }

        Flow::Continue
    }

    /// Returns whether the frame needs redrawing
    pub fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) -> bool {
        let Some(viewport) = self.viewport else {
            return false;
        };
        let Some(point) = viewport.to_logical(mouse.column, mouse.row) else {
            return false;
        };

        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.game.pointer_move(point);
                true
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.game.pointer_move(point);
                let outcome = self.game.click_at(point, viewport.hit_tolerance(), now);
                log::trace!("click at ({:.0}, {:.0}): {:?}", point.x, point.y, outcome);
                true
            }
            _ => false,
        }
    }

    fn record_finished_session(&mut self) {
        let Some(store) = &self.history else {
            return;
        };

        let record = SessionRecord::new(self.game.stats(), self.game.session(), Local::now());
        match store.append(&record) {
            Ok(()) => log::info!("session recorded to {}", store.path().display()),
            Err(err) => log::warn!("could not record session: {}", err),
        }
        self.refresh_history_summary();
    }

    fn refresh_history_summary(&mut self) {
        let Some(store) = &self.history else {
            return;
        };

        match store.load() {
            Ok(records) => self.history_summary = summarize(&records),
            Err(err) => log::warn!("could not read history: {}", err),
        }
    }
}

fn init_logging() {
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    // the TUI owns the terminal, so logs go to a file or nowhere
    let target: Box<dyn Write + Send> = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(file) => Box::new(file),
        Err(_) => Box::new(io::sink()),
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(target))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    log::info!("starting flick v{}", env!("CARGO_PKG_VERSION"));

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store.save(&config)?;
        log::info!("saved config to {}", store.path().display());
    }

    let history = if config.record_history {
        HistoryStore::default_location()
    } else {
        None
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, cli.seed, history);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("flick exited with error: {}", e);
        eprintln!("Error: {}", e);
    }

    log::info!("flick shut down cleanly");
    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(app.config.tick_rate_ms.max(1))),
    );
    run_loop(terminal, app, &runner)
}

fn run_loop<B, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> anyhow::Result<()>
where
    B: Backend,
    E: FlickEventSource,
    T: Ticker,
{
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let event = runner.step();
        let now = Instant::now();

        // timers catch up before any input is judged against the targets
        let mut redraw = app.on_tick(now);

        match event {
            FlickEvent::Tick => {}
            FlickEvent::Closed => anyhow::bail!("terminal input closed"),
            FlickEvent::Resize => redraw = true,
            FlickEvent::Key(key) => {
                if app.handle_key(key, now) == Flow::Quit {
                    break;
                }
                redraw = true;
            }
            FlickEvent::Mouse(mouse) => {
                redraw |= app.handle_mouse(mouse, now);
            }
        }

        if redraw {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}
