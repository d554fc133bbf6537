pub mod config;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod source;
pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use crate::config::{Config, ConfigStore, FileConfigStore};
use crate::runtime::{CrosstermEventSource, Event, EventSource, Runner};
use crate::session::Session;

/// stream a long text through your fingers, resumable across sittings
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Typing practice over any plain-text file: lines are wrapped to the terminal, typed characters are marked correct or incorrect in place, and a sidecar file remembers how far you got so the next run picks up where you stopped."
)]
pub struct Cli {
    /// plain-text file to practice on
    file: PathBuf,
}

pub struct App {
    pub session: Session,
    pub config: Config,
    /// Raw code of the most recent key event, echoed on the status line.
    pub last_key: Option<KeyCode>,
}

impl App {
    pub fn new(session: Session, config: Config) -> Self {
        Self {
            session,
            config,
            last_key: None,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = FileConfigStore::new().load();

    // Open the text before touching any terminal state so a bad path fails
    // with a plain error message.
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let session = match Session::open(&cli.file, rows, cols) {
        Ok(session) => session,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, err.to_string()).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, config);
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(app.config.tick_rate_ms),
    );
    let res = run_app(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;
        if app.session.has_finished() {
            return Ok(());
        }

        match runner.step() {
            Event::Tick => {}
            Event::Resize => {
                let size = terminal.size()?;
                app.session.set_viewport_rows(size.height);
            }
            Event::Key(key) => {
                app.last_key = Some(key.code);
                match key.code {
                    KeyCode::Esc => return Ok(()),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(())
                    }
                    KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.session.skip()
                    }
                    KeyCode::Backspace => app.session.backspace(),
                    KeyCode::Char(c) => app.session.write(c),
                    _ => {}
                }
            }
        }
    }
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}
