mod actions;
mod app;
mod input;
pub mod present;
mod view;

use anyhow::{Context, Result};
use app::App;
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use jigong_core::KeyValueStore;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, stdout, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

pub use app::{resolve_assets_dir, resolve_store_path, DEFAULT_ASSETS_DIR};
pub use present::UiLocale;

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub locale: Option<String>,
    pub seed: Option<u64>,
    pub assets_dir: Option<PathBuf>,
    pub posts_path: Option<PathBuf>,
    pub store_path: Option<PathBuf>,
}

pub fn run(options: LaunchOptions) -> Result<()> {
    let mut app = App::bootstrap(&options)?;

    ensure_interactive_terminal()?;

    enable_raw_mode().map_err(|err| {
        anyhow::anyhow!(
            "failed to enable raw mode; ensure the process owns an interactive terminal: {err}"
        )
    })?;
    let mut stdout = stdout();
    stdout
        .execute(EnterAlternateScreen)
        .context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let run_result = run_loop(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    run_result
}

pub fn run_with_args(args: &[String]) -> Result<()> {
    let options = parse_options(args);
    run(options)
}

fn parse_options(args: &[String]) -> LaunchOptions {
    let mut options = LaunchOptions {
        locale: std::env::var("JIGONG_LANG").ok(),
        ..LaunchOptions::default()
    };
    let mut idx = 0usize;
    while idx < args.len() {
        let value = args.get(idx + 1);
        match (args[idx].as_str(), value) {
            ("--lang" | "-l", Some(value)) => {
                options.locale = Some(value.clone());
                idx += 1;
            }
            ("--seed", Some(value)) => {
                options.seed = value.parse::<u64>().ok();
                idx += 1;
            }
            ("--assets", Some(value)) => {
                options.assets_dir = Some(PathBuf::from(value));
                idx += 1;
            }
            ("--posts", Some(value)) => {
                options.posts_path = Some(PathBuf::from(value));
                idx += 1;
            }
            ("--store", Some(value)) => {
                options.store_path = Some(PathBuf::from(value));
                idx += 1;
            }
            _ => {}
        }
        idx += 1;
    }
    options
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(120);
    while !app.should_quit {
        terminal.draw(|frame| view::draw(frame, app))?;
        if event::poll(tick_rate)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = input::map_key(key);
                actions::dispatch(app, action);
            }
        }
        app.on_tick();
    }
    Ok(())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn ensure_interactive_terminal() -> Result<()> {
    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        return Ok(());
    }
    anyhow::bail!(
        "jigong-cui requires an interactive TTY (run directly in a terminal, not a piped/headless shell)"
    );
}
