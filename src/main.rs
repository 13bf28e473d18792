use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io;

use mememanager::app::App;
use mememanager::assets::AssetStore;
use mememanager::config::{Config, CONFIG_ENV};
use mememanager::db::Database;
use mememanager::logging::{self, LOG_ENV};

fn print_usage() {
    eprintln!(
        r#"mememanager - TUI for importing, tagging and searching meme images

USAGE:
    mememanager

ENVIRONMENT:
    {}   Path to config file (overrides default location)
    {}      Log filter (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/mememanager/config.toml"#,
        CONFIG_ENV, LOG_ENV
    );
}

fn main() -> Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        eprintln!("Unknown argument: {}", arg);
        print_usage();
        std::process::exit(1);
    }

    // Best effort: the UI still runs if no subscriber can be installed
    let _ = logging::init(Some(Config::config_dir().join("logs")));

    let config = Config::load()?;

    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;
    db.initialize()?;

    let assets = AssetStore::new(&config.storage, &config.thumbnails)
        .context("Failed to prepare image storage")?;

    let mut app = App::new(db, assets)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}
