mod analysis;
mod app;
mod config;
mod epoch;
mod error;
mod persist;
mod report;
mod tree;
mod ui;

use anyhow::{Context, Result};
use app::{App, InputMode};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Terminal UI for grouping recorded epochs into a tree and selecting them
#[derive(Parser)]
#[command(name = "etree", version, about)]
struct Cli {
    /// Epoch dataset (JSON export)
    data: PathBuf,

    /// Grouping keys, comma-separated, outermost first (e.g. 'cell.type,@date')
    #[arg(long)]
    keys: Option<String>,

    /// Selection file to restore and save (defaults to <DATA>.selection.json)
    #[arg(long)]
    selection: Option<PathBuf>,

    /// Print the grouped tree and exit
    #[arg(long)]
    print: bool,

    /// Append logs to this file (the TUI discards them otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli)?;

    let data_dir = cli
        .data
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = config::load_config(data_dir);

    // --keys overrides the configured grouping
    let key_list = cli
        .keys
        .clone()
        .unwrap_or_else(|| config.grouping.keys.join(","));
    let keys = tree::GroupingKey::parse_list(&key_list)?;

    let store = epoch::load_store(&cli.data)?;
    if store.is_empty() {
        log::warn!("{} contains no epochs", cli.data.display());
    }
    let mut model = tree::TreeModel::new(store, keys)
        .with_context(|| format!("Failed to group {}", cli.data.display()))?;

    // Restore the saved selection before anything is drawn
    let selection_path = cli
        .selection
        .clone()
        .unwrap_or_else(|| persist::default_selection_path(&cli.data));
    let mut startup_message = None;
    match persist::load_selection(&selection_path) {
        Ok(Some(file)) => {
            let applied = file.apply(&mut model);
            log::info!("restored {} selections from {}", applied, selection_path.display());
        }
        Ok(None) => {}
        Err(e) => {
            log::warn!("{:#}", e);
            startup_message = Some(format!("Selection not restored: {}", e));
        }
    }

    if cli.print {
        let text = report::render_text(
            &model,
            usize::from(config.display.indent_width),
            config.display.show_counts,
        )?;
        io::stdout().write_all(text.as_bytes())?;
        return Ok(());
    }

    let mut app = App::new(model, config, cli.data.clone(), selection_path);
    if let Some(msg) = startup_message {
        app.notify(&msg);
    }

    // Leave the terminal usable if a debug-build invariant check fires
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        default_hook(info);
    }));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// `RUST_LOG` controls the level (default `warn`). The TUI owns the
/// terminal, so without `--log-file` interactive runs drop log output.
fn init_logger(cli: &Cli) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = &cli.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if !cli.print {
        builder.target(env_logger::Target::Pipe(Box::new(io::sink())));
    }
    builder.init();
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Poll with a timeout so notifications can expire between events
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.input_mode {
                    InputMode::Grouping => handle_grouping_input(app, key),
                    InputMode::Normal => handle_normal_input(app, key),
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                _ => {}
            }
        }

        // Tick: used for auto-clearing notifications
        app.tick();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // Cursor movement follows draw order
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => app.page(true),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => app.page(false),
        KeyCode::PageDown => app.page(true),
        KeyCode::PageUp => app.page(false),
        KeyCode::Home => app.cursor_first(),
        KeyCode::End | KeyCode::Char('G') => app.cursor_last(),

        // Expansion
        KeyCode::Char('h') | KeyCode::Left => app.collapse(),
        KeyCode::Char('l') | KeyCode::Right => app.expand(),
        KeyCode::Enter => app.toggle_expanded(),

        // Selection
        KeyCode::Char(' ') => app.toggle_checked(),
        KeyCode::Char('a') => app.select_all(true),
        KeyCode::Char('n') => app.select_all(false),
        KeyCode::Char('s') => app.save_selection(),

        KeyCode::Char('g') => app.start_grouping(),
        _ => {}
    }
}

fn handle_grouping_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            let list = app.grouping_input.clone();
            if app.apply_grouping(&list) {
                app.input_mode = InputMode::Normal;
                app.grouping_input.clear();
            }
        }
        KeyCode::Esc => app.cancel_grouping(),
        KeyCode::Up => app.recall_grouping(),
        KeyCode::Char(c) => app.grouping_input.push(c),
        KeyCode::Backspace => {
            app.grouping_input.pop();
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.input_mode == InputMode::Normal {
                let additive = mouse.modifiers.contains(KeyModifiers::CONTROL);
                app.click(mouse.column, mouse.row, additive);
            }
        }
        MouseEventKind::ScrollDown => app.move_cursor(3),
        MouseEventKind::ScrollUp => app.move_cursor(-3),
        _ => {}
    }
}
