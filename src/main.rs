use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use flag_map::app::{App, PassResult};
use flag_map::config::{Args, MAX_YEAR, MIN_YEAR};
use flag_map::data::{self, LanguageTable};
use flag_map::image_cache::{FileImageLoader, ImageCache};
use flag_map::map::TerminalSurface;
use flag_map::render::Coordinator;
use flag_map::resolver::Resolver;
use flag_map::selection::Selection;
use flag_map::ui;
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

type MapApp = App<FileImageLoader>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let table = LanguageTable::load(&args.dataset_path())?;
    let countries = data::load_borders(&args.borders_path())?;
    info!(countries = countries.len(), records = table.len(), "data loaded");

    // Flag URLs are relative to the data directory
    let coordinator = Coordinator::new(
        Arc::new(ImageCache::new(FileImageLoader::new(&args.data_dir))),
        Arc::new(Mutex::new(TerminalSurface::new(0, 0))),
        Arc::new(Resolver::new(table)),
        Arc::new(countries),
    );
    coordinator.install_base_layers()?;
    let mut app = App::new(coordinator, Selection::from_query(&args.query));

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &mut app).await;

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    // Reopen the same view with --query
    println!("?{}", app.query());
    result
}

fn init_logging(args: &Args) -> Result<()> {
    let file = File::create(&args.log).with_context(|| format!("creating log file {}", args.log.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

async fn run(terminal: &mut DefaultTerminal, app: &mut MapApp) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let (tx, mut rx) = mpsc::unbounded_channel();
    spawn_pass(app, &tx);

    let mut events = EventStream::new();
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(event)) => handle_event(app, event, &tx),
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
            Some(result) = rx.recv() => app.finish_pass(result),
        }
    }

    Ok(())
}

/// Start a render pass for the current selection; its outcome comes back on `tx`
fn spawn_pass(app: &mut MapApp, tx: &UnboundedSender<PassResult>) {
    let selection = app.begin_pass();
    let coordinator = app.coordinator().clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = coordinator.render_pass(selection).await;
        let _ = tx.send(result);
    });
}

fn handle_event(app: &mut MapApp, event: Event, tx: &UnboundedSender<PassResult>) {
    match event {
        // Only handle key press events (not release)
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key, tx),
        Event::Mouse(mouse) => handle_mouse(app, mouse),
        Event::Resize(width, height) => app.resize(width, height),
        _ => {}
    }
}

fn handle_key(app: &mut MapApp, key: KeyEvent, tx: &UnboundedSender<PassResult>) {
    let changed = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit();
            false
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => {
            app.pan(-8, 0);
            false
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.pan(8, 0);
            false
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.pan(0, -6);
            false
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.pan(0, 6);
            false
        }

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.zoom_in();
            false
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            app.zoom_out();
            false
        }

        // Year and rank
        KeyCode::Char('[') | KeyCode::Char('<') => app.step_year(-1),
        KeyCode::Char(']') | KeyCode::Char('>') => app.step_year(1),
        KeyCode::Home => app.set_year(MIN_YEAR),
        KeyCode::End => app.set_year(MAX_YEAR),
        KeyCode::Char('1') => app.set_rank(1),
        KeyCode::Char('2') => app.set_rank(2),

        _ => false,
    };

    if changed {
        spawn_pass(app, tx);
    }
}

/// Handle mouse events for panning, zooming and hover
fn handle_mouse(app: &mut MapApp, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel zooms towards the pointer
        MouseEventKind::ScrollUp => app.zoom_at(mouse.column, mouse.row, 1.5),
        MouseEventKind::ScrollDown => app.zoom_at(mouse.column, mouse.row, 1.0 / 1.5),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-8, 0),
        MouseEventKind::ScrollRight => app.pan(8, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.clear_hover();
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        MouseEventKind::Moved => app.hover_at(mouse.column, mouse.row),
        _ => {}
    }
}
