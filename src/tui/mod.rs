//! Terminal User Interface Module
//!
//! Terminal front-end for the MediSia literature search service.
//! Built with Ratatui for high-performance terminal rendering.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  🩺 MediSia Literature Search             http://127.0.0.1:8000 │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  /search                      /results                          │
//! │  ┌─ Search ──────────────┐    ┌─ Search ──────────────────────┐ │
//! │  │ sepsis                │    │ Query: sepsis                 │ │
//! │  └───────────────────────┘    │ ✓ 23 results                  │ │
//! │  [ ] Deep  [x] Advanced       └───────────────────────────────┘ │
//! │  ┌─ Topics ──────────────┐    ┌─ Results ─────────────────────┐ │
//! │  │ immunology            │    │ ▶ 1. Title  [medicine]        │ │
//! │  └───────────────────────┘    │      Authors, journal, year   │ │
//! │                               └────────────── Page 1 of 3 ────┘ │
//! │  [Enter] Search | [Tab] Next field | [Ctrl+Q] Quit | [F1] Help │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Filter modals (journal, topic, year) open over the results view.

pub mod app;
pub mod event;
pub mod filter;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, Overlay, Route};
pub use event::{AppAction, EventHandler};
pub use filter::{FacetKind, FilterModal};

use crate::config::Config;
use crate::search::SearchSession;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application, starting at `route`
pub async fn run(config: Config, route: Route) -> anyhow::Result<()> {
    info!(api = %config.api.base_url, "Starting TUI mode");

    let session = SearchSession::from_config(&config)?;

    // Initialize terminal
    let mut terminal = init_terminal()?;

    // Create application state
    let mut app = App::new(config, session);
    app.navigate(route);

    // Create event handler
    let mut events = EventHandler::new(std::time::Duration::from_millis(100));

    // Main loop
    let result = run_app(&mut terminal, &mut app, &mut events).await;

    // Restore terminal
    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        // Pick up results before drawing
        app.poll_events();

        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            action = events.next() => match action {
                Some(action) => app.handle_action(action),
                None => break,
            },
            alive = app.state_changed() => {
                if !alive {
                    error!("Result pipeline stopped");
                    break;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
