//! Ephemeral stories in the terminal.
//!
//! Browse a tray of stories that expire after a few hours, watch them in a
//! timed viewer, react, reply and share your own.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line protocol suitable for automated testing:
//!
//! ```bash
//! printf '#list\n#open 0\n#tick 70\n#quit\n' | cargo run -p stories -- --headless
//! ```

mod app;
mod config;
mod creation;
mod effects;
mod events;
mod headless;
mod ui;

use crossterm::{
    event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::time::Instant;
use stories_core::{SessionConfig, StorySession};
use tracing::{error, info};

use app::App;
use config::Options;
use events::{handle_event, EventResult};
use ui::render::render;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let options = match Options::from_env() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage.");
            std::process::exit(2);
        }
    };

    if options.help {
        config::print_help();
        return Ok(());
    }

    let session_config = SessionConfig::new()
        .with_data_dir(options.data_dir.clone())
        .with_playback(options.playback());

    if options.headless {
        config::init_stderr_logging();
        let session = StorySession::new(session_config).await;
        return headless::run_headless(session).await.map_err(|e| e.into());
    }

    if let Err(e) = config::init_file_logging(&options.log_path()) {
        eprintln!(
            "Warning: could not open log file {}: {e}",
            options.log_path().display()
        );
    }
    info!(data_dir = %options.data_dir.display(), "starting");

    let session = StorySession::new(session_config).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session)).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!(error = %e, "terminal loop failed");
        eprintln!("Error: {e}");
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &mut app))?;

        // Deliver playback ticks before blocking on input
        let now = Instant::now();
        if let Some(timer) = app.due_timer(now) {
            app.deliver_tick(timer).await;
            continue;
        }

        if event::poll(app.poll_timeout(now))? {
            match handle_event(&mut app, event::read()?) {
                EventResult::Quit => {
                    app.session.close_viewer().await;
                    return Ok(());
                }
                EventResult::Perform(action) => app.perform(action).await,
                EventResult::NeedsRedraw | EventResult::Continue => {}
            }
        }
    }
}
