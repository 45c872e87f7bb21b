//! svcdash - aggregated microservices dashboard
//!
//! A terminal application that fans a refresh out to the time, system-info,
//! and weather backend services concurrently and renders the combined view,
//! falling back to cached or substitute data when a service is slow or down.

mod aggregate;
mod app;
mod cache;
mod cli;
mod refresh;
mod services;
mod ui;

use std::io;
use std::panic;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use serde_json::Value;
use tracing_subscriber::{prelude::*, EnvFilter};

use app::{App, AppState};
use cli::{Cli, StartupConfig};
use refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use services::Dashboard;

/// Initializes the tracing subscriber.
///
/// One-shot mode logs to stderr; stdout is reserved for the JSON output. In
/// TUI mode no writer layer is installed, since stray log lines would
/// scribble over the alternate screen.
fn init_tracing(one_shot: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if one_shot {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::registry().with(filter).init();
    }
}

/// Sets up a panic hook that restores the terminal before printing the panic
/// message. This ensures the terminal is usable even if the application
/// panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match app.state {
        AppState::Loading => render_loading(frame),
        AppState::Dashboard => ui::render_dashboard(frame, app),
    }
}

/// Renders a loading message while the first batch is in flight
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Contacting services...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

/// Runs one aggregation batch and prints it as a JSON object to stdout
async fn run_json(dashboard: Dashboard) -> Result<(), Box<dyn std::error::Error>> {
    let results = dashboard.snapshot().await;

    let mut output = serde_json::Map::new();
    output.insert("dashboard".to_string(), Value::from("svcdash"));
    for (key, value) in results {
        output.insert(key, value);
    }

    println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };

    init_tracing(config.json);
    let dashboard = Dashboard::new(&config.urls);

    if config.json {
        return run_json(dashboard).await;
    }

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();

    // Initial render to show loading state
    terminal.draw(|f| render_ui(f, &app))?;

    // Initial load in the foreground, then hand the dashboard to the
    // background refresh loop
    app.apply_snapshot(dashboard.snapshot().await);
    let mut refresh_handle = RefreshHandle::spawn(
        dashboard,
        RefreshConfig {
            interval: config.refresh_interval,
            enabled: true,
        },
    );

    // Main event loop
    loop {
        terminal.draw(|f| render_ui(f, &app))?;

        // Drain any snapshots the background refresh has delivered
        while let Some(message) = refresh::try_recv(&mut refresh_handle) {
            match message {
                RefreshMessage::RefreshStarted => app.refreshing = true,
                RefreshMessage::Snapshot(results) => app.apply_snapshot(results),
            }
        }

        if app.refresh_requested {
            app.refresh_requested = false;
            refresh_handle.request_refresh();
        }

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    refresh_handle.shutdown().await;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
