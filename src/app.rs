//! Application state management
//!
//! Holds the latest aggregation results and handles keyboard input and state
//! transitions for the dashboard view.

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use serde_json::Value;
use std::collections::HashMap;

/// Application state enum representing the current view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state while the first batch is in flight
    Loading,
    /// The dashboard view showing all service panels
    Dashboard,
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    /// Latest aggregation results keyed by service
    pub results: HashMap<String, Value>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Timestamp of the last applied snapshot
    pub last_refresh: Option<DateTime<Local>>,
    /// Flag indicating a manual refresh has been requested
    pub refresh_requested: bool,
    /// Whether a refresh batch is currently in flight
    pub refreshing: bool,
}

impl App {
    /// Creates a new App instance in the loading state
    pub fn new() -> Self {
        Self {
            state: AppState::Loading,
            results: HashMap::new(),
            should_quit: false,
            last_refresh: None,
            refresh_requested: false,
            refreshing: false,
        }
    }

    /// Applies a completed aggregation snapshot and shows the dashboard
    pub fn apply_snapshot(&mut self, results: HashMap<String, Value>) {
        self.results = results;
        self.last_refresh = Some(Local::now());
        self.refreshing = false;
        self.state = AppState::Dashboard;
    }

    /// Returns the latest payload for a service key, if any
    pub fn service(&self, key: &str) -> Option<&Value> {
        self.results.get(key)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `r`: Request an immediate data refresh
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        match self.state {
            AppState::Loading => {
                // Only quit is allowed while the first batch is loading
                if key_event.code == KeyCode::Char('q') {
                    self.should_quit = true;
                }
            }
            AppState::Dashboard => match key_event.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    self.should_quit = true;
                }
                KeyCode::Char('r') => {
                    self.refresh_requested = true;
                }
                _ => {}
            },
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
