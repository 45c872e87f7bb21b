//! Background data refresh system
//!
//! Re-runs the aggregation batch on a fixed interval (and on demand) in a
//! background task, delivering snapshots to the main application loop over a
//! tokio channel.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::services::Dashboard;

/// Messages sent from the background refresh task to the main app
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A refresh batch has started
    RefreshStarted,
    /// A refresh batch completed with these results
    Snapshot(HashMap<String, Value>),
}

/// Configuration for the background refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between automatic refreshes
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Triggers an immediate refresh
    request_tx: mpsc::Sender<()>,
    /// Signals shutdown
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the background refresh task for the given dashboard.
    ///
    /// The first automatic refresh fires one full interval after spawn; the
    /// initial load is the caller's responsibility, which keeps the loading
    /// screen honest.
    pub fn spawn(dashboard: Dashboard, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (request_tx, mut request_rx) = mpsc::channel::<()>(1);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the immediate first tick
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            run_refresh(&dashboard, &msg_tx).await;
                        }
                        Some(()) = request_rx.recv() => {
                            run_refresh(&dashboard, &msg_tx).await;
                            // A manual refresh restarts the automatic clock
                            interval.reset();
                        }
                        _ = shutdown_rx.recv() => {
                            debug!("refresh task shutting down");
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            request_tx,
            shutdown_tx,
        }
    }

    /// Requests an immediate refresh; coalesces with one already pending
    pub fn request_refresh(&self) {
        let _ = self.request_tx.try_send(());
    }

    /// Shuts down the background refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Runs one aggregation batch and delivers its messages
async fn run_refresh(dashboard: &Dashboard, tx: &mpsc::Sender<RefreshMessage>) {
    let _ = tx.send(RefreshMessage::RefreshStarted).await;
    let results = dashboard.snapshot().await;
    let _ = tx.send(RefreshMessage::Snapshot(results)).await;
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
