//! Terminal UI rendering
//!
//! Renders the aggregated service data into the dashboard view.

mod dashboard;

pub use dashboard::render_dashboard;
