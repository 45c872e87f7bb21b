//! Dashboard screen rendering
//!
//! Renders one panel per backend service from the latest aggregation
//! snapshot. Panels degrade visibly: a cached weather payload gets a badge
//! with its age, a stale one gets a warning line, and a fallback payload
//! shows its advisory message instead of data rows.

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use serde_json::Value;

use crate::app::App;
use crate::services::{SYSINFO_KEY, TIME_KEY, WEATHER_KEY};

/// Walks a path of object keys into a payload
fn field<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = payload;
    for part in path {
        current = current.get(part)?;
    }
    Some(current)
}

/// Renders a payload field as display text, with a placeholder for anything
/// missing or non-scalar
fn field_text(payload: &Value, path: &[&str]) -> String {
    match field(payload, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "N/A".to_string(),
    }
}

/// True when a payload is a pure fallback (error, but not a stale cache hit)
fn is_fallback(payload: &Value) -> bool {
    payload.get("error").is_some() && payload.get("stale").is_none()
}

/// A "Label: value" data row
fn data_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

/// Rows for a fallback payload: the advisory message plus the error detail
fn fallback_lines(payload: &Value) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            field_text(payload, &["message"]),
            Style::default().fg(Color::Red),
        )),
        Line::from(Span::styled(
            format!("({})", field_text(payload, &["error"])),
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

/// Placeholder row shown before the first snapshot lands
fn waiting_lines() -> Vec<Line<'static>> {
    vec![Line::from(Span::styled(
        "Waiting for data...",
        Style::default().fg(Color::DarkGray),
    ))]
}

/// Renders the dashboard screen
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state containing the latest snapshot
pub fn render_dashboard(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Header
            Constraint::Length(5), // Time panel
            Constraint::Length(8), // System info panel
            Constraint::Min(9),    // Weather panel
            Constraint::Length(1), // Help footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    render_time_panel(frame, app, chunks[1]);
    render_sysinfo_panel(frame, app, chunks[2]);
    render_weather_panel(frame, app, chunks[3]);
    render_help(frame, chunks[4], app);
}

/// Renders the title bar with the local time and refresh indicator
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            "SVCDASH",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            Local::now().format("%a %b %d, %H:%M:%S").to_string(),
            Style::default().fg(Color::White),
        ),
    ];

    if app.refreshing {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            "refreshing...",
            Style::default().fg(Color::Yellow),
        ));
    }

    let width = area.width as usize;
    let separator = "\u{2500}".repeat(width.saturating_sub(2));
    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(separator, Style::default().fg(Color::DarkGray))),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

/// Renders the time service panel
fn render_time_panel(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.service(TIME_KEY) {
        Some(payload) if is_fallback(payload) => fallback_lines(payload),
        Some(payload) => vec![
            data_line("Current Time", field_text(payload, &["timestamp"])),
            data_line("Service", field_text(payload, &["service"])),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(Color::Gray)),
                Span::styled("\u{25CF} Live", Style::default().fg(Color::Green)),
            ]),
        ],
        None => waiting_lines(),
    };

    let block = Block::default()
        .title(" Time Service ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the system-info service panel
fn render_sysinfo_panel(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.service(SYSINFO_KEY) {
        Some(payload) if is_fallback(payload) => fallback_lines(payload),
        Some(payload) => vec![
            data_line("Host Machine", field_text(payload, &["hostname"])),
            data_line("Container", field_text(payload, &["container_hostname"])),
            data_line(
                "Platform",
                format!(
                    "{} {}",
                    field_text(payload, &["platform"]),
                    field_text(payload, &["platform_release"])
                ),
            ),
            data_line("Architecture", field_text(payload, &["architecture"])),
            data_line(
                "CPU Cores",
                format!(
                    "{} ({} physical)",
                    field_text(payload, &["cpu_count"]),
                    field_text(payload, &["cpu_count_physical"])
                ),
            ),
            data_line(
                "Memory",
                format!(
                    "{} GB available / {} GB total ({}% used)",
                    field_text(payload, &["memory_available_gb"]),
                    field_text(payload, &["memory_total_gb"]),
                    field_text(payload, &["memory_percent"])
                ),
            ),
        ],
        None => waiting_lines(),
    };

    let block = Block::default()
        .title(" System Info Service ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the weather service panel, with cache badge and stale warning
fn render_weather_panel(frame: &mut Frame, app: &App, area: Rect) {
    let payload = app.service(WEATHER_KEY);

    // Badge mirrors the served payload's cache tags
    let title = match payload {
        Some(p) if p.get("cached") == Some(&Value::Bool(true)) => {
            match field(p, &["cache_age_seconds"]).and_then(Value::as_i64) {
                Some(age) => format!(" Weather Service \u{2500} CACHED ({}s old) ", age),
                None => " Weather Service \u{2500} CACHED ".to_string(),
            }
        }
        _ => " Weather Service ".to_string(),
    };

    let lines = match payload {
        Some(p) if is_fallback(p) => fallback_lines(p),
        Some(p) => {
            let mut lines = Vec::new();
            if p.get("stale") == Some(&Value::Bool(true)) {
                lines.push(Line::from(Span::styled(
                    "\u{26A0} Using cached data due to API error",
                    Style::default().fg(Color::Yellow),
                )));
            }
            lines.push(data_line(
                "Location",
                format!(
                    "{}, {}",
                    field_text(p, &["location", "city"]),
                    field_text(p, &["location", "country"])
                ),
            ));
            lines.push(data_line(
                "Condition",
                field_text(p, &["weather", "condition"]),
            ));
            lines.push(data_line(
                "Temperature",
                format!(
                    "{}\u{00B0}C ({}\u{00B0}F)",
                    field_text(p, &["weather", "temperature_c"]),
                    field_text(p, &["weather", "temperature_f"])
                ),
            ));
            lines.push(data_line(
                "Feels Like",
                format!("{}\u{00B0}C", field_text(p, &["weather", "feels_like_c"])),
            ));
            lines.push(data_line(
                "Humidity",
                format!("{}%", field_text(p, &["weather", "humidity"])),
            ));
            lines.push(data_line(
                "Wind Speed",
                format!("{} km/h", field_text(p, &["weather", "wind_speed_kmph"])),
            ));
            lines
        }
        None => waiting_lines(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the help footer with data freshness
fn render_help(frame: &mut Frame, area: Rect, app: &App) {
    let mut help_spans = vec![
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" Refresh  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" Quit"),
    ];

    if let Some(last_refresh) = app.last_refresh {
        let elapsed = Local::now() - last_refresh;
        let mins_ago = elapsed.num_minutes();
        let freshness_text = if mins_ago < 1 {
            " \u{2502} Data: just now".to_string()
        } else if mins_ago < 60 {
            format!(" \u{2502} Data: {}m ago", mins_ago)
        } else {
            format!(" \u{2502} Data: {}h ago", elapsed.num_hours())
        };
        help_spans.push(Span::styled(
            freshness_text,
            Style::default().fg(Color::DarkGray),
        ));
    }

    let paragraph =
        Paragraph::new(Line::from(help_spans)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
