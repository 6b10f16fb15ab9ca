//! CLI output: widget states as terminal text or JSON lines.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::derived::Trend;
use crate::fetch::{ListEntity, WeatherReport};
use crate::widget::{SensorView, WidgetState};

/// One-line terminal rendering of a ready view.
pub trait Summary {
    fn summary(&self) -> String;
}

impl Summary for SensorView {
    fn summary(&self) -> String {
        let arrow = match self.derived.trend {
            Trend::Increase => "↑",
            Trend::Decrease => "↓",
            Trend::Stable => "→",
            Trend::Unknown => "·",
        };
        let flag = if self.derived.is_low_value { " (low)" } else { "" };
        format!(
            "{}: {} {}{} | {} | {}",
            self.label.as_deref().unwrap_or("Sensor"),
            self.derived.current.value,
            arrow,
            flag,
            self.derived.freshness_bucket,
            self.derived.advisory
        )
    }
}

impl Summary for WeatherReport {
    fn summary(&self) -> String {
        let mut line = format!(
            "{}: {:.1}°C, {}, wind {:.1} km/h",
            self.location, self.temperature, self.condition.description, self.windspeed
        );
        if let Some(outdoor) = &self.outdoor {
            line.push_str(&format!(
                " | outdoor {:.1}°C, {:.1}% humidity",
                outdoor.temperature, outdoor.humidity
            ));
        }
        line
    }
}

impl Summary for ListEntity {
    fn summary(&self) -> String {
        let mut text = format!("{} ({} items)", self.title, self.entries.len());
        for entry in &self.entries {
            text.push_str(&format!("\n  - [{}] {}", entry.id, entry.content));
        }
        text
    }
}

/// Render one state change.
pub fn render_state<T: Serialize + Summary>(
    widget: &str,
    state: &WidgetState<T>,
    json_mode: bool,
) -> Result<String> {
    if json_mode {
        let line = serde_json::json!({
            "type": "state",
            "widget": widget,
            "state": state,
        });
        return Ok(serde_json::to_string(&line)?);
    }

    Ok(match state {
        WidgetState::Loading => format!("[{}] loading...", widget),
        WidgetState::Error(err) => format!("[{}] error: {}", widget, err.message),
        WidgetState::Empty => format!("[{}] nothing to show", widget),
        WidgetState::Ready(view) => format!("[{}] {}", widget, view.summary()),
    })
}

pub fn print_state<T: Serialize + Summary>(
    widget: &str,
    state: &WidgetState<T>,
    json_mode: bool,
) -> Result<()> {
    println!("{}", render_state(widget, state, json_mode)?);
    io::stdout().flush()?;
    Ok(())
}

/// Print the current state and every change until `cancel` fires.
pub async fn follow<T>(
    widget: &str,
    mut rx: watch::Receiver<WidgetState<T>>,
    json_mode: bool,
    cancel: CancellationToken,
) -> Result<()>
where
    T: Serialize + Summary + Clone,
{
    loop {
        let state = rx.borrow_and_update().clone();
        print_state(widget, &state, json_mode)?;

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Plain message, or `{"type": kind, "message": ...}` in JSON mode.
pub fn print_message(kind: &str, message: &str, json_mode: bool) -> Result<()> {
    if json_mode {
        let line = serde_json::json!({ "type": kind, "message": message });
        println!("{}", serde_json::to_string(&line)?);
    } else {
        println!("{}", message);
    }
    io::stdout().flush()?;
    Ok(())
}
