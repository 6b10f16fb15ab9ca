//! Derived state computed from the newest reading and the previous derived state.
//!
//! Everything here is pure: given the same inputs and the same `now`, the
//! engine produces the same [`DerivedState`].

pub mod weather_codes;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fetch::Reading;
use crate::settings::AdvisorySettings;

/// Direction of change against the previous reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increase,
    Decrease,
    Stable,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryLevel {
    High,
    Low,
    Nominal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedState {
    pub current: Reading,
    pub previous: Option<Reading>,
    pub trend: Trend,
    pub freshness_bucket: String,
    pub advisory: String,
    pub advisory_level: AdvisoryLevel,
    /// Presentation hint only
    pub is_low_value: bool,
}

impl DerivedState {
    /// Recompute the freshness label for a later render.
    pub fn freshness_at(&self, now: DateTime<Utc>) -> String {
        freshness_bucket(self.current.timestamp, now)
    }
}

/// Break points and messages for [`DerivedStateEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryConfig {
    pub high_threshold: f64,
    pub low_threshold: f64,
    pub low_value_threshold: f64,
    pub high_message: String,
    pub low_message: String,
    pub nominal_message: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        AdvisorySettings::default().into()
    }
}

impl From<AdvisorySettings> for AdvisoryConfig {
    fn from(settings: AdvisorySettings) -> Self {
        Self {
            high_threshold: settings.high_threshold,
            low_threshold: settings.low_threshold,
            low_value_threshold: settings.low_value_threshold,
            high_message: settings.high_message,
            low_message: settings.low_message,
            nominal_message: settings.nominal_message,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DerivedStateEngine {
    config: AdvisoryConfig,
}

impl DerivedStateEngine {
    pub fn new(config: AdvisoryConfig) -> Self {
        Self { config }
    }

    /// [`Self::update_at`] against the wall clock.
    pub fn update(&self, previous: Option<&DerivedState>, incoming: Reading) -> DerivedState {
        self.update_at(previous, incoming, Utc::now())
    }

    pub fn update_at(
        &self,
        previous: Option<&DerivedState>,
        incoming: Reading,
        now: DateTime<Utc>,
    ) -> DerivedState {
        let previous = previous.map(|p| p.current.clone());
        let trend = trend(previous.as_ref().map(|p| p.value), incoming.value);
        let (advisory_level, advisory) = self.advisory(incoming.value);

        DerivedState {
            freshness_bucket: freshness_bucket(incoming.timestamp, now),
            is_low_value: incoming.value < self.config.low_value_threshold,
            advisory: advisory.to_string(),
            advisory_level,
            trend,
            previous,
            current: incoming,
        }
    }

    pub fn advisory(&self, value: f64) -> (AdvisoryLevel, &str) {
        if value > self.config.high_threshold {
            (AdvisoryLevel::High, &self.config.high_message)
        } else if value < self.config.low_threshold {
            (AdvisoryLevel::Low, &self.config.low_message)
        } else {
            (AdvisoryLevel::Nominal, &self.config.nominal_message)
        }
    }
}

pub fn trend(previous: Option<f64>, incoming: f64) -> Trend {
    match previous {
        None => Trend::Unknown,
        Some(prev) if incoming > prev => Trend::Increase,
        Some(prev) if incoming < prev => Trend::Decrease,
        Some(prev) if incoming == prev => Trend::Stable,
        // NaN on either side
        Some(_) => Trend::Unknown,
    }
}

/// "Just now" under a minute (future timestamps included), else "<N> min ago".
pub fn freshness_bucket(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        "Just now".to_string()
    } else {
        format!("{} min ago", minutes)
    }
}
