//! Settings schema definitions for the dashboard.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::poller::PollInterval;

/// Root settings structure.
///
/// Loaded from `~/.homedash/settings.toml` with environment variable interpolation support.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Backend API configuration
    pub api: ApiSettings,

    /// Session persistence
    pub session: SessionSettings,

    /// Light sensor widget
    pub sensor: SensorSettings,

    /// Advisory thresholds for the light sensor
    pub advisory: AdvisorySettings,

    /// Weather widget
    pub weather: WeatherSettings,

    /// Shopping list widget
    pub shopping_list: ShoppingListSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Backend API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the dashboard backend (supports $ENV_VAR syntax)
    pub base_url: String,

    /// Per-request timeout enforced by the HTTP client (unset = none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionSettings {
    /// Session file override (defaults to ~/.homedash/session.json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Sensor widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Sensor identifier on the backend
    pub sensor_id: u32,

    /// Field of each data row holding the measured value
    pub value_field: String,

    /// Refresh interval; absent or 0 fetches once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

/// Break points and messages for the advisory text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorySettings {
    /// Values strictly above this get the high advisory
    pub high_threshold: f64,

    /// Values strictly below this get the low advisory
    pub low_threshold: f64,

    /// Values strictly below this are flagged as low
    pub low_value_threshold: f64,

    pub high_message: String,
    pub low_message: String,
    pub nominal_message: String,
}

/// Weather widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// City resolved through the geocoding endpoint
    pub city: String,

    /// Public geocoding endpoint
    pub geocode_url: String,

    /// Public forecast endpoint
    pub forecast_url: String,

    /// Backend sensor providing outdoor temperature and humidity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdoor_sensor_id: Option<u32>,

    /// Refresh interval; absent or 0 fetches once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

/// Shopping list widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShoppingListSettings {
    /// List identifier on the backend
    pub list_id: String,

    /// Refresh interval; absent or 0 fetches once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

impl SensorSettings {
    pub fn poll_interval(&self) -> PollInterval {
        PollInterval::from_millis(self.poll_interval_ms)
    }
}

impl WeatherSettings {
    pub fn poll_interval(&self) -> PollInterval {
        PollInterval::from_millis(self.poll_interval_ms)
    }
}

impl ShoppingListSettings {
    pub fn poll_interval(&self) -> PollInterval {
        PollInterval::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            version: 1,
            api: ApiSettings::default(),
            session: SessionSettings::default(),
            sensor: SensorSettings::default(),
            advisory: AdvisorySettings::default(),
            weather: WeatherSettings::default(),
            shopping_list: ShoppingListSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/".to_string(),
            request_timeout_secs: None,
        }
    }
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            sensor_id: 737,
            value_field: "lux".to_string(),
            poll_interval_ms: Some(30_000),
        }
    }
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            high_threshold: 800.0,
            low_threshold: 100.0,
            low_value_threshold: 50.0,
            high_message: "Very bright! Consider dimming lights.".to_string(),
            low_message: "Dim lighting detected.".to_string(),
            nominal_message: "Light level looks good!".to_string(),
        }
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            city: "Sydney".to_string(),
            geocode_url: "https://geocoding-api.open-meteo.com/v1/search".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            outdoor_sensor_id: Some(1690),
            poll_interval_ms: None,
        }
    }
}

impl Default for ShoppingListSettings {
    fn default() -> Self {
        Self {
            list_id: "1".to_string(),
            poll_interval_ms: None,
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
