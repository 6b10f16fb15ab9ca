//! Centralized TOML-based settings for the dashboard.
//!
//! Settings are loaded from `~/.homedash/settings.toml` with environment variable
//! interpolation support. `$HOMEDASH_API_URL` overrides the backend URL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use homedash_lib::settings::SettingsManager;
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get();
//! println!("{}", settings.api.base_url);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{first_env_var, homedash_dir, settings_path, SettingsManager};
pub use schema::{
    AdvisorySettings, ApiSettings, DashboardSettings, SensorSettings, ShoppingListSettings,
    WeatherSettings,
};
