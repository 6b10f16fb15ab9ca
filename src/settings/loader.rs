//! Settings loading and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.homedash/settings.toml`
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - First-run template generation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::schema::DashboardSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Directory holding settings and the persisted session.
pub fn homedash_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".homedash")
}

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    homedash_dir().join("settings.toml")
}

/// Loads settings once and hands out copies.
pub struct SettingsManager {
    /// Settings with env vars resolved
    settings: DashboardSettings,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager, loading from the default location.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Create a SettingsManager backed by a specific file.
    pub async fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = Self::load_from_path(&path).await?;

        Ok(Self { settings, path })
    }

    /// Load settings from a specific path.
    async fn load_from_path(path: &Path) -> Result<DashboardSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            let mut settings = DashboardSettings::default();
            Self::apply_env_overrides(&mut settings);
            return Ok(settings);
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;

        let mut settings: DashboardSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        Self::resolve_env_vars(&mut settings);
        Self::apply_env_overrides(&mut settings);

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    fn resolve_env_vars(settings: &mut DashboardSettings) {
        fn resolve(value: &mut String) {
            if let Some(resolved) = resolve_env_ref(value) {
                *value = resolved;
            }
        }

        fn resolve_opt(value: &mut Option<String>) {
            if let Some(v) = value {
                resolve(v);
            }
        }

        resolve(&mut settings.api.base_url);
        resolve_opt(&mut settings.session.path);
        resolve(&mut settings.weather.city);
        resolve(&mut settings.weather.geocode_url);
        resolve(&mut settings.weather.forecast_url);
        resolve(&mut settings.shopping_list.list_id);
    }

    /// `$HOMEDASH_API_URL` wins over the file when set.
    fn apply_env_overrides(settings: &mut DashboardSettings) {
        if let Some(url) = first_env_var(&["HOMEDASH_API_URL"]) {
            settings.api.base_url = url;
        }
    }

    /// Get the loaded settings.
    pub fn get(&self) -> DashboardSettings {
        self.settings.clone()
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true)
    }
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
/// Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    if let Some(rest) = trimmed.strip_prefix('$') {
        let var_name = rest
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(rest);

        return std::env::var(var_name).ok();
    }

    None
}

/// First non-empty value among `env_vars`.
pub fn first_env_var(env_vars: &[&str]) -> Option<String> {
    env_vars
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}
