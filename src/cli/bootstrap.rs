//! CLI bootstrap: settings, logging, session store, transport, dashboard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::dashboard::Dashboard;
use crate::session::{FileSessionStore, SessionProvider};
use crate::settings::{DashboardSettings, SettingsManager};
use crate::transport::{HttpTransport, ReqwestTransport};

use super::args::Args;

/// Everything a command needs.
pub struct CliContext {
    pub settings: DashboardSettings,
    pub dashboard: Dashboard,
    pub args: Args,
}

impl CliContext {
    pub fn shutdown(self) {
        self.dashboard.stop();
    }
}

pub async fn initialize(args: &Args) -> Result<CliContext> {
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env is fine
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("[cli] Failed to load .env file: {}", e);
        }
    }

    let settings_manager = match &args.config {
        Some(path) => SettingsManager::with_path(path.clone())
            .await
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => SettingsManager::new()
            .await
            .context("Failed to initialize settings manager")?,
    };

    let created = settings_manager.ensure_settings_file().await;
    let settings = settings_manager.get();

    init_logging(args.verbose, &settings.advanced.log_level)?;

    match created {
        Ok(true) => tracing::info!(
            "Wrote settings template to {}",
            settings_manager.path().display()
        ),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to create settings template: {}", e),
    }

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
        eprintln!("[cli] API: {}", settings.api.base_url);
    }

    let store: Arc<dyn SessionProvider> = Arc::new(match &settings.session.path {
        Some(path) => FileSessionStore::open(path),
        None => FileSessionStore::open_default(),
    });

    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::with_timeout(settings.api.request_timeout_secs.map(Duration::from_secs))
            .context("Failed to build HTTP client")?,
    );

    let dashboard =
        Dashboard::new(&settings, transport, store).context("Failed to build dashboard")?;

    Ok(CliContext {
        settings,
        dashboard,
        args: args.clone(),
    })
}

/// `--verbose` wins over `advanced.log_level`.
fn init_logging(verbose: bool, configured: &str) -> Result<()> {
    let level = if verbose { "debug" } else { configured };
    let directive: tracing_subscriber::filter::Directive = format!("homedash={}", level)
        .parse()
        .with_context(|| format!("Invalid log level {:?}", level))?;

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .try_init();
    Ok(())
}
