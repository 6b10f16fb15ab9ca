//! Owner of the widget set.
//!
//! Builds every widget from settings, drives their lifecycle, and restarts
//! them whenever the session changes.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::error::{DashboardError, Result};
use crate::session::{self, LoginError, Session, SessionEvent, SessionHub, SessionProvider};
use crate::settings::DashboardSettings;
use crate::transport::HttpTransport;
use crate::widget::{SensorWidget, ShoppingListWidget, WeatherWidget};

pub struct Widgets {
    pub sensor: SensorWidget,
    pub weather: WeatherWidget,
    pub shopping_list: ShoppingListWidget,
}

impl Widgets {
    fn start_all(&self) {
        self.sensor.start();
        self.weather.start();
        self.shopping_list.start();
    }

    fn stop_all(&self) {
        self.sensor.stop();
        self.weather.stop();
        self.shopping_list.stop();
    }
}

pub struct Dashboard {
    sessions: Arc<SessionHub>,
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    widgets: Arc<Widgets>,
    listener: Mutex<Option<CancellationToken>>,
}

impl Dashboard {
    pub fn new(
        settings: &DashboardSettings,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionProvider>,
    ) -> Result<Self> {
        let base_url = settings.api.base_url.clone();
        url::Url::parse(&base_url).map_err(|e| {
            DashboardError::Settings(format!("invalid api.base_url {:?}: {}", base_url, e))
        })?;

        let sessions = Arc::new(SessionHub::new(store));
        let provider: Arc<dyn SessionProvider> = sessions.clone();

        let widgets = Widgets {
            sensor: SensorWidget::from_settings(
                transport.clone(),
                provider.clone(),
                &base_url,
                &settings.sensor,
                &settings.advisory,
            ),
            weather: WeatherWidget::from_settings(
                transport.clone(),
                provider.clone(),
                &base_url,
                &settings.weather,
            ),
            shopping_list: ShoppingListWidget::from_settings(
                transport.clone(),
                provider,
                &base_url,
                &settings.shopping_list,
            ),
        };

        Ok(Self {
            sessions,
            transport,
            base_url,
            widgets: Arc::new(widgets),
            listener: Mutex::new(None),
        })
    }

    pub fn widgets(&self) -> &Widgets {
        &self.widgets
    }

    pub fn sessions(&self) -> &SessionHub {
        &self.sessions
    }

    /// Start every widget and follow session changes until [`Self::stop`].
    pub fn start(&self) {
        let mut listener = self.listener.lock();
        if let Some(previous) = listener.take() {
            previous.cancel();
        }

        self.widgets.start_all();

        let token = CancellationToken::new();
        let cancel = token.clone();
        let widgets = self.widgets.clone();
        let mut events = self.sessions.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(SessionEvent::LoggedIn { display_name }) => {
                            tracing::info!("Session changed to {}, restarting widgets", display_name);
                            widgets.start_all();
                        }
                        Ok(SessionEvent::LoggedOut) => {
                            tracing::info!("Logged out, restarting widgets");
                            widgets.start_all();
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Missed {} session events, restarting widgets", skipped);
                            widgets.start_all();
                        }
                        Err(RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!("Session listener finished");
        });

        *listener = Some(token);
    }

    pub fn stop(&self) {
        if let Some(token) = self.listener.lock().take() {
            token.cancel();
        }
        self.widgets.stop_all();
    }

    pub async fn login(&self, username: &str, password: &str) -> std::result::Result<Session, LoginError> {
        session::login(
            self.transport.as_ref(),
            self.sessions.as_ref(),
            &self.base_url,
            username,
            password,
        )
        .await
    }

    pub fn logout(&self) -> Result<()> {
        session::logout(self.sessions.as_ref())
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ErrorKind;
    use crate::session::MemorySessionStore;
    use crate::transport::mock::{MockTransport, Scripted};
    use crate::transport::HttpMethod;
    use crate::widget::WidgetState;
    use serde_json::json;

    fn settings() -> DashboardSettings {
        let mut settings = DashboardSettings::default();
        settings.api.base_url = "http://dash.test/".to_string();
        settings.weather.geocode_url = "https://geo.test/v1/search".to_string();
        settings.weather.forecast_url = "https://forecast.test/v1/forecast".to_string();
        settings
    }

    fn backend() -> Arc<MockTransport> {
        let transport = Arc::new(MockTransport::new());
        transport.always(
            HttpMethod::Post,
            "http://dash.test/users/login",
            Scripted::ok(200, json!({ "name": "Ada", "token": "tok" })),
        );
        transport.always(
            HttpMethod::Get,
            "http://dash.test/home/sensors/737",
            Scripted::ok(200, json!({ "data": [ { "lux": 300.0 } ] })),
        );
        transport.always(
            HttpMethod::Get,
            "http://dash.test/lists/1",
            Scripted::ok(200, json!({ "id": 1, "title": "Groceries", "contents": [ { "id": 1, "content": "eggs" } ] })),
        );
        transport
    }

    fn error_kind<T>(state: &WidgetState<T>) -> Option<ErrorKind> {
        match state {
            WidgetState::Error(err) => Some(err.kind),
            _ => None,
        }
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let mut settings = settings();
        settings.api.base_url = "not a url".to_string();
        let result = Dashboard::new(
            &settings,
            Arc::new(MockTransport::new()),
            Arc::new(MemorySessionStore::new()),
        );
        assert!(matches!(result, Err(DashboardError::Settings(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_restarts_widgets() {
        let transport = backend();
        let dashboard = Dashboard::new(&settings(), transport.clone(), Arc::new(MemorySessionStore::new())).unwrap();
        dashboard.start();

        let list = &dashboard.widgets().shopping_list;
        assert_eq!(error_kind(&list.settled().await), Some(ErrorKind::Unauthenticated));
        assert_eq!(transport.call_count(), 0);

        let mut rx = list.subscribe();
        dashboard.login("ada", "secret").await.unwrap();

        // Back through Loading to the loaded list
        rx.wait_for(|state| state.ready().is_some()).await.unwrap();
        let sensor = dashboard.widgets().sensor.settled().await;
        assert!(sensor.ready().is_some());

        dashboard.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_restarts_widgets_into_error() {
        let transport = backend();
        let store = Arc::new(MemorySessionStore::with_session(Session::new("tok", "Ada")));
        let dashboard = Dashboard::new(&settings(), transport.clone(), store).unwrap();
        dashboard.start();
        assert!(dashboard.widgets().shopping_list.settled().await.ready().is_some());

        let mut rx = dashboard.widgets().shopping_list.subscribe();
        dashboard.logout().unwrap();

        rx.wait_for(|state| error_kind(state) == Some(ErrorKind::Unauthenticated))
            .await
            .unwrap();
        assert!(dashboard.sessions().get_session().is_none());
        dashboard.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_session_listener() {
        let transport = backend();
        let dashboard = Dashboard::new(&settings(), transport.clone(), Arc::new(MemorySessionStore::new())).unwrap();
        dashboard.start();
        dashboard.widgets().sensor.settled().await;
        dashboard.stop();

        dashboard.login("ada", "secret").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(120)).await;

        // Only the login request went out
        assert_eq!(transport.call_count(), 1);
    }
}
