use std::sync::Arc;

use super::{Identity, PolledWidget};
use crate::fetch::{OutdoorPipeline, WeatherPipeline, WeatherReportPipeline};
use crate::session::SessionProvider;
use crate::settings::WeatherSettings;
use crate::transport::HttpTransport;

/// The weather report is rendered as fetched.
pub type WeatherProjection = Identity;

pub type WeatherWidget = PolledWidget<WeatherReportPipeline, WeatherProjection>;

impl WeatherWidget {
    pub fn from_settings(
        transport: Arc<dyn HttpTransport>,
        sessions: Arc<dyn SessionProvider>,
        base_url: &str,
        weather: &WeatherSettings,
    ) -> Self {
        let lookup = WeatherPipeline::new(
            transport.clone(),
            weather.geocode_url.clone(),
            weather.forecast_url.clone(),
            weather.city.clone(),
        );
        let outdoor = weather
            .outdoor_sensor_id
            .map(|id| OutdoorPipeline::new(transport, base_url, id));

        PolledWidget::new(
            format!("weather-{}", weather.city.to_lowercase()),
            WeatherReportPipeline::new(lookup, outdoor),
            Identity,
            sessions,
            weather.poll_interval(),
        )
    }
}
