//! Two-stage weather lookup.
//!
//! Stage 1 resolves the configured city through the public geocoding API.
//! Stage 2 asks the public forecast API for current conditions at those
//! coordinates. Stage 2 only runs when stage 1 produced a match, and a stage-2
//! failure never re-runs stage 1.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::sensor::{OutdoorConditions, OutdoorPipeline};
use super::{decode, require_session, send, FetchError, FetchPipeline, FetchResult, Fetched};
use crate::derived::weather_codes::{classify, WeatherCondition};
use crate::session::Session;
use crate::transport::{HttpRequest, HttpTransport};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// `current_weather` block of the forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherObservation {
    pub location: String,
    pub coordinates: Coordinates,
    pub current: CurrentWeather,
}

/// Entries are kept loose so that a partial match reads as no match.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Option<Vec<serde_json::Value>>,
}

impl GeocodeResponse {
    fn first_match(self) -> Option<Coordinates> {
        let entry = self.results?.into_iter().next()?;
        serde_json::from_value(entry).ok()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

fn build_url(base: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
    url::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| FetchError::Transport(format!("invalid endpoint {}: {}", base, e)))
}

/// City name to current weather.
pub struct WeatherPipeline {
    transport: Arc<dyn HttpTransport>,
    geocode_url: String,
    forecast_url: String,
    city: String,
}

impl WeatherPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        geocode_url: impl Into<String>,
        forecast_url: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            geocode_url: geocode_url.into(),
            forecast_url: forecast_url.into(),
            city: city.into(),
        }
    }

    /// Stage 1. A non-2xx lookup, a null result list, or a first entry without
    /// coordinates is treated like an empty result.
    async fn resolve(&self) -> Result<Coordinates, FetchError> {
        let url = build_url(
            &self.geocode_url,
            &[("name", self.city.clone()), ("count", "1".to_string())],
        )?;

        let json = match send(self.transport.as_ref(), HttpRequest::get(url)).await {
            Ok(json) => json,
            Err(FetchError::Http { status }) => {
                tracing::info!("Geocoding {} answered {}", self.city, status);
                return Err(FetchError::Resolution("no match".to_string()));
            }
            Err(other) => return Err(other),
        };

        let response: GeocodeResponse = decode(json)?;
        response.first_match().ok_or_else(|| {
            tracing::info!("No coordinates found for {}", self.city);
            FetchError::Resolution("no match".to_string())
        })
    }

    /// Stage 2.
    async fn current(&self, coordinates: Coordinates) -> Result<CurrentWeather, FetchError> {
        let url = build_url(
            &self.forecast_url,
            &[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ],
        )?;

        let json = send(self.transport.as_ref(), HttpRequest::get(url)).await?;
        let response: ForecastResponse = decode(json)?;
        Ok(response.current_weather)
    }
}

#[async_trait]
impl FetchPipeline for WeatherPipeline {
    type Output = WeatherObservation;

    async fn run(&self, session: Option<&Session>) -> FetchResult<WeatherObservation> {
        // Both endpoints are public, but nothing leaves the process while logged out
        require_session(session)?;

        let coordinates = self.resolve().await?;
        let current = self.current(coordinates).await?;

        Ok(Fetched::now(WeatherObservation {
            location: self.city.clone(),
            coordinates,
            current,
        }))
    }
}

/// What the weather widget renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    pub coordinates: Coordinates,
    pub temperature: f64,
    pub windspeed: f64,
    pub weather_code: u16,
    pub condition: WeatherCondition,
    pub outdoor: Option<OutdoorConditions>,
}

/// Weather lookup followed by the optional outdoor sensor read.
pub struct WeatherReportPipeline {
    weather: WeatherPipeline,
    outdoor: Option<OutdoorPipeline>,
}

impl WeatherReportPipeline {
    pub fn new(weather: WeatherPipeline, outdoor: Option<OutdoorPipeline>) -> Self {
        Self { weather, outdoor }
    }
}

#[async_trait]
impl FetchPipeline for WeatherReportPipeline {
    type Output = WeatherReport;

    async fn run(&self, session: Option<&Session>) -> FetchResult<WeatherReport> {
        let observation = self.weather.run(session).await?;

        let outdoor = match &self.outdoor {
            Some(pipeline) => Some(pipeline.run(session).await?.payload),
            None => None,
        };

        Ok(observation.map(|obs| WeatherReport {
            condition: classify(obs.current.weathercode),
            location: obs.location,
            coordinates: obs.coordinates,
            temperature: obs.current.temperature,
            windspeed: obs.current.windspeed,
            weather_code: obs.current.weathercode,
            outdoor,
        }))
    }
}
