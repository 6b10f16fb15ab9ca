//! Fetch pipelines: one or more ordered network calls producing one typed result.
//!
//! Every pipeline follows the same contract:
//! - no request is issued without a session ([`FetchError::Unauthenticated`]);
//! - every failure comes back as a [`FetchError`] value, nothing panics;
//! - no caching, each `run` is a fresh round trip;
//! - widget state is never touched, the caller applies the result.

pub mod sensor;
pub mod shopping;
pub mod weather;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::session::Session;
use crate::transport::{HttpRequest, HttpTransport, TransportError};

pub use sensor::{OutdoorConditions, OutdoorPipeline, Reading, SensorPayload, SensorPipeline};
pub use shopping::{ListEntity, ListEntry, ShoppingListPipeline};
pub use weather::{
    Coordinates, CurrentWeather, WeatherObservation, WeatherPipeline, WeatherReport,
    WeatherReportPipeline,
};

/// Coarse failure category, used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    HttpError,
    TransportError,
    ResolutionError,
    ValidationError,
    PayloadError,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::HttpError => "http-error",
            ErrorKind::TransportError => "transport-error",
            ErrorKind::ResolutionError => "no-match",
            ErrorKind::ValidationError => "empty-input",
            ErrorKind::PayloadError => "payload-error",
        }
    }
}

/// Failure half of a [`FetchResult`]. The `Display` text is diagnostic detail
/// for logs; widgets show [`FetchError::user_message`] instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("no session token present")]
    Unauthenticated,

    #[error("HTTP status {status}")]
    Http { status: u16 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("rejected input: {0}")]
    Validation(String),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Unauthenticated => ErrorKind::Unauthenticated,
            FetchError::Http { .. } => ErrorKind::HttpError,
            FetchError::Transport(_) => ErrorKind::TransportError,
            FetchError::Resolution(_) => ErrorKind::ResolutionError,
            FetchError::Validation(_) => ErrorKind::ValidationError,
            FetchError::Payload(_) => ErrorKind::PayloadError,
        }
    }

    /// Summary safe to show to the user. Never echoes transport detail.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Unauthenticated => "Not logged in.".to_string(),
            FetchError::Http { status } => format!("Service responded with status {}.", status),
            FetchError::Transport(_) => "Could not reach the service.".to_string(),
            FetchError::Resolution(_) => "Could not find location coordinates.".to_string(),
            FetchError::Validation(_) => "Please enter an item.".to_string(),
            FetchError::Payload(_) => "Received an unreadable response.".to_string(),
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Body(detail) => FetchError::Payload(detail),
            other => FetchError::Transport(other.to_string()),
        }
    }
}

/// Success half of a [`FetchResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fetched<T> {
    pub payload: T,
    pub received_at: DateTime<Utc>,
}

impl<T> Fetched<T> {
    pub fn new(payload: T, received_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            received_at,
        }
    }

    /// Stamp `payload` with the current time.
    pub fn now(payload: T) -> Self {
        Self::new(payload, Utc::now())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            payload: f(self.payload),
            received_at: self.received_at,
        }
    }
}

pub type FetchResult<T> = Result<Fetched<T>, FetchError>;

/// One pipeline per remote data source. Parameters (ids, endpoints) are
/// fields of the implementing value.
#[async_trait]
pub trait FetchPipeline: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn run(&self, session: Option<&Session>) -> FetchResult<Self::Output>;
}

/// Short-circuit before any request when logged out.
pub(crate) fn require_session(session: Option<&Session>) -> Result<&Session, FetchError> {
    match session {
        Some(session) if !session.token.is_empty() => Ok(session),
        _ => Err(FetchError::Unauthenticated),
    }
}

/// Issue `request` and return the body of a 2xx response.
pub(crate) async fn send(
    transport: &dyn HttpTransport,
    request: HttpRequest,
) -> Result<serde_json::Value, FetchError> {
    let method = request.method;
    let url = request.url.clone();

    let response = transport.request(request).await.map_err(|e| {
        tracing::warn!("{} {} failed: {}", method, url, e);
        FetchError::from(e)
    })?;

    if !response.is_success() {
        tracing::warn!("{} {} returned {}", method, url, response.status);
        return Err(FetchError::Http {
            status: response.status,
        });
    }

    Ok(response.json)
}

pub(crate) fn decode<T: DeserializeOwned>(json: serde_json::Value) -> Result<T, FetchError> {
    serde_json::from_value(json).map_err(|e| FetchError::Payload(e.to_string()))
}
