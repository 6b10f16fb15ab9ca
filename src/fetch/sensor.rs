//! Sensor readings: `GET {base}home/sensors/{id}?count=1`.
//!
//! Wire shape:
//!
//! ```json
//! { "label": "Living Room", "data": [ { "lux": 312.5, "timestamp": 1718000000000 } ] }
//! ```
//!
//! `timestamp` may be epoch milliseconds or an RFC 3339 string.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{decode, require_session, send, FetchError, FetchPipeline, FetchResult, Fetched};
use crate::session::Session;
use crate::transport::{endpoint, HttpRequest, HttpTransport};

type Row = serde_json::Map<String, serde_json::Value>;

/// One measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The row carried no timestamp and `timestamp` is the receive time.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub estimated: bool,
}

impl Reading {
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            timestamp,
            label: None,
            estimated: false,
        }
    }
}

/// All readings from one fetch, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorPayload {
    pub label: Option<String>,
    pub readings: Vec<Reading>,
}

impl SensorPayload {
    /// Most recent reading by timestamp. Dated rows rank above estimated
    /// ones; ties keep the earlier row.
    pub fn latest(&self) -> Option<&Reading> {
        let rank = |r: &Reading| (!r.estimated, r.timestamp);
        self.readings.iter().reduce(|best, candidate| {
            if rank(candidate) > rank(best) {
                candidate
            } else {
                best
            }
        })
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Rows without a numeric `value_field` are skipped; rows without a
    /// timestamp are stamped with `received_at` and marked estimated.
    fn from_response(
        response: SensorResponse,
        value_field: &str,
        received_at: DateTime<Utc>,
    ) -> Self {
        let label = response.label;
        let readings = response
            .data
            .iter()
            .filter_map(|row| {
                let value = row.get(value_field)?.as_f64()?;
                let timestamp = row_timestamp(row);
                Some(Reading {
                    value,
                    timestamp: timestamp.unwrap_or(received_at),
                    label: label.clone(),
                    estimated: timestamp.is_none(),
                })
            })
            .collect();

        Self { label, readings }
    }
}

#[derive(Debug, Deserialize)]
struct SensorResponse {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    data: Vec<Row>,
}

fn row_timestamp(row: &Row) -> Option<DateTime<Utc>> {
    match row.get("timestamp")? {
        serde_json::Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    }
}

async fn fetch_rows(
    transport: &dyn HttpTransport,
    base_url: &str,
    sensor_id: u32,
    session: Option<&Session>,
) -> Result<SensorResponse, FetchError> {
    let session = require_session(session)?;
    let url = endpoint(base_url, &format!("home/sensors/{}?count=1", sensor_id));
    let json = send(transport, HttpRequest::get(url).bearer(&session.token)).await?;
    decode(json)
}

/// Single-stage authenticated sensor fetch.
pub struct SensorPipeline {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    sensor_id: u32,
    value_field: String,
}

impl SensorPipeline {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        sensor_id: u32,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            sensor_id,
            value_field: value_field.into(),
        }
    }
}

#[async_trait]
impl FetchPipeline for SensorPipeline {
    type Output = SensorPayload;

    async fn run(&self, session: Option<&Session>) -> FetchResult<SensorPayload> {
        let response =
            fetch_rows(self.transport.as_ref(), &self.base_url, self.sensor_id, session).await?;
        let received_at = Utc::now();
        let payload = SensorPayload::from_response(response, &self.value_field, received_at);

        tracing::debug!(
            "Sensor {} returned {} reading(s)",
            self.sensor_id,
            payload.readings.len()
        );
        Ok(Fetched::new(payload, received_at))
    }
}

/// Outdoor temperature and humidity, rounded to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutdoorConditions {
    pub temperature: f64,
    pub humidity: f64,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Authenticated fetch of the outdoor sensor. An empty data set is a
/// [`FetchError::Payload`].
pub struct OutdoorPipeline {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    sensor_id: u32,
}

impl OutdoorPipeline {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>, sensor_id: u32) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            sensor_id,
        }
    }
}

#[async_trait]
impl FetchPipeline for OutdoorPipeline {
    type Output = OutdoorConditions;

    async fn run(&self, session: Option<&Session>) -> FetchResult<OutdoorConditions> {
        let response =
            fetch_rows(self.transport.as_ref(), &self.base_url, self.sensor_id, session).await?;

        let row = response
            .data
            .iter()
            .max_by_key(|row| row_timestamp(row).map(|t| t.timestamp_millis()))
            .ok_or_else(|| {
                tracing::info!("Outdoor sensor {} returned no rows", self.sensor_id);
                FetchError::Payload("no sensor data available".to_string())
            })?;

        let field = |name: &str| {
            row.get(name)
                .and_then(serde_json::Value::as_f64)
                .ok_or_else(|| FetchError::Payload(format!("missing {}", name)))
        };

        Ok(Fetched::now(OutdoorConditions {
            temperature: round1(field("temperature")?),
            humidity: round1(field("humidity")?),
        }))
    }
}
