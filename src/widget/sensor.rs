use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{PolledWidget, ViewProjection};
use crate::derived::{AdvisoryConfig, DerivedState, DerivedStateEngine};
use crate::fetch::{Fetched, Reading, SensorPayload, SensorPipeline};
use crate::session::SessionProvider;
use crate::settings::{AdvisorySettings, SensorSettings};
use crate::transport::HttpTransport;

/// Rendered sensor card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorView {
    pub label: Option<String>,
    pub readings: Vec<Reading>,
    pub derived: DerivedState,
    pub received_at: DateTime<Utc>,
}

/// Runs the derived-state engine on the newest reading.
pub struct SensorProjection {
    engine: DerivedStateEngine,
}

impl SensorProjection {
    pub fn new(engine: DerivedStateEngine) -> Self {
        Self { engine }
    }
}

impl ViewProjection<SensorPayload> for SensorProjection {
    type View = SensorView;

    fn project(
        &self,
        fetched: Fetched<SensorPayload>,
        previous: Option<&SensorView>,
    ) -> Option<SensorView> {
        let latest = fetched.payload.latest()?.clone();
        let derived = self.engine.update_at(
            previous.map(|view| &view.derived),
            latest,
            fetched.received_at,
        );

        Some(SensorView {
            label: fetched.payload.label,
            readings: fetched.payload.readings,
            derived,
            received_at: fetched.received_at,
        })
    }
}

pub type SensorWidget = PolledWidget<SensorPipeline, SensorProjection>;

impl SensorWidget {
    pub fn from_settings(
        transport: Arc<dyn HttpTransport>,
        sessions: Arc<dyn SessionProvider>,
        base_url: &str,
        sensor: &SensorSettings,
        advisory: &AdvisorySettings,
    ) -> Self {
        let pipeline = SensorPipeline::new(
            transport,
            base_url,
            sensor.sensor_id,
            sensor.value_field.clone(),
        );
        let engine = DerivedStateEngine::new(AdvisoryConfig::from(advisory.clone()));

        PolledWidget::new(
            format!("sensor-{}", sensor.sensor_id),
            pipeline,
            SensorProjection::new(engine),
            sessions,
            sensor.poll_interval(),
        )
    }
}
