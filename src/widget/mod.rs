//! Widget controllers.
//!
//! A [`PolledWidget`] ties one [`FetchPipeline`] to one [`Poller`] and one
//! [`WidgetStateMachine`]. Whoever owns the widget calls `start()` on mount and
//! `stop()` on teardown; the render layer only subscribes to state.

pub mod sensor;
pub mod shopping;
pub mod state;
pub mod weather;

use std::sync::Arc;

use tokio::sync::watch;

use crate::fetch::{FetchPipeline, Fetched};
use crate::poller::{PollInterval, Poller};
use crate::session::SessionProvider;

pub use sensor::{SensorProjection, SensorView, SensorWidget};
pub use shopping::{ListProjection, ShoppingListWidget};
pub use state::{Epoch, WidgetError, WidgetState, WidgetStateMachine};
pub use weather::{WeatherProjection, WeatherWidget};

/// Turns a pipeline payload into what the widget renders.
pub trait ViewProjection<Payload>: Send + Sync + 'static {
    type View: Clone + Send + Sync + 'static;

    /// `None` means the payload is explicitly empty.
    fn project(&self, fetched: Fetched<Payload>, previous: Option<&Self::View>)
        -> Option<Self::View>;
}

struct Core<P, V>
where
    P: FetchPipeline,
    V: ViewProjection<P::Output>,
{
    pipeline: P,
    projection: V,
    sessions: Arc<dyn SessionProvider>,
    state: WidgetStateMachine<V::View>,
}

impl<P, V> Core<P, V>
where
    P: FetchPipeline,
    V: ViewProjection<P::Output>,
{
    async fn tick(&self, epoch: Epoch) -> bool {
        let session = self.sessions.get_session();
        let result = self.pipeline.run(session.as_ref()).await;
        self.state.apply(epoch, result, |fetched, previous| {
            self.projection.project(fetched, previous)
        })
    }
}

pub struct PolledWidget<P, V>
where
    P: FetchPipeline,
    V: ViewProjection<P::Output>,
{
    core: Arc<Core<P, V>>,
    interval: PollInterval,
    poller: Poller,
}

impl<P, V> PolledWidget<P, V>
where
    P: FetchPipeline,
    V: ViewProjection<P::Output>,
{
    pub fn new(
        name: impl Into<String>,
        pipeline: P,
        projection: V,
        sessions: Arc<dyn SessionProvider>,
        interval: PollInterval,
    ) -> Self {
        Self {
            core: Arc::new(Core {
                pipeline,
                projection,
                sessions,
                state: WidgetStateMachine::new(name),
            }),
            interval,
            poller: Poller::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.core.state.name()
    }

    pub fn interval(&self) -> PollInterval {
        self.interval
    }

    /// Begin a new cycle: `Loading`, then fetch now and on every tick.
    /// Calling it again restarts the widget.
    pub fn start(&self) {
        let epoch = self.core.state.begin_cycle();
        let core = self.core.clone();
        self.poller.start(self.interval, move || {
            let core = core.clone();
            async move {
                core.tick(epoch).await;
            }
        });
        tracing::info!("[{}] started ({:?})", self.name(), self.interval);
    }

    /// Teardown. In-flight fetches finish but their results are discarded.
    pub fn stop(&self) {
        self.poller.stop();
        self.core.state.close();
        tracing::info!("[{}] stopped", self.name());
    }

    /// Fetch once within the current cycle, outside the schedule. Returns
    /// whether the result was applied.
    pub async fn refresh(&self) -> bool {
        match self.core.state.current_epoch() {
            Some(epoch) => self.core.tick(epoch).await,
            None => false,
        }
    }

    pub fn state(&self) -> WidgetState<V::View> {
        self.core.state.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetState<V::View>> {
        self.core.state.subscribe()
    }

    pub async fn settled(&self) -> WidgetState<V::View> {
        self.core.state.settled().await
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub(crate) fn pipeline(&self) -> &P {
        &self.core.pipeline
    }

    pub(crate) fn sessions(&self) -> &dyn SessionProvider {
        self.core.sessions.as_ref()
    }

    pub(crate) fn machine(&self) -> &WidgetStateMachine<V::View> {
        &self.core.state
    }
}

impl<P, V> Drop for PolledWidget<P, V>
where
    P: FetchPipeline,
    V: ViewProjection<P::Output>,
{
    fn drop(&mut self) {
        self.core.state.close();
    }
}

/// Payload rendered as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> ViewProjection<T> for Identity
where
    T: Clone + Send + Sync + 'static,
{
    type View = T;

    fn project(&self, fetched: Fetched<T>, _previous: Option<&T>) -> Option<T> {
        Some(fetched.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchResult};
    use crate::session::{MemorySessionStore, Session};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Answers from a script, each after its own delay.
    struct ScriptedPipeline {
        script: Mutex<VecDeque<(Duration, FetchResult<i32>)>>,
    }

    impl ScriptedPipeline {
        fn new(script: Vec<(u64, FetchResult<i32>)>) -> Self {
            Self {
                script: Mutex::new(
                    script
                        .into_iter()
                        .map(|(secs, r)| (Duration::from_secs(secs), r))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait]
    impl FetchPipeline for ScriptedPipeline {
        type Output = i32;

        async fn run(&self, session: Option<&Session>) -> FetchResult<i32> {
            if session.is_none() {
                return Err(FetchError::Unauthenticated);
            }
            let next = self.script.lock().pop_front();
            match next {
                Some((delay, result)) => {
                    tokio::time::sleep(delay).await;
                    result
                }
                None => Err(FetchError::Http { status: 599 }),
            }
        }
    }

    fn logged_in() -> Arc<dyn SessionProvider> {
        Arc::new(MemorySessionStore::with_session(Session::new("tok", "Ada")))
    }

    fn widget(
        script: Vec<(u64, FetchResult<i32>)>,
        interval: PollInterval,
    ) -> PolledWidget<ScriptedPipeline, Identity> {
        PolledWidget::new(
            "scripted",
            ScriptedPipeline::new(script),
            Identity,
            logged_in(),
            interval,
        )
    }

    async fn advance(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_immediately() {
        let widget = widget(vec![(0, Ok(Fetched::now(1)))], PollInterval::Once);
        widget.start();
        assert!(widget.state().is_loading());

        assert_eq!(widget.settled().await, WidgetState::Ready(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_never_rest_in_loading() {
        let widget = widget(
            vec![
                (0, Ok(Fetched::now(1))),
                (1, Err(FetchError::Http { status: 500 })),
                (1, Ok(Fetched::now(2))),
            ],
            PollInterval::Every(Duration::from_secs(10)),
        );
        let mut rx = widget.subscribe();
        widget.start();

        // Sample midway between ticks
        advance(5).await;
        let mut seen = vec![rx.borrow_and_update().label()];
        for _ in 0..2 {
            advance(10).await;
            let state = rx.borrow_and_update().clone();
            assert!(!state.is_loading(), "resting in Loading");
            seen.push(state.label());
        }
        assert_eq!(seen, vec!["ready", "error", "ready"]);
        widget.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_ticks_last_completed_wins() {
        // A is issued first but completes after B
        let widget = widget(
            vec![(15, Ok(Fetched::now(100))), (1, Ok(Fetched::now(200)))],
            PollInterval::Every(Duration::from_secs(10)),
        );
        widget.start();

        advance(12).await;
        assert_eq!(widget.state(), WidgetState::Ready(200));

        advance(4).await;
        assert_eq!(widget.state(), WidgetState::Ready(100));
        widget.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_result() {
        let widget = widget(vec![(5, Ok(Fetched::now(1)))], PollInterval::Once);
        widget.start();
        let rx = widget.subscribe();
        let transitions = widget.machine().transitions();

        advance(1).await;
        widget.stop();
        advance(10).await;

        assert!(widget.state().is_loading());
        assert_eq!(widget.machine().transitions(), transitions);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_previous_cycle() {
        let widget = widget(
            vec![(5, Ok(Fetched::now(1))), (1, Ok(Fetched::now(2)))],
            PollInterval::Once,
        );
        widget.start();
        advance(1).await;
        widget.start();

        advance(10).await;
        assert_eq!(widget.state(), WidgetState::Ready(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logged_out_reaches_error() {
        let widget = PolledWidget::new(
            "scripted",
            ScriptedPipeline::new(vec![]),
            Identity,
            Arc::new(MemorySessionStore::new()),
            PollInterval::Once,
        );
        widget.start();

        match widget.settled().await {
            WidgetState::Error(err) => assert_eq!(err.message, "Not logged in."),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_requires_open_cycle() {
        let widget = widget(vec![(0, Ok(Fetched::now(3)))], PollInterval::Once);
        assert!(!widget.refresh().await);

        widget.start();
        widget.settled().await;
        widget.stop();
        assert!(!widget.refresh().await);
    }
}
