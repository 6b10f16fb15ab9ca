//! Per-widget render state.
//!
//! A widget lives through a series of *cycles*. `begin_cycle` opens a new one
//! and puts the widget back into `Loading`; `close` ends it. Results are tagged
//! with the [`Epoch`] of the cycle that issued them and are dropped when that
//! cycle is no longer the open one. Within a cycle results are applied in the
//! order they complete.

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;

use crate::fetch::{ErrorKind, FetchError, FetchResult, Fetched};

/// Failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FetchError> for WidgetError {
    fn from(err: &FetchError) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum WidgetState<T> {
    Loading,
    Error(WidgetError),
    Ready(T),
    Empty,
}

impl<T> WidgetState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, WidgetState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            WidgetState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WidgetState::Loading => "loading",
            WidgetState::Error(_) => "error",
            WidgetState::Ready(_) => "ready",
            WidgetState::Empty => "empty",
        }
    }
}

/// Identifies one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u64);

struct Inner<T> {
    epoch: u64,
    open: bool,
    last_ready: Option<T>,
    transitions: u64,
}

pub struct WidgetStateMachine<T> {
    name: String,
    inner: Mutex<Inner<T>>,
    state: watch::Sender<WidgetState<T>>,
}

impl<T> WidgetStateMachine<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        let (state, _) = watch::channel(WidgetState::Loading);
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                epoch: 0,
                open: false,
                last_ready: None,
                transitions: 0,
            }),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open a new cycle and enter `Loading`. Results from earlier cycles are
    /// discarded from here on.
    pub fn begin_cycle(&self) -> Epoch {
        let mut inner = self.inner.lock();
        inner.epoch += 1;
        inner.open = true;
        inner.last_ready = None;
        inner.transitions += 1;
        self.state.send_replace(WidgetState::Loading);

        tracing::debug!("[{}] cycle {} started", self.name, inner.epoch);
        Epoch(inner.epoch)
    }

    /// End the current cycle. No transition happens after this until the next
    /// `begin_cycle`.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.open {
            inner.open = false;
            tracing::debug!("[{}] cycle {} closed", self.name, inner.epoch);
        }
    }

    /// The open cycle, if any.
    pub fn current_epoch(&self) -> Option<Epoch> {
        let inner = self.inner.lock();
        inner.open.then_some(Epoch(inner.epoch))
    }

    /// Apply a fetch result issued under `epoch`.
    ///
    /// `project` turns a successful payload into the view, seeing the last
    /// `Ready` view of this cycle. Returning `None` marks the payload as
    /// empty. Returns whether a transition happened.
    pub fn apply<R, F>(&self, epoch: Epoch, result: FetchResult<R>, project: F) -> bool
    where
        F: FnOnce(Fetched<R>, Option<&T>) -> Option<T>,
    {
        let mut inner = self.inner.lock();
        if !inner.open || inner.epoch != epoch.0 {
            tracing::debug!(
                "[{}] discarding result of cycle {} (current {}, open {})",
                self.name,
                epoch.0,
                inner.epoch,
                inner.open
            );
            return false;
        }

        let next = match result {
            Ok(fetched) => match project(fetched, inner.last_ready.as_ref()) {
                Some(view) => {
                    inner.last_ready = Some(view.clone());
                    WidgetState::Ready(view)
                }
                None => WidgetState::Empty,
            },
            Err(err) => {
                tracing::debug!("[{}] fetch failed: {}", self.name, err);
                WidgetState::Error(WidgetError::from(&err))
            }
        };

        inner.transitions += 1;
        tracing::debug!("[{}] -> {}", self.name, next.label());
        self.state.send_replace(next);
        true
    }

    /// Surface a failure that did not come from a fetch, such as rejected input.
    pub fn fail(&self, epoch: Epoch, err: &FetchError) -> bool {
        self.apply::<(), _>(epoch, Err(err.clone()), |_, _| None)
    }

    pub fn state(&self) -> WidgetState<T> {
        self.state.borrow().clone()
    }

    /// Last `Ready` view of the open cycle, kept across `Error` and `Empty`.
    pub fn last_ready(&self) -> Option<T> {
        self.inner.lock().last_ready.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetState<T>> {
        self.state.subscribe()
    }

    /// Number of transitions so far, including each `Loading` entry.
    pub fn transitions(&self) -> u64 {
        self.inner.lock().transitions
    }

    /// Wait until the widget leaves `Loading`.
    pub async fn settled(&self) -> WidgetState<T> {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            // The sender lives in `self`, so the channel cannot close here
            Err(_) => self.state(),
        };
        settled
    }
}
