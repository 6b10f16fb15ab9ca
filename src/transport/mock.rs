//! Scripted transport for tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone)]
pub(crate) struct Scripted {
    result: Result<HttpResponse, TransportError>,
    delay: Option<Duration>,
}

impl Scripted {
    pub(crate) fn ok(status: u16, json: serde_json::Value) -> Self {
        Self {
            result: Ok(HttpResponse::new(status, json)),
            delay: None,
        }
    }

    pub(crate) fn err(error: TransportError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    /// Hold the response back for `delay` (virtual time under `start_paused`).
    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

struct Route {
    method: HttpMethod,
    url_prefix: String,
    queued: VecDeque<Scripted>,
    repeat: Option<Scripted>,
}

impl Route {
    fn matches(&self, request: &HttpRequest) -> bool {
        self.method == request.method
            && request.url.starts_with(&self.url_prefix)
            && (!self.queued.is_empty() || self.repeat.is_some())
    }

    fn next(&mut self) -> Scripted {
        match self.queued.pop_front() {
            Some(scripted) => scripted,
            None => self
                .repeat
                .clone()
                .unwrap_or_else(|| Scripted::ok(404, serde_json::Value::Null)),
        }
    }
}

/// Answers requests from per-route scripts and records every call.
#[derive(Default)]
pub(crate) struct MockTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer every matching request with `scripted` once the queue is drained.
    pub(crate) fn always(&self, method: HttpMethod, url_prefix: &str, scripted: Scripted) {
        let mut routes = self.routes.lock();
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.url_prefix == url_prefix)
        {
            route.repeat = Some(scripted);
            return;
        }
        routes.push(Route {
            method,
            url_prefix: url_prefix.to_string(),
            queued: VecDeque::new(),
            repeat: Some(scripted),
        });
    }

    /// Answer the next matching request with `scripted`. Queued answers are
    /// consumed in order before any `always` answer.
    pub(crate) fn once(&self, method: HttpMethod, url_prefix: &str, scripted: Scripted) {
        let mut routes = self.routes.lock();
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.url_prefix == url_prefix)
        {
            route.queued.push_back(scripted);
            return;
        }
        routes.push(Route {
            method,
            url_prefix: url_prefix.to_string(),
            queued: VecDeque::from([scripted]),
            repeat: None,
        });
    }

    pub(crate) fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub(crate) fn count(&self, method: HttpMethod, url_prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.method == method && c.url.starts_with(url_prefix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().push(request.clone());

        let scripted = {
            let mut routes = self.routes.lock();
            match routes.iter_mut().find(|r| r.matches(&request)) {
                Some(route) => route.next(),
                None => Scripted::ok(404, serde_json::Value::Null),
            }
        };

        if let Some(delay) = scripted.delay {
            tokio::time::sleep(delay).await;
        }
        scripted.result
    }
}
