//! Shopping list widget: load on start, mutate, reload.

use std::sync::Arc;

use tokio::sync::watch;

use super::{PolledWidget, ViewProjection, WidgetState};
use crate::fetch::{FetchError, Fetched, ListEntity, ShoppingListPipeline};
use crate::session::SessionProvider;
use crate::settings::ShoppingListSettings;
use crate::transport::HttpTransport;

/// A list with no entries renders as `Empty`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListProjection;

impl ViewProjection<ListEntity> for ListProjection {
    type View = ListEntity;

    fn project(&self, fetched: Fetched<ListEntity>, _previous: Option<&ListEntity>) -> Option<ListEntity> {
        let list = fetched.payload;
        (!list.is_empty()).then_some(list)
    }
}

pub struct ShoppingListWidget {
    inner: PolledWidget<ShoppingListPipeline, ListProjection>,
}

impl ShoppingListWidget {
    pub fn new(inner: PolledWidget<ShoppingListPipeline, ListProjection>) -> Self {
        Self { inner }
    }

    pub fn from_settings(
        transport: Arc<dyn HttpTransport>,
        sessions: Arc<dyn SessionProvider>,
        base_url: &str,
        list: &ShoppingListSettings,
    ) -> Self {
        Self::new(PolledWidget::new(
            format!("list-{}", list.list_id),
            ShoppingListPipeline::new(transport, base_url, list.list_id.clone()),
            ListProjection,
            sessions,
            list.poll_interval(),
        ))
    }

    pub fn start(&self) {
        self.inner.start();
    }

    pub fn stop(&self) {
        self.inner.stop();
    }

    pub async fn refresh(&self) -> bool {
        self.inner.refresh().await
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn state(&self) -> WidgetState<ListEntity> {
        self.inner.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<WidgetState<ListEntity>> {
        self.inner.subscribe()
    }

    pub async fn settled(&self) -> WidgetState<ListEntity> {
        self.inner.settled().await
    }

    /// Entries shown before the last failure, if any.
    pub fn retained(&self) -> Option<ListEntity> {
        self.inner.machine().last_ready()
    }

    /// Create an entry, then reload the list.
    ///
    /// Blank input fails locally without a request. When the create request
    /// itself fails the list is still reloaded, and the create failure is
    /// surfaced afterwards so it is what the user sees.
    pub async fn add_entry(&self, content: &str) -> Result<(), FetchError> {
        let machine = self.inner.machine();
        let session = self.inner.sessions().get_session();
        let created = self
            .inner
            .pipeline()
            .create_entry(session.as_ref(), content)
            .await;

        if let Err(err) = &created {
            if matches!(err, FetchError::Validation(_) | FetchError::Unauthenticated) {
                // Nothing was sent, nothing to reload
                if let Some(epoch) = machine.current_epoch() {
                    machine.fail(epoch, err);
                }
                return created;
            }
            tracing::warn!("[{}] add failed: {}", self.name(), err);
        }

        self.inner.refresh().await;

        if let Err(err) = &created {
            if let Some(epoch) = machine.current_epoch() {
                machine.fail(epoch, err);
            }
        }
        created
    }

    /// Delete an entry. On failure the shown list is left as it was and the
    /// error is surfaced; on success the list is reloaded.
    pub async fn remove_entry(&self, item_id: &str) -> Result<(), FetchError> {
        let machine = self.inner.machine();
        let session = self.inner.sessions().get_session();

        match self
            .inner
            .pipeline()
            .delete_entry(session.as_ref(), item_id)
            .await
        {
            Ok(()) => {
                self.inner.refresh().await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("[{}] remove of {} failed: {}", self.name(), item_id, err);
                if let Some(epoch) = machine.current_epoch() {
                    machine.fail(epoch, &err);
                }
                Err(err)
            }
        }
    }
}
