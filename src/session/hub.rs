//! Session-changed notifications.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::{Session, SessionProvider};
use crate::error::Result;

/// Emitted after the stored session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { display_name: String },
    LoggedOut,
}

/// Wraps a store and broadcasts a [`SessionEvent`] after every successful write.
pub struct SessionHub {
    store: Arc<dyn SessionProvider>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHub {
    pub fn new(store: Arc<dyn SessionProvider>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { store, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

impl SessionProvider for SessionHub {
    fn get_session(&self) -> Option<Session> {
        self.store.get_session()
    }

    fn store_session(&self, session: Session) -> Result<()> {
        let display_name = session.display_name.clone();
        self.store.store_session(session)?;
        tracing::info!("Session started for {}", display_name);
        self.notify(SessionEvent::LoggedIn { display_name });
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        self.store.clear_session()?;
        tracing::info!("Session cleared");
        self.notify(SessionEvent::LoggedOut);
        Ok(())
    }
}
