//! Authenticated identity used by the fetch pipelines.
//!
//! The refresh core only ever *reads* the session through
//! [`SessionProvider::get_session`]. Writes happen from the login flow, and go
//! through a [`SessionHub`] so that widget owners learn about the change and
//! can re-initialise their widgets.

mod hub;
mod login;
mod store;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use hub::{SessionEvent, SessionHub};
pub use login::{login, logout, LoginError};
pub use store::FileSessionStore;

/// Token plus the name shown to the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    /// The login endpoint calls this `name`
    #[serde(alias = "name")]
    pub display_name: String,
}

impl Session {
    pub fn new(token: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            display_name: display_name.into(),
        }
    }
}

// Keep the token out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Session store contract.
pub trait SessionProvider: Send + Sync + 'static {
    /// Current session, or `None` when logged out.
    fn get_session(&self) -> Option<Session>;

    fn store_session(&self, session: Session) -> Result<()>;

    fn clear_session(&self) -> Result<()>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionProvider for MemorySessionStore {
    fn get_session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn store_session(&self, session: Session) -> Result<()> {
        *self.session.write() = Some(session);
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        *self.session.write() = None;
        Ok(())
    }
}
