//! Authenticated live-data refresh core for a home-automation dashboard.
//!
//! ```text
//! SessionProvider -> FetchPipeline -> DerivedStateEngine -> WidgetStateMachine -> renderer
//!                         ^
//!                       Poller
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod dashboard;
pub mod derived;
pub mod error;
pub mod fetch;
pub mod poller;
pub mod session;
pub mod settings;
pub mod transport;
pub mod widget;

pub use dashboard::Dashboard;
pub use error::{DashboardError, Result};
pub use fetch::{ErrorKind, FetchError, FetchPipeline, FetchResult, Fetched};
pub use poller::{PollInterval, Poller};
pub use session::{Session, SessionEvent, SessionHub, SessionProvider};
pub use widget::{WidgetState, WidgetStateMachine};
