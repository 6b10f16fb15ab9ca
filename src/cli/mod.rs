//! Headless front end for the dashboard.
//!
//! ```text
//! +-----------+     +-----------+     +------------------+
//! | bootstrap | --> | Dashboard | --> | output.rs        |
//! | (context) |     | (widgets) |     | (text/JSON lines)|
//! +-----------+     +-----------+     +------------------+
//! ```

mod args;
mod bootstrap;
mod output;
mod runner;

pub use args::{Args, Command, ListCommand};
pub use bootstrap::{initialize, CliContext};
pub use output::{render_state, Summary};
pub use runner::execute;
