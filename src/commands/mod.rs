//! Command implementations for the appinfo CLI
//!
//! - **query**: `info` and `dlc`, which go through the refresh cycle
//! - **cache**: cache inspection, cleaning and explicit invalidation
//! - **setup**: steamcmd preparation and teardown

pub mod cache;
pub mod query;
pub mod setup;

pub use cache::{cache, invalidate};
pub use query::{OutputFormat, dlc, info};
pub use setup::{setup, teardown};

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner on a TTY, hidden otherwise
pub(crate) fn spinner(message: String, enabled: bool) -> ProgressBar {
    let is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());
    if !enabled || !is_tty {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
