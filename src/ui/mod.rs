//! Terminal output for the CLI.
//!
//! Provides 24-bit color panels for reports and an indicatif progress bar
//! fed by pipeline events.

mod colors;
mod progress;
mod report;

pub use colors::Theme;
pub use progress::ProgressObserver;
pub use report::ReportRenderer;

/// Whether colored output should be used.
///
/// Respects the NO_COLOR environment variable.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    !no_color_flag && std::env::var("NO_COLOR").is_err()
}
