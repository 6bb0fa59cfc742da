//! Progress bar driven by pipeline events.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::pipeline::{PipelineEvent, PipelineObserver};
use crate::quality::CategoryProgressState;

/// Braille spinner pattern.
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// Shows one bar for a run of `total` locations, with the current stage
/// as its message.
#[derive(Debug, Clone)]
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::create_style());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// An observer that draws nothing, for quiet mode.
    pub fn hidden(total: usize) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden());
        Self { bar }
    }

    fn create_style() -> ProgressStyle {
        // Format: ⠋ [00:00:03] [██████░░░░] 2/5 Indira Nagar: optimize
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{bar:24.blue/white}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(SPINNER)
        .progress_chars("█▓░")
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Print a line above the bar.
    pub fn println(&self, line: impl AsRef<str>) {
        self.bar.println(line);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for ProgressObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { location, stage } => {
                self.bar.set_message(format!("{location}: {stage}"));
            }
            PipelineEvent::QaProgress { location, update }
                if update.state == CategoryProgressState::Running =>
            {
                self.bar
                    .set_message(format!("{location}: QA {}", update.category));
            }
            PipelineEvent::LocationFinished {
                location,
                overall_score,
                certification,
            } => {
                self.bar.inc(1);
                self.bar.println(format!(
                    "✓ {location} QA {overall_score:.1} ({certification})"
                ));
            }
            PipelineEvent::LocationFailed { location, error } => {
                self.bar.inc(1);
                self.bar.println(format!("✗ {location}: {error}"));
            }
            PipelineEvent::Throttled { delay } => {
                self.bar
                    .set_message(format!("waiting {}ms", delay.as_millis()));
            }
            _ => {}
        }
    }
}
