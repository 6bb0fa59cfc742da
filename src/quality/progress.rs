//! Progress reporting for QA categories.

use std::time::Duration;

use super::TestCategory;

/// Progress state for a QA category.
///
/// Used in progress callbacks to report category status changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryProgressState {
    /// Category checks are running
    Running,
    /// Category scored at or above the pass threshold
    Passed,
    /// Category scored below the pass threshold
    Failed,
    /// Category has no checks that can run
    Skipped,
}

/// Progress update for a QA category.
#[derive(Debug, Clone)]
pub struct CategoryProgressUpdate {
    pub category: TestCategory,
    pub state: CategoryProgressState,
    /// Time spent in the category (set once it completes)
    pub duration: Option<Duration>,
}

impl CategoryProgressUpdate {
    pub fn running(category: TestCategory) -> Self {
        Self {
            category,
            state: CategoryProgressState::Running,
            duration: None,
        }
    }

    pub fn passed(category: TestCategory, duration: Duration) -> Self {
        Self {
            category,
            state: CategoryProgressState::Passed,
            duration: Some(duration),
        }
    }

    pub fn failed(category: TestCategory, duration: Duration) -> Self {
        Self {
            category,
            state: CategoryProgressState::Failed,
            duration: Some(duration),
        }
    }

    pub fn skipped(category: TestCategory) -> Self {
        Self {
            category,
            state: CategoryProgressState::Skipped,
            duration: Some(Duration::ZERO),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == CategoryProgressState::Running
    }

    /// Check if the category has completed (Passed, Failed or Skipped).
    pub fn is_completed(&self) -> bool {
        !self.is_running()
    }

    /// Format the duration for display, if available.
    pub fn format_duration(&self) -> Option<String> {
        self.duration.map(|d| {
            if d.as_millis() < 1000 {
                format!("{}ms", d.as_millis())
            } else {
                format!("{:.1}s", d.as_secs_f64())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_has_no_duration() {
        let update = CategoryProgressUpdate::running(TestCategory::Seo);
        assert!(update.is_running());
        assert!(!update.is_completed());
        assert_eq!(update.format_duration(), None);
    }

    #[test]
    fn test_completed_states() {
        let passed = CategoryProgressUpdate::passed(TestCategory::Seo, Duration::from_millis(12));
        assert!(passed.is_completed());
        assert_eq!(passed.format_duration(), Some("12ms".to_string()));

        let failed =
            CategoryProgressUpdate::failed(TestCategory::MedicalAccuracy, Duration::from_millis(1500));
        assert_eq!(failed.format_duration(), Some("1.5s".to_string()));

        let skipped = CategoryProgressUpdate::skipped(TestCategory::Performance);
        assert_eq!(skipped.state, CategoryProgressState::Skipped);
        assert!(skipped.is_completed());
    }
}
