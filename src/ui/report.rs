//! Box-drawn reports for QA, SEO, batch and registry output.

use owo_colors::{OwoColorize, Rgb};

use crate::output::RegistryEntry;
use crate::pipeline::BatchReport;
use crate::quality::{ComprehensiveQaResult, TestStatus};
use crate::seo::{Severity, SeoOptimizationResult};
use crate::ui::colors::Theme;

/// Maximum recommendations listed under a report.
const MAX_RECOMMENDATIONS: usize = 8;

fn status_icon(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "✓",
        TestStatus::Failed => "✗",
        TestStatus::Skipped => "⊘",
    }
}

/// Renders reports as text panels.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    theme: Theme,
    /// Panel width (characters)
    width: usize,
    colors_enabled: bool,
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self {
            theme: Theme::default(),
            width: 64,
            colors_enabled: true,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(24);
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.colors_enabled = enabled;
        self
    }

    /// Full QA report: categories, gates, certification, deltas and
    /// recommendations.
    pub fn render_qa(&self, result: &ComprehensiveQaResult) -> String {
        let mut lines = Vec::new();
        for category in &result.categories {
            let icon = self.status(category.status);
            let score = match category.score {
                Some(score) => self.paint(&format!("{score:>5.1}"), self.theme.for_score(score)),
                None => self.paint("    -", self.theme.muted),
            };
            lines.push(format!("{icon} {:<24}{score}", format_name(category.category.name())));
        }

        lines.push(String::new());
        for gate in &result.quality_gates {
            let icon = if gate.passed {
                self.paint("✓", self.theme.success)
            } else {
                self.paint("✗", self.theme.error)
            };
            lines.push(format!(
                "{icon} gate {:<19}{:>7.1} / {:.1}",
                gate.name, gate.actual, gate.threshold
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Overall {}   Certification {}",
            self.paint(
                &format!("{:.1}", result.overall_score),
                self.theme.for_score(result.overall_score)
            ),
            self.paint(
                &result.certification.to_string().to_uppercase(),
                self.theme.for_certification(result.certification)
            ),
        ));
        let compliance = &result.compliance;
        lines.push(format!(
            "Compliance medical {} seo {} content {} accessibility {}",
            self.flag(compliance.medical),
            self.flag(compliance.seo),
            self.flag(compliance.content),
            self.flag(compliance.accessibility),
        ));

        if !result.deltas.is_empty() {
            lines.push(String::new());
            for delta in &result.deltas {
                let color = if delta.delta < 0.0 {
                    self.theme.error
                } else {
                    self.theme.success
                };
                lines.push(format!(
                    "  {:<24}{}",
                    format_name(delta.category.name()),
                    self.paint(&format!("{:+.1}", delta.delta), color)
                ));
            }
        }

        self.push_recommendations(&mut lines, result.recommendations.iter().map(String::as_str));
        self.panel(&format!("QA · {}", result.location), &lines)
    }

    /// SEO score with recommendations grouped by severity.
    pub fn render_seo(&self, location: &str, result: &SeoOptimizationResult) -> String {
        let mut lines = vec![format!(
            "{} mode score {}",
            result.mode,
            self.paint(
                &format!("{:.1}", result.overall_score),
                self.theme.for_score(result.overall_score)
            )
        )];
        lines.push(format!(
            "high {}  medium {}  low {}",
            result.count_by_severity(Severity::High),
            result.count_by_severity(Severity::Medium),
            result.count_by_severity(Severity::Low),
        ));
        let mut recommendations: Vec<_> = result.recommendations.iter().collect();
        recommendations.sort_by_key(|r| r.severity);
        for rec in recommendations.iter().take(MAX_RECOMMENDATIONS) {
            let color = match rec.severity {
                Severity::High => self.theme.error,
                Severity::Medium => self.theme.warning,
                Severity::Low => self.theme.muted,
            };
            lines.push(format!(
                "{} {}",
                self.paint(&format!("[{}]", rec.severity), color),
                rec.message
            ));
        }
        if recommendations.len() > MAX_RECOMMENDATIONS {
            lines.push(self.paint(
                &format!("... {} more", recommendations.len() - MAX_RECOMMENDATIONS),
                self.theme.muted,
            ));
        }
        self.panel(&format!("SEO · {location}"), &lines)
    }

    pub fn render_batch(&self, report: &BatchReport) -> String {
        let mut lines = Vec::new();
        for summary in &report.succeeded {
            lines.push(format!(
                "{} {:<22} seo {:>5.1}  qa {:>5.1}  {}",
                self.paint("✓", self.theme.success),
                summary.location,
                summary.seo_score,
                summary.qa_score,
                self.paint(
                    &summary.certification.to_string(),
                    self.theme.for_certification(summary.certification)
                ),
            ));
        }
        for failure in &report.failed {
            lines.push(format!(
                "{} {:<22} {}",
                self.paint("✗", self.theme.error),
                failure.location,
                self.paint(&format!("{} stage", failure.stage), self.theme.error),
            ));
        }
        lines.push(String::new());
        let summary = format!("{}/{} locations succeeded", report.succeeded.len(), report.total());
        let color = if report.all_succeeded() {
            self.theme.success
        } else {
            self.theme.warning
        };
        lines.push(self.paint(&summary, color));
        if let Some(avg) = report.average_qa_score() {
            lines.push(format!("Average QA score {avg:.1}"));
        }
        self.panel("Batch", &lines)
    }

    pub fn render_registry(&self, entries: &[RegistryEntry]) -> String {
        if entries.is_empty() {
            return self.panel("Registry", &[self.paint("No locations yet", self.theme.muted)]);
        }
        let lines: Vec<String> = entries
            .iter()
            .map(|entry| {
                format!(
                    "{} {:<9} {:<7} {:>6}  {}",
                    self.paint(&format!("{:<24}", entry.slug), self.theme.highlight),
                    entry.status,
                    entry.priority,
                    entry.search_volume,
                    entry.last_updated.format("%Y-%m-%d"),
                )
            })
            .collect();
        self.panel(&format!("Registry · {} locations", entries.len()), &lines)
    }

    fn push_recommendations<'a>(
        &self,
        lines: &mut Vec<String>,
        recommendations: impl ExactSizeIterator<Item = &'a str>,
    ) {
        let total = recommendations.len();
        if total == 0 {
            return;
        }
        lines.push(String::new());
        lines.push("Recommendations".to_string());
        for rec in recommendations.take(MAX_RECOMMENDATIONS) {
            lines.push(format!("  • {rec}"));
        }
        if total > MAX_RECOMMENDATIONS {
            lines.push(self.paint(
                &format!("  ... {} more", total - MAX_RECOMMENDATIONS),
                self.theme.muted,
            ));
        }
    }

    fn panel(&self, title: &str, lines: &[String]) -> String {
        let inner_width = self.width - 2;
        let mut output = String::new();
        output.push_str(&format!("╭{}╮\n", "─".repeat(inner_width)));
        output.push_str(&self.boxed_line(title));
        output.push_str(&format!("├{}┤\n", "─".repeat(inner_width)));
        for line in lines {
            output.push_str(&self.boxed_line(line));
        }
        output.push_str(&format!("╰{}╯", "─".repeat(inner_width)));
        output
    }

    fn boxed_line(&self, line: &str) -> String {
        let inner_width = self.width - 2;
        let max = inner_width - 2;
        let line = if visible_length(line) > max {
            truncate_plain(&strip_ansi(line), max)
        } else {
            line.to_string()
        };
        let padding = max.saturating_sub(visible_length(&line));
        format!("│ {}{} │\n", line, " ".repeat(padding))
    }

    fn paint(&self, text: &str, color: Rgb) -> String {
        if self.colors_enabled {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn status(&self, status: TestStatus) -> String {
        let color = match status {
            TestStatus::Passed => self.theme.success,
            TestStatus::Failed => self.theme.error,
            TestStatus::Skipped => self.theme.muted,
        };
        self.paint(status_icon(status), color)
    }

    fn flag(&self, ok: bool) -> String {
        if ok {
            self.paint("✓", self.theme.success)
        } else {
            self.paint("✗", self.theme.error)
        }
    }
}

/// `content_quality` -> `Content Quality`.
fn format_name(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible length of a string, excluding ANSI escape codes.
fn visible_length(s: &str) -> usize {
    let mut in_escape = false;
    let mut len = 0;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else {
            len += 1;
        }
    }
    len
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' {
            in_escape = true;
        } else if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn truncate_plain(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
