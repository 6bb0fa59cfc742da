//! Internal and external link counting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\(([^)\s]+)\)").expect("valid markdown link regex"));
static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid href regex"));
static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s)\]<>]+").expect("valid url regex"));

/// Links found in a block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

impl LinkReport {
    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    pub fn external_count(&self) -> usize {
        self.external.len()
    }

    /// Whether the text already links to `path`.
    pub fn links_to(&self, path: &str) -> bool {
        self.internal.iter().any(|link| link == path)
    }
}

/// Finds markdown links, `href` attributes, bare URLs and bare mentions of
/// known site paths.
#[derive(Debug, Clone, Default)]
pub struct LinkAnalyzer {
    internal_paths: Vec<String>,
    site_url: Option<String>,
}

impl LinkAnalyzer {
    pub fn new(internal_paths: Vec<String>) -> Self {
        Self {
            internal_paths,
            site_url: None,
        }
    }

    /// Absolute URLs under `site_url` count as internal.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        let url: String = site_url.into();
        self.site_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn analyze(&self, text: &str) -> LinkReport {
        let mut report = LinkReport::default();
        let mut remaining = text.to_string();

        for pattern in [&*MARKDOWN_LINK, &*HREF] {
            for caps in pattern.captures_iter(text) {
                self.classify(&caps[1], &mut report);
            }
            remaining = pattern.replace_all(&remaining, " ").into_owned();
        }
        for found in BARE_URL.find_iter(&remaining) {
            self.classify(found.as_str(), &mut report);
        }
        let remaining = BARE_URL.replace_all(&remaining, " ");

        for path in &self.internal_paths {
            for _ in bare_mentions(&remaining, path) {
                report.internal.push(path.clone());
            }
        }
        report
    }

    fn classify(&self, target: &str, report: &mut LinkReport) {
        if target.starts_with('/') || target.starts_with('#') {
            report.internal.push(target.to_string());
            return;
        }
        if let Some(site) = &self.site_url {
            if let Some(path) = target.strip_prefix(site.as_str()) {
                let path = if path.is_empty() { "/" } else { path };
                report.internal.push(path.to_string());
                return;
            }
        }
        if target.starts_with("http://") || target.starts_with("https://") {
            report.external.push(target.to_string());
        }
    }
}

/// Byte offsets of `path` standing alone in prose, not as part of a longer
/// path.
fn bare_mentions<'a>(text: &'a str, path: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(path).filter_map(move |(idx, _)| {
        let before = text[..idx].chars().next_back();
        let after = text[idx + path.len()..].chars().next();
        let starts_clean = before.map_or(true, |c| c.is_whitespace() || c == '(');
        let ends_clean = after.map_or(true, |c| !(c.is_alphanumeric() || c == '/' || c == '-'));
        (starts_clean && ends_clean).then_some(idx)
    })
}
