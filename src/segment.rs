//! Splits a page's text runs into student names.
//!
//! Names are printed larger than the surrounding detail text, and every
//! student block ends with a detail line containing the marker token. The
//! marker line's font size is the baseline; runs noticeably larger than it
//! are name parts.

use std::fmt;

use crate::config::ExtractionConfig;
use crate::source::PositionedTextRun;

/// One detected student's full name. Always trimmed and longer than one character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameGroup(String);

impl NameGroup {
    fn from_parts(parts: &[String]) -> Option<Self> {
        let joined = parts.join(" ");
        let trimmed = joined.trim();
        (trimmed.chars().count() > 1).then(|| Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NameGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_marker(text: &str, marker: &str) -> bool {
    text.to_lowercase().contains(marker)
}

/// Emphasis a run must reach to count as part of a name.
pub fn name_threshold(runs: &[PositionedTextRun], config: &ExtractionConfig) -> f32 {
    let marker = config.marker_lowercase();
    let baseline = runs
        .iter()
        .find(|run| is_marker(&run.text, &marker))
        .map(|run| run.emphasis)
        .unwrap_or(config.default_baseline);
    baseline * config.emphasis_ratio
}

/// Group a page's runs into names, in page order.
pub fn segment_names(runs: &[PositionedTextRun], config: &ExtractionConfig) -> Vec<NameGroup> {
    let marker = config.marker_lowercase();
    let threshold = name_threshold(runs, config);
    let mut names = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    let mut saw_marker = false;

    for run in runs {
        let text = run.text.trim();
        if is_marker(text, &marker) {
            saw_marker = true;
            if !parts.is_empty() {
                names.extend(NameGroup::from_parts(&parts));
                parts.clear();
            }
        } else if run.emphasis >= threshold && text.chars().count() > 1 {
            parts.push(text.to_owned());
        }
    }

    // The last student on a page has no trailing marker.
    if saw_marker && !parts.is_empty() {
        names.extend(NameGroup::from_parts(&parts));
    }

    log::debug!(
        "segmented {} names (threshold {:.2}) from {} runs",
        names.len(),
        threshold,
        runs.len()
    );
    names
}
