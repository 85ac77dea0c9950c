//! Visual style template resolution
//!
//! The style template maps node size continuously onto the PSM score. Its two
//! anchor points are placeholders that only make sense once the data range is
//! known, so every run derives a resolved copy from the template text.

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Placeholder replaced with the smallest score
pub const LOW_ANCHOR: &str = "@PSM_MIN@";

/// Placeholder replaced with the largest score
pub const HIGH_ANCHOR: &str = "@PSM_MAX@";

/// Template shipped with the crate
pub const BUNDLED_TEMPLATE: &str = include_str!("../assets/style.xml");

/// Style template text and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTemplate {
    text: String,
    source: Option<PathBuf>,
}

impl StyleTemplate {
    /// The bundled template
    pub fn bundled() -> Self {
        Self {
            text: BUNDLED_TEMPLATE.to_string(),
            source: None,
        }
    }

    /// Read a template from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Ok(Self {
            text,
            source: Some(path.to_path_buf()),
        })
    }

    /// Template from in-memory text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the template was read from, `None` for the bundled one
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Resolved copy of the template for these scores
    pub fn resolve(&self, scores: &[f64]) -> Result<String> {
        resolve_style(&self.text, scores)
    }
}

/// Smallest and largest score
pub fn score_bounds(scores: &[f64]) -> Result<(f64, f64)> {
    let mut iter = scores.iter().copied();
    let first = iter.next().ok_or(CoreError::EmptyScores)?;
    Ok(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Replace both anchors in `template` with the score range
///
/// Both anchors must be present before anything is substituted.
pub fn resolve_style(template: &str, scores: &[f64]) -> Result<String> {
    let (min_score, max_score) = score_bounds(scores)?;

    for anchor in [LOW_ANCHOR, HIGH_ANCHOR] {
        if !template.contains(anchor) {
            return Err(CoreError::StyleAnchorMissing {
                anchor: anchor.to_string(),
            });
        }
    }

    debug!(min_score, max_score, "Resolving style anchors");
    Ok(template
        .replace(LOW_ANCHOR, &format_anchor(min_score))
        .replace(HIGH_ANCHOR, &format_anchor(max_score)))
}

/// Anchor values always carry a decimal part: `2.0`, `35.0`, `2.5`
pub fn format_anchor(value: f64) -> String {
    format!("{:?}", value)
}
