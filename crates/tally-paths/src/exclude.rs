//! Exclude patterns applied to candidate file sets.

use glob::Pattern;

use crate::error::{PathError, PathResult};
use crate::normalize::normalize_str;

/// A set of glob patterns; a path is excluded when a pattern matches the
/// path itself or any of its ancestor directories.
#[derive(Clone, Debug, Default)]
pub struct ExcludeSet {
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> PathResult<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                let normalized = normalize_str(raw)?;
                Pattern::new(&normalized).map_err(|e| PathError::InvalidGlob {
                    pattern: raw.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<PathResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, relative: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let mut prefix_end = Some(relative.len());
        while let Some(end) = prefix_end {
            let candidate = &relative[..end];
            if self.patterns.iter().any(|p| p.matches(candidate)) {
                return true;
            }
            prefix_end = candidate.rfind('/');
        }
        false
    }
}
