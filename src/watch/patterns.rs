// src/watch/patterns.rs

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Which changed files count as scene sources.
///
/// Paths are relative to the subscribed directory, e.g. `"js/app.js"`. A path
/// matches when it hits an `include` glob and no `exclude` glob; with the
/// defaults that means plain `.js` sources, never minified bundles (which the
/// compiler itself may be writing).
#[derive(Debug, Clone)]
pub struct SourceFilter {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl SourceFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_globset(include).context("building include globset")?;
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude).context("building exclude globset")?)
        };
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::new(&["**/*.js".to_string()], &["**/*.min.js".to_string()])
            .expect("built-in source patterns are valid")
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
