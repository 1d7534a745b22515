//! Bad-language filter.
//!
//! Words and phrases are compared after [`normalize`], on whole-word
//! boundaries, so "cho" does not match inside "chocolate".

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::text_processing::normalize;

#[derive(Debug, Clone, Default)]
pub struct ModerationFilter {
    /// Normalized entries, each padded with one space on both sides
    patterns: Vec<(String, String)>,
}

impl ModerationFilter {
    /// Build a filter from raw words; blank entries are ignored
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = words
            .into_iter()
            .filter_map(|word| {
                let raw = word.as_ref().trim();
                let key = squash_words(&normalize(raw));
                (!key.is_empty()).then(|| (raw.to_string(), format!(" {key} ")))
            })
            .collect();

        Self { patterns }
    }

    /// Load a newline-separated word list; lines starting with `#` are comments
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read bad words list {}", path.display()))?;

        let filter = Self::new(
            content
                .lines()
                .filter(|line| !line.trim_start().starts_with('#')),
        );
        info!(path = %path.display(), words = filter.len(), "Loaded moderation list");
        Ok(filter)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First listed word found in `text`, as it was written in the list
    pub fn find_violation(&self, text: &str) -> Option<&str> {
        if self.patterns.is_empty() {
            return None;
        }

        let haystack = format!(" {} ", squash_words(&normalize(text)));
        self.patterns
            .iter()
            .find(|(_, padded)| haystack.contains(padded.as_str()))
            .map(|(raw, _)| raw.as_str())
    }
}

/// Replace punctuation with spaces and collapse whitespace runs
fn squash_words(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
