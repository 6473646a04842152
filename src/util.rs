//! Shared utility functions.

use regex::Regex;

use crate::Result;

/// Case-insensitive literal keyword search.
///
/// Used wherever free-form failure text has to be sorted into a fixed
/// category: recoverable dependency failures and critical validation issues.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    regex: Option<Regex>,
}

impl KeywordMatcher {
    /// Build a matcher from literal keywords. Blank entries are ignored.
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let regex = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("(?i)(?:{alternation})"))?)
        };

        Ok(Self { keywords, regex })
    }

    /// A matcher that never matches.
    pub fn empty() -> Self {
        Self {
            keywords: Vec::new(),
            regex: None,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }

    /// Return the first keyword occurrence found in `text`, lowercased.
    pub fn find(&self, text: &str) -> Option<String> {
        self.regex
            .as_ref()
            .and_then(|r| r.find(text))
            .map(|m| m.as_str().to_lowercase())
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Keep the last `max_chars` characters of command output.
pub fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}
