//! Lazily compiled patterns that degrade to "no match" instead of panicking

use regex::{Captures, Regex};
use std::borrow::Cow;
use tracing::error;

pub struct Pattern(Option<Regex>);

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Self(Some(regex)),
            Err(e) => {
                error!("❌ Invalid pattern '{}': {}", pattern, e);
                Self(None)
            }
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.0.as_ref().and_then(|re| re.captures(text))
    }

    /// First capture group as text
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    pub fn replace_all<'t>(&self, text: &'t str, replacement: &str) -> Cow<'t, str> {
        match &self.0 {
            Some(re) => re.replace_all(text, replacement),
            None => Cow::Borrowed(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pattern_never_matches() {
        let broken = Pattern::new("(unclosed");
        assert!(!broken.is_match("(unclosed"));
        assert_eq!(broken.replace_all("abc", "x"), "abc");
    }
}
