//! Glob filtering of INFO keys.

use glob::{MatchOptions, Pattern};
use shard_info_sdk::InfoMap;

use super::error::DomainError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Keeps the INFO keys matching at least one glob pattern.
///
/// Patterns are anchored to the whole key: `*` matches any run of
/// characters, `?` a single one, `[...]` a character class.
#[derive(Debug, Clone, Default)]
pub struct KeyFilter {
    /// `None` keeps every key.
    patterns: Option<Vec<Pattern>>,
}

impl KeyFilter {
    /// Compiles `patterns`. `None` and an empty list both keep every key.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidKeyPattern` for the first malformed pattern.
    pub fn new(patterns: Option<&[String]>) -> Result<Self, DomainError> {
        let patterns = match patterns {
            None | Some([]) => None,
            Some(raw) => Some(
                raw.iter()
                    .map(|p| {
                        Pattern::new(p).map_err(|e| DomainError::InvalidKeyPattern {
                            pattern: p.clone(),
                            reason: e.msg.to_owned(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        };
        Ok(Self { patterns })
    }

    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.patterns.as_ref().is_none_or(|patterns| {
            patterns
                .iter()
                .any(|p| p.matches_with(key, MATCH_OPTIONS))
        })
    }

    #[must_use]
    pub fn apply(&self, info: &InfoMap) -> InfoMap {
        if self.patterns.is_none() {
            return info.clone();
        }
        info.iter()
            .filter(|(key, _)| self.matches(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(patterns: &[&str]) -> KeyFilter {
        let owned: Vec<String> = patterns.iter().map(|p| (*p).to_owned()).collect();
        KeyFilter::new(Some(owned.as_slice())).unwrap()
    }

    #[test]
    fn no_patterns_keeps_everything() {
        let f = KeyFilter::new(None).unwrap();
        assert!(f.matches("anything"));
        assert!(KeyFilter::new(Some(&[] as &[String])).unwrap().matches("anything"));
    }

    #[test]
    fn star_matches_any_run() {
        let f = filter(&["used_memory*"]);
        assert!(f.matches("used_memory"));
        assert!(f.matches("used_memory_peak_human"));
        assert!(!f.matches("total_used_memory"));
    }

    #[test]
    fn matching_is_anchored_and_case_sensitive() {
        let f = filter(&["role"]);
        assert!(f.matches("role"));
        assert!(!f.matches("roles"));
        assert!(!f.matches("ROLE"));
    }

    #[test]
    fn any_pattern_may_match() {
        let f = filter(&["db?", "*_human"]);
        assert!(f.matches("db0"));
        assert!(f.matches("used_memory_human"));
        assert!(!f.matches("db10"));
    }

    #[test]
    fn star_crosses_separators() {
        assert!(filter(&["a*z"]).matches("a/b/c.z"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = KeyFilter::new(Some(&["[unclosed".to_owned()][..])).unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidKeyPattern { ref pattern, .. } if pattern == "[unclosed"
        ));
    }

    #[test]
    fn apply_filters_map() {
        let mut info = InfoMap::new();
        info.insert("dummy_key1".to_owned(), json!("x"));
        info.insert("removed_key1".to_owned(), json!("y"));

        let filtered = filter(&["dummy*"]).apply(&info);
        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("dummy_key1"));
    }
}
