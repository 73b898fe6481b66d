//! Name and title matching policies.
//!
//! Two predicates drive curated highlighting: finding the lab PI in an author
//! list, and deciding whether a work appears in a curated list of titles
//! (e.g. papers where the PI is corresponding author).

use serde::{Deserialize, Serialize};

/// Locates the PI within an author list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PiMatcher {
    name_variants: Vec<String>,
    author_ids: Vec<String>,
}

impl PiMatcher {
    /// Build a matcher from name variants ("EK Lee", "E.K. Lee", ...) and
    /// persistent author ids. Ids are compared without any URL prefix.
    pub fn new(name_variants: Vec<String>, author_ids: Vec<String>) -> Self {
        Self {
            name_variants: name_variants
                .into_iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            author_ids: author_ids.iter().map(|id| short_id(id).to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name_variants.is_empty() && self.author_ids.is_empty()
    }

    /// Index of the PI in `authors`
    ///
    /// A persistent id match wins over a name match; otherwise the first
    /// author whose trimmed name equals one of the variants is returned.
    pub fn find(&self, authors: &[String], author_ids: &[Option<String>]) -> Option<usize> {
        if !self.author_ids.is_empty() {
            let by_id = author_ids.iter().position(|id| {
                id.as_deref()
                    .map(|id| self.author_ids.iter().any(|known| known == short_id(id)))
                    .unwrap_or(false)
            });
            if by_id.is_some() {
                return by_id;
            }
        }

        authors
            .iter()
            .position(|name| self.name_variants.iter().any(|v| v == name.trim()))
    }
}

/// Strip a URL prefix from an identifier ("https://openalex.org/A1" -> "A1")
pub fn short_id(id: &str) -> &str {
    id.trim().rsplit('/').next().unwrap_or(id)
}

/// How curated title patterns are compared with work titles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Case-insensitive substring match in either direction, tolerating
    /// partial titles in the curated list
    #[default]
    SubstringEitherWay,
    /// Case-insensitive equality after trimming
    Exact,
}

/// Matches work titles against a curated list of patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleMatcher {
    patterns: Vec<String>,
    strategy: MatchStrategy,
}

impl TitleMatcher {
    pub fn new(patterns: Vec<String>, strategy: MatchStrategy) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            strategy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether the title matches any pattern
    pub fn matches(&self, title: &str) -> bool {
        let title = title.trim().to_lowercase();
        if title.is_empty() {
            return false;
        }

        self.patterns.iter().any(|pattern| match self.strategy {
            MatchStrategy::SubstringEitherWay => {
                title.contains(pattern.as_str()) || pattern.contains(title.as_str())
            }
            MatchStrategy::Exact => *pattern == title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pi_by_name() {
        let pi = PiMatcher::new(names(&["EK Lee", "E.K. Lee"]), vec![]);
        assert_eq!(pi.find(&names(&["J Kim", "E.K. Lee", "S Park"]), &[]), Some(1));
        assert_eq!(pi.find(&names(&["J Kim", "EK Leeson"]), &[]), None);
        assert_eq!(pi.find(&[], &[]), None);
    }

    #[test]
    fn test_pi_by_id_wins() {
        let pi = PiMatcher::new(names(&["EK Lee"]), names(&["https://openalex.org/A42"]));
        let authors = names(&["EK Lee", "Eun-Kyung Lee"]);
        let ids = vec![Some("https://openalex.org/A7".to_string()), Some("A42".to_string())];
        assert_eq!(pi.find(&authors, &ids), Some(1));

        // Falls back to names when no id matches
        let ids = vec![None, Some("A9".to_string())];
        assert_eq!(pi.find(&authors, &ids), Some(0));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("https://openalex.org/A5023888391"), "A5023888391");
        assert_eq!(short_id("A5023888391"), "A5023888391");
    }

    #[test]
    fn test_title_substring_either_way() {
        let matcher = TitleMatcher::new(
            names(&["High-entropy oxide cathodes", "A complete title about perovskites and more"]),
            MatchStrategy::SubstringEitherWay,
        );

        // pattern in title
        assert!(matcher.matches("Designing HIGH-ENTROPY OXIDE CATHODES for sodium batteries"));
        // title in pattern
        assert!(matcher.matches("a complete title about perovskites"));
        assert!(!matcher.matches("Unrelated work"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_title_exact() {
        let matcher = TitleMatcher::new(names(&["Exact Title"]), MatchStrategy::Exact);
        assert!(matcher.matches("  exact title "));
        assert!(!matcher.matches("Exact Title, extended"));
    }
}
