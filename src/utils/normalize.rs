//! Venue normalization.
//!
//! Bibliographic sources and the journal metadata service share no identifier,
//! so works are joined to journal metrics through a canonical key derived from
//! the venue string alone. The function must stay pure and deterministic.

use regex::Regex;
use std::sync::OnceLock;

/// A run of digits preceded by whitespace and followed by `(` or `,`,
/// e.g. the " 35 (" in "Advanced Materials 35 (12), 2417539".
const VOLUME_MARKER: &str = r"\s\d+\s*[(,]";

static VOLUME_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn volume_marker() -> Option<&'static Regex> {
    VOLUME_RE.get_or_init(|| Regex::new(VOLUME_MARKER).ok()).as_ref()
}

/// Map a raw venue string to its canonical journal key
///
/// Strips volume/issue/page suffixes, trailing punctuation and surplus
/// whitespace, then lowercases. Empty input yields the empty key.
pub fn normalize_venue(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return String::new();
    }

    let truncated = match volume_marker().and_then(|re| re.find(&collapsed)) {
        Some(m) => &collapsed[..m.start()],
        None => collapsed.as_str(),
    };

    let key = trim_trailing(truncated);
    if key.is_empty() {
        // Never throw every character away
        return trim_trailing(&collapsed).to_lowercase();
    }
    key.to_lowercase()
}

fn trim_trailing(s: &str) -> &str {
    s.trim_end_matches(|c: char| {
        c.is_whitespace() || (c.is_ascii_punctuation() && !matches!(c, ')' | ']' | '}'))
    })
    .trim_start()
}
