use std::fmt;

use serde::Serialize;

const KNOWN_SUFFIXES: [&str; 5] = [".zip", ".ocrd", ".txt", ".nf", ".json"];

/// Comparison-safe identity of a ground truth or workflow.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for CanonicalId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CanonicalId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reduces a workspace or workflow id to its last path segment without
/// query, fragment or archive/definition suffixes.
///
/// `https://example.org/gt/16_ant_complex.ocrd.zip?raw=1` and `16_ant_complex`
/// both normalize to `16_ant_complex`. Ids without embedded structure pass
/// through unchanged apart from surrounding whitespace.
pub fn normalize(raw_id: &str) -> CanonicalId {
    let trimmed = raw_id.trim();
    let without_query = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches(|c: char| c == '/' || c.is_whitespace());
    let segment = without_query
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .trim();

    let mut stem = segment;
    while let Some(stripped) = KNOWN_SUFFIXES
        .iter()
        .find_map(|suffix| strip_suffix_ignore_case(stem, suffix))
    {
        stem = stripped.trim_end();
    }

    if stem.is_empty() {
        return CanonicalId(trimmed.to_string());
    }
    CanonicalId(stem.to_string())
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split_at = value.len().checked_sub(suffix.len())?;
    if !value.is_char_boundary(split_at) {
        return None;
    }
    let (head, tail) = value.split_at(split_at);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}
