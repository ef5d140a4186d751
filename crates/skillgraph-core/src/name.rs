//! Name normalisation and similarity scoring for competency and skill names.
//!
//! Names arriving from generators and extraction pipelines vary in case,
//! spacing and punctuation ("React.js", "react-js", "ReactJS"). Every lookup
//! key in the store is the [`normalize_name`] form; alias detection compares
//! the [`compact_name`] form.

use std::collections::HashMap;

/// Score for two names whose compact forms are identical.
pub const EXACT_SCORE: u8 = 100;
/// Score for one compact form containing the other.
pub const CONTAINMENT_SCORE: u8 = 80;
/// Upper bound of the character-overlap score.
pub const MAX_OVERLAP_SCORE: u8 = 60;

/// Lowercase, trim, map `.`, `_` and `-` to spaces, collapse whitespace.
pub fn normalize_name(raw: &str) -> String {
  let mapped: String = raw
    .trim()
    .to_lowercase()
    .chars()
    .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
    .collect();
  mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The normalised form with all separators removed: `"react.js"` and
/// `"React JS"` both become `"reactjs"`.
pub fn compact_name(raw: &str) -> String {
  normalize_name(raw).chars().filter(|c| !c.is_whitespace()).collect()
}

/// Score how likely two names denote the same entity, on a 0–100 scale.
///
/// Both arguments may be raw; they are compacted first. Containment in either
/// direction scores [`CONTAINMENT_SCORE`] regardless of length.
pub fn similarity_score(a: &str, b: &str) -> u8 {
  let a = compact_name(a);
  let b = compact_name(b);
  if a.is_empty() || b.is_empty() {
    return 0;
  }
  if a == b {
    return EXACT_SCORE;
  }

  if a.contains(b.as_str()) || b.contains(a.as_str()) {
    return CONTAINMENT_SCORE;
  }

  let longer = a.chars().count().max(b.chars().count());
  overlap_score(&a, &b, longer)
}

/// Multiset character intersection over the longer length, scaled to
/// [`MAX_OVERLAP_SCORE`].
fn overlap_score(a: &str, b: &str, longer: usize) -> u8 {
  let mut counts: HashMap<char, usize> = HashMap::new();
  for c in a.chars() {
    *counts.entry(c).or_default() += 1;
  }
  let mut common = 0usize;
  for c in b.chars() {
    if let Some(n) = counts.get_mut(&c)
      && *n > 0
    {
      *n -= 1;
      common += 1;
    }
  }
  let ratio = common as f64 / longer as f64;
  (ratio * MAX_OVERLAP_SCORE as f64).floor() as u8
}

/// Substring fragments used to pull near-name candidates from the store: the
/// whole compact form, every token of three or more characters, and the
/// three-character prefix of the compact form.
pub fn search_fragments(raw: &str) -> Vec<String> {
  let normalized = normalize_name(raw);
  let compact = compact_name(&normalized);
  let mut fragments = Vec::new();
  if !compact.is_empty() {
    fragments.push(compact.clone());
  }
  for token in normalized.split(' ').filter(|t| t.chars().count() >= 3) {
    if !fragments.iter().any(|f| f == token) {
      fragments.push(token.to_owned());
    }
  }

  let prefix: String = compact.chars().take(3).collect();
  if prefix.chars().count() == 3 && !fragments.contains(&prefix) {
    fragments.push(prefix);
  }
  fragments
}
