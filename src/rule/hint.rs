//! Near-miss hints for rules that matched nothing.
//!
//! A verbatim matcher fails when the buffer's formatting drifts from the
//! rule's literal (`< section` vs `<section`). Pointing at the closest line
//! turns "0 occurrences" into something an operator can act on.

use serde::Serialize;
use strsim::normalized_levenshtein;

/// Lines scoring below this are not reported.
pub const NEAR_MISS_THRESHOLD: f64 = 0.75;

/// The document line most similar to a rule's literal target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearMiss {
    /// 1-based line number in the buffer the rule was evaluated against.
    pub line: usize,
    pub text: String,
    pub similarity: f64,
}

/// Find the line of `haystack` closest to the first non-blank line of
/// `target`, comparing both with surrounding whitespace trimmed.
pub fn nearest_line(haystack: &str, target: &str) -> Option<NearMiss> {
    let probe = target.lines().map(str::trim).find(|l| !l.is_empty())?;

    let mut best: Option<NearMiss> = None;
    for (idx, line) in haystack.lines().enumerate() {
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }
        let similarity = normalized_levenshtein(probe, candidate);
        if similarity < NEAR_MISS_THRESHOLD {
            continue;
        }
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(NearMiss {
                line: idx + 1,
                text: candidate.to_string(),
                similarity,
            });
        }
    }

    best
}
