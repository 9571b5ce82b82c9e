//! Post-conditions checked after every rule has run.

use crate::document::Document;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationKind {
    /// The needle must occur at least once.
    Present,
    /// The needle must not occur.
    Absent,
}

/// A literal needle that must (or must not) be in the final buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expectation {
    pub kind: ExpectationKind,
    pub needle: String,
}

impl Expectation {
    pub fn present(needle: impl Into<String>) -> Self {
        Self {
            kind: ExpectationKind::Present,
            needle: needle.into(),
        }
    }

    pub fn absent(needle: impl Into<String>) -> Self {
        Self {
            kind: ExpectationKind::Absent,
            needle: needle.into(),
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ExpectationKind::Present => write!(f, "present {:?}", self.needle),
            ExpectationKind::Absent => write!(f, "absent {:?}", self.needle),
        }
    }
}

/// An unmet expectation plus how often the needle actually occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub expectation: Expectation,
    pub occurrences: usize,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expectation.kind {
            ExpectationKind::Present => {
                write!(f, "expected {:?} to be present, found none", self.expectation.needle)
            }
            ExpectationKind::Absent => write!(
                f,
                "expected {:?} to be absent, found {} occurrence(s)",
                self.expectation.needle, self.occurrences
            ),
        }
    }
}

/// Scan `doc` against every expectation and return all violations, in
/// declaration order.
pub fn check(doc: &Document, expectations: &[Expectation]) -> Vec<Violation> {
    expectations
        .iter()
        .filter_map(|expectation| {
            let occurrences = doc.count(&expectation.needle);
            let violated = match expectation.kind {
                ExpectationKind::Present => occurrences == 0,
                ExpectationKind::Absent => occurrences > 0,
            };
            violated.then(|| Violation {
                expectation: expectation.clone(),
                occurrences,
            })
        })
        .collect()
}
