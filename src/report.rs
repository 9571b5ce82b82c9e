use crate::document::Digest;
use crate::rule::ApplicationResult;
use crate::verify::Violation;
use serde::Serialize;
use thiserror::Error;

/// Soft failures surfaced by a run. Neither aborts the fold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatchFailure {
    #[error("required rule '{rule_id}' matched 0 occurrences")]
    RequiredRuleMissed { rule_id: String },

    #[error("verification failed: {0}")]
    VerificationViolation(Violation),
}

/// Everything that happened during one run: one result per rule, in
/// declaration order, plus the verifier outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[must_use = "Report should be checked for failures"]
pub struct Report {
    pub ruleset: String,
    pub results: Vec<ApplicationResult>,
    pub violations: Vec<Violation>,
    pub input_digest: Digest,
    pub output_digest: Digest,
}

impl Report {
    /// Every failure, required-rule misses first, then violations.
    pub fn failures(&self) -> Vec<PatchFailure> {
        let missed = self
            .results
            .iter()
            .filter(|r| r.is_required_miss())
            .map(|r| PatchFailure::RequiredRuleMissed {
                rule_id: r.rule_id.clone(),
            });
        let violated = self
            .violations
            .iter()
            .cloned()
            .map(PatchFailure::VerificationViolation);
        missed.chain(violated).collect()
    }

    /// All required rules matched and every expectation held.
    pub fn is_success(&self) -> bool {
        self.violations.is_empty() && !self.results.iter().any(|r| r.is_required_miss())
    }

    /// The output differs from the input.
    pub fn changed(&self) -> bool {
        self.input_digest != self.output_digest
    }

    /// Nothing changed, every expectation held, and every required rule
    /// that missed already finds its replacement in the buffer.
    ///
    /// This is how a rerun over a migrated document is told apart from
    /// drift: both report zero occurrences, only one carries the hints.
    pub fn already_migrated(&self) -> bool {
        !self.changed()
            && self.violations.is_empty()
            && self
                .results
                .iter()
                .filter(|r| r.is_required_miss())
                .all(|r| r.already_applied)
    }

    pub fn result(&self, rule_id: &str) -> Option<&ApplicationResult> {
        self.results.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn total_occurrences(&self) -> usize {
        self.results.iter().map(|r| r.occurrences).sum()
    }
}
