//! The rule fold.
//!
//! [`PatchEngine::run`] threads one [`Document`] through every rule of a
//! [`RuleSet`], left to right, collecting one result per rule whatever the
//! outcome. A required-rule miss never stops the fold: the caller always
//! gets the fully folded document and the complete report, then decides.

use crate::document::Document;
use crate::report::Report;
use crate::ruleset::RuleSet;
use crate::verify;
use tracing::{debug, info, warn};

/// Applies a rule set to documents. Holds no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct PatchEngine<'a> {
    ruleset: &'a RuleSet,
}

impl<'a> PatchEngine<'a> {
    pub fn new(ruleset: &'a RuleSet) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &'a RuleSet {
        self.ruleset
    }

    /// Fold every rule over `doc`, then verify the result.
    pub fn run(&self, doc: Document) -> (Document, Report) {
        let input_digest = doc.digest();
        let rules = self.ruleset.rules();
        let mut results = Vec::with_capacity(rules.len());

        let doc = rules.iter().fold(doc, |doc, rule| {
            let (next, result) = rule.apply(doc);
            debug!(
                rule = %rule.id,
                matcher = %rule.matcher,
                status = ?result.status,
                occurrences = result.occurrences,
                found = result.found,
                "rule evaluated"
            );
            if result.is_required_miss() {
                warn!(
                    rule = %rule.id,
                    already_applied = result.already_applied,
                    near_line = ?result.near_miss.as_ref().map(|n| n.line),
                    "required rule matched nothing"
                );
            }
            results.push(result);
            next
        });

        let violations = verify::check(&doc, self.ruleset.expectations());
        for violation in &violations {
            warn!(%violation, "post-condition failed");
        }

        let report = Report {
            ruleset: self.ruleset.name().to_string(),
            results,
            violations,
            input_digest,
            output_digest: doc.digest(),
        };

        info!(
            ruleset = %report.ruleset,
            rules = report.results.len(),
            occurrences = report.total_occurrences(),
            changed = report.changed(),
            success = report.is_success(),
            "rule set applied"
        );

        (doc, report)
    }
}

/// Convenience for a one-off run.
pub fn run(ruleset: &RuleSet, doc: Document) -> (Document, Report) {
    PatchEngine::new(ruleset).run(doc)
}
