//! One document, end to end: load once, fold, verify, save at most once.

use crate::document::Document;
use crate::engine::PatchEngine;
use crate::report::Report;
use crate::ruleset::RuleSet;
use crate::store::{DocumentStore, StoreError};
use std::path::Path;
use tracing::{debug, info};

/// When the folded document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Persist whenever the document changed, even with soft failures.
    #[default]
    Always,
    /// Persist only if the report is a success.
    OnSuccess,
    /// Never persist (dry run / status check).
    Never,
}

/// Result of a full pipeline pass.
#[derive(Debug, Clone)]
#[must_use = "PatchOutcome carries the report; check it for failures"]
pub struct PatchOutcome {
    pub original: Document,
    pub patched: Document,
    pub report: Report,
    pub written: bool,
}

/// Load `path` from `store`, apply `ruleset`, and save per `mode`.
///
/// Only store errors are returned as `Err`; rule misses and verification
/// violations live in the report.
pub fn patch_document(
    store: &dyn DocumentStore,
    path: &Path,
    ruleset: &RuleSet,
    mode: WriteMode,
) -> Result<PatchOutcome, StoreError> {
    let original = store.load(path)?;
    debug!(path = %path.display(), bytes = original.len(), "document loaded");

    let (patched, report) = PatchEngine::new(ruleset).run(original.clone());

    let should_write = report.changed()
        && match mode {
            WriteMode::Always => true,
            WriteMode::OnSuccess => report.is_success(),
            WriteMode::Never => false,
        };

    if should_write {
        store.save(path, &patched)?;
        info!(path = %path.display(), bytes = patched.len(), "document saved");
    }

    Ok(PatchOutcome {
        original,
        patched,
        report,
        written: should_write,
    })
}
