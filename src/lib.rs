//! Textpatch: deterministic, declarative text migrations
//!
//! A migration is a [`RuleSet`]: an ordered list of find/replace [`Rule`]s
//! plus post-conditions. The [`PatchEngine`] folds the rules over a single
//! in-memory [`Document`], each rule seeing the output of the previous one,
//! and then checks every [`Expectation`] against the final text.
//!
//! # Guarantees
//!
//! - Rules run in declaration order and every rule is reported
//! - A required rule that matches nothing fails the run, it never stops it
//! - Every failed expectation is reported, not only the first
//! - Successful rule sets are idempotent: a second run changes nothing
//! - Only document I/O errors abort
//!
//! # Example
//!
//! ```
//! use textpatch::{Document, Expectation, PatchEngine, Rule, RuleSet};
//!
//! let ruleset = RuleSet::new(
//!     "demo",
//!     vec![
//!         Rule::exact("recolor", "bg-violet-500", "bg-[#F5F5F5]"),
//!         Rule::exact("hero-id", "<section>", r#"<section id="hero">"#).first_only(),
//!     ],
//!     vec![Expectation::absent("bg-violet-500")],
//! )
//! .unwrap();
//!
//! let input = Document::new(r#"<section><div class="bg-violet-500"/></section>"#);
//! let (output, report) = PatchEngine::new(&ruleset).run(input);
//!
//! assert!(report.is_success());
//! assert!(output.contains(r#"id="hero""#));
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod pipeline;
pub mod report;
pub mod rule;
pub mod ruleset;
pub mod store;
pub mod verify;

// Re-exports
pub use config::{load_from_path, load_from_str, resolve, ConfigError, Origin};
pub use document::{Digest, Document};
pub use engine::PatchEngine;
pub use pipeline::{patch_document, PatchOutcome, WriteMode};
pub use report::{PatchFailure, Report};
pub use rule::{
    ApplicationResult, Matcher, NearMiss, Placement, Precondition, Replacement, Rule, RuleStatus,
    Scope,
};
pub use ruleset::{RuleSet, ValidationError, ValidationIssue};
pub use store::{DocumentStore, FsStore, MemoryStore, StoreError};
pub use verify::{check, Expectation, ExpectationKind, Violation};
