//! The built-in landing-page migration against a pre-migration fixture.

use textpatch::config::builtin;
use textpatch::{Document, PatchEngine, PatchFailure, RuleSet, RuleStatus};

const BEFORE: &str = include_str!("../fixtures/LandingPage.before.tsx");

fn landing() -> RuleSet {
    builtin("landing-monochrome")
        .expect("landing-monochrome is built in")
        .load()
        .unwrap()
}

#[test]
fn test_landing_migration_succeeds() {
    let ruleset = landing();
    let (after, report) = PatchEngine::new(&ruleset).run(Document::new(BEFORE));

    assert!(report.is_success(), "failures: {:?}", report.failures());
    assert!(report.changed());
    assert_eq!(report.results.len(), ruleset.rules().len());

    // Every rule in the set has a target in the fixture.
    for result in &report.results {
        assert_eq!(result.status, RuleStatus::Applied, "{}", result.rule_id);
    }

    assert_eq!(after.count("bg-violet-500"), 0);
    assert_eq!(after.count("#6D28D9"), 0);
    assert_eq!(after.count("</section >"), 0);
    assert_eq!(after.count("< section"), 0);
    assert_eq!(after.count(r#"id="hero""#), 1);
    assert_eq!(after.count("const ScrollDownIcon"), 1);
    assert!(!after.contains("Animated Scroll Indicator"));

    for target in ["pipeline", "showcase", "features", "cta"] {
        assert_eq!(after.count(&format!(r#"<section id="{target}""#)), 1, "{target}");
    }
    for target in ["pipeline", "showcase", "features"] {
        assert_eq!(
            after.count(&format!(r#"<ScrollDownIcon targetId="{target}" />"#)),
            1,
            "{target}"
        );
    }

    assert_eq!(report.result("violet-500-fill").unwrap().occurrences, 2);
    assert_eq!(report.result("normalize-section-close").unwrap().occurrences, 1);
}

#[test]
fn test_component_injected_before_export() {
    let ruleset = landing();
    let (after, _) = PatchEngine::new(&ruleset).run(Document::new(BEFORE));

    let component = after.as_str().find("const ScrollDownIcon").unwrap();
    let export = after
        .as_str()
        .find("export default function LandingPage() {")
        .unwrap();
    assert!(component < export);
}

#[test]
fn test_landing_migration_is_idempotent() {
    let ruleset = landing();
    let engine = PatchEngine::new(&ruleset);
    let (once, _) = engine.run(Document::new(BEFORE));
    let (twice, rerun) = engine.run(once.clone());

    assert_eq!(once, twice);
    assert!(!rerun.changed());
    assert_eq!(rerun.total_occurrences(), 0);
    assert!(rerun.already_migrated());
    assert!(rerun.violations.is_empty());
    assert!(matches!(
        rerun.result("inject-scroll-down-icon").unwrap().status,
        RuleStatus::Skipped { .. }
    ));
    assert!(rerun.result("hero-anchor").unwrap().already_applied);
    assert!(rerun.result("hero-scroll-indicator").unwrap().already_applied);
}

#[test]
fn test_spacing_drift_surfaces_near_miss() {
    let drifted = BEFORE.replace(
        r#"< section className="py-32 px-6 bg-transparent relative" >"#,
        r#"<section className="py-32 px-6 bg-transparent relative">"#,
    );

    let ruleset = landing();
    let (_, report) = PatchEngine::new(&ruleset).run(Document::new(drifted));

    // Optional rule: the run still succeeds, but the drift is visible.
    assert!(report.is_success());
    let anchor = report.result("pipeline-anchor").unwrap();
    assert_eq!(anchor.status, RuleStatus::NoMatch);
    let near = anchor.near_miss.as_ref().expect("near miss");
    assert_eq!(
        near.text,
        r#"<section className="py-32 px-6 bg-transparent relative">"#
    );
}

#[test]
fn test_missing_scroll_indicator_fails_without_stopping() {
    let drifted = BEFORE.replace("{/* Animated Scroll Indicator */}", "{/* Scroll Indicator */}");

    let ruleset = landing();
    let (after, report) = PatchEngine::new(&ruleset).run(Document::new(drifted));

    assert!(!report.is_success());
    assert_eq!(report.results.len(), ruleset.rules().len());
    assert_eq!(
        report.failures(),
        vec![
            PatchFailure::RequiredRuleMissed {
                rule_id: "hero-scroll-indicator".into()
            },
            PatchFailure::VerificationViolation(report.violations[0].clone()),
        ]
    );
    assert_eq!(
        report.violations[0].expectation.needle,
        r#"<ScrollDownIcon targetId="pipeline" />"#
    );

    // Later rules still ran.
    assert_eq!(after.count("bg-violet-500"), 0);
    assert_eq!(
        report.result("normalize-section-close").unwrap().status,
        RuleStatus::Applied
    );
}
