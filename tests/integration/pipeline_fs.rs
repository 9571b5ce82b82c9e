//! Load/run/save through the filesystem store.

use std::fs;
use tempfile::TempDir;
use textpatch::config::{resolve, Origin};
use textpatch::{patch_document, FsStore, StoreError, WriteMode};

const BEFORE: &str = include_str!("../fixtures/LandingPage.before.tsx");

const COLORS: &str = r#"
[meta]
name = "colors"

[[rules]]
id = "violet"
match = { type = "exact", text = "violet" }
replace = { text = "white" }

[[rules]]
id = "marker"
match = { type = "exact", text = "MARKER" }
replace = { text = "done" }

[[expect]]
absent = "violet"
"#;

fn setup_workspace(contents: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("page.tsx"), contents).unwrap();
    fs::create_dir(dir.path().join("rulesets")).unwrap();
    fs::write(dir.path().join("rulesets/colors.toml"), COLORS).unwrap();
    dir
}

#[test]
fn test_landing_fixture_written_once() {
    let dir = setup_workspace(BEFORE);
    let target = dir.path().join("page.tsx");
    let (ruleset, origin) = resolve("landing-monochrome", &[]).unwrap();
    assert_eq!(origin, Origin::Builtin("landing-monochrome"));

    let outcome = patch_document(&FsStore, &target, &ruleset, WriteMode::Always).unwrap();
    assert!(outcome.report.is_success());
    assert!(outcome.written);
    assert_eq!(fs::read_to_string(&target).unwrap(), outcome.patched.as_str());

    // Second pass finds nothing to do and leaves the file alone.
    let rerun = patch_document(&FsStore, &target, &ruleset, WriteMode::Always).unwrap();
    assert!(!rerun.written);
    assert!(rerun.report.already_migrated());
    assert_eq!(fs::read_to_string(&target).unwrap(), outcome.patched.as_str());
}

#[test]
fn test_soft_failure_still_written_by_default() {
    let dir = setup_workspace("bg-violet text\n");
    let target = dir.path().join("page.tsx");
    let (ruleset, origin) = resolve("colors", &[dir.path().join("rulesets")]).unwrap();
    assert!(matches!(origin, Origin::File(_)));

    let outcome = patch_document(&FsStore, &target, &ruleset, WriteMode::Always).unwrap();
    assert!(!outcome.report.is_success());
    assert!(outcome.written);
    assert_eq!(fs::read_to_string(&target).unwrap(), "bg-white text\n");
}

#[test]
fn test_strict_mode_leaves_file_untouched() {
    let dir = setup_workspace("bg-violet text\n");
    let target = dir.path().join("page.tsx");
    let (ruleset, _) = resolve("colors", &[dir.path().join("rulesets")]).unwrap();

    let outcome = patch_document(&FsStore, &target, &ruleset, WriteMode::OnSuccess).unwrap();
    assert!(outcome.report.changed());
    assert!(!outcome.written);
    assert_eq!(fs::read_to_string(&target).unwrap(), "bg-violet text\n");
}

#[test]
fn test_dry_run_never_writes() {
    let dir = setup_workspace("violet MARKER\n");
    let target = dir.path().join("page.tsx");
    let (ruleset, _) = resolve("colors", &[dir.path().join("rulesets")]).unwrap();

    let outcome = patch_document(&FsStore, &target, &ruleset, WriteMode::Never).unwrap();
    assert!(outcome.report.is_success());
    assert_eq!(outcome.patched.as_str(), "white done\n");
    assert!(!outcome.written);
    assert_eq!(fs::read_to_string(&target).unwrap(), "violet MARKER\n");
}

#[test]
fn test_missing_target_is_fatal() {
    let dir = setup_workspace("");
    let (ruleset, _) = resolve("colors", &[dir.path().join("rulesets")]).unwrap();

    let err = patch_document(
        &FsStore,
        &dir.path().join("missing.tsx"),
        &ruleset,
        WriteMode::Always,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn test_non_utf8_target_is_fatal() {
    let dir = setup_workspace("");
    let target = dir.path().join("page.tsx");
    fs::write(&target, [0xff, 0xfe, 0x00]).unwrap();
    let (ruleset, _) = resolve("colors", &[dir.path().join("rulesets")]).unwrap();

    let err = patch_document(&FsStore, &target, &ruleset, WriteMode::Always).unwrap_err();
    assert!(matches!(err, StoreError::Utf8 { .. }));
}
