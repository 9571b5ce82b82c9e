use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};
use textpatch::config::{self, Origin, BUILTINS};
use textpatch::{patch_document, FsStore, PatchOutcome, Report, RuleSet, RuleStatus, WriteMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "textpatch")]
#[command(about = "Deterministic rule-driven text migrations", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit debug logs to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a rule set to a document
    Apply {
        /// Document to migrate
        target: PathBuf,

        /// Built-in rule set name, name of a file in rulesets/, or a path
        #[arg(short, long)]
        ruleset: String,

        /// Dry run - report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Only write the document if every required rule matched and
        /// every expectation held
        #[arg(long)]
        strict: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report whether a document still needs migrating, without writing
    Check {
        /// Document to inspect
        target: PathBuf,

        /// Built-in rule set name, name of a file in rulesets/, or a path
        #[arg(short, long)]
        ruleset: String,

        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List built-in and discovered rule sets
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Apply {
            target,
            ruleset,
            dry_run,
            strict,
            diff,
            json,
        } => {
            let mode = if dry_run {
                WriteMode::Never
            } else if strict {
                WriteMode::OnSuccess
            } else {
                WriteMode::Always
            };
            cmd_apply(&target, &ruleset, mode, diff, json)
        }

        Commands::Check {
            target,
            ruleset,
            json,
        } => cmd_check(&target, &ruleset, json),

        Commands::List => cmd_list(),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "textpatch=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Directories searched for `<name>.toml` rule sets.
///
/// Discovery order:
/// 1. `rulesets/` next to the target document.
/// 2. `./rulesets` relative to the current working directory.
fn search_dirs(target: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    // A bare file name has an empty parent; the cwd entry covers it.
    if let Some(parent) = target.and_then(Path::parent) {
        if !parent.as_os_str().is_empty() {
            dirs.push(parent.join("rulesets"));
        }
    }
    if let Ok(cwd) = env::current_dir() {
        let dir = cwd.join("rulesets");
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

fn load_ruleset(arg: &str, target: &Path) -> Result<(RuleSet, Origin)> {
    config::resolve(arg, &search_dirs(Some(target)))
        .with_context(|| format!("failed to load rule set '{arg}'"))
}

fn describe_origin(origin: &Origin) -> String {
    match origin {
        Origin::File(path) => path.display().to_string(),
        Origin::Builtin(_) => "built-in".to_string(),
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    target: &'a Path,
    success: bool,
    changed: bool,
    already_migrated: bool,
    written: bool,
    report: &'a Report,
}

fn print_json(target: &Path, outcome: &PatchOutcome) -> Result<()> {
    let output = JsonOutput {
        target,
        success: outcome.report.is_success(),
        changed: outcome.report.changed(),
        already_migrated: outcome.report.already_migrated(),
        written: outcome.written,
        report: &outcome.report,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old = first.old_range().start..last.old_range().end;
        let new = first.new_range().start..last.new_range().end;
        println!(
            "{}",
            format!(
                "@@ -{},{} +{},{} @@",
                old.start + 1,
                old.len(),
                new.start + 1,
                new.len()
            )
            .cyan()
        );

        for op in &group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => format!("-{}", change).red(),
                    ChangeTag::Insert => format!("+{}", change).green(),
                    ChangeTag::Equal => format!(" {}", change).normal(),
                };
                print!("{}", sign);
            }
        }
    }
}

#[derive(Default)]
struct Tally {
    applied: usize,
    no_match: usize,
    skipped: usize,
    failed: usize,
}

/// Print one line per rule in declaration order, then every violation.
fn print_report(report: &Report, dry_run: bool) -> Tally {
    let mut tally = Tally::default();

    for result in &report.results {
        match &result.status {
            RuleStatus::Applied => {
                let verb = if dry_run { "Would replace" } else { "Replaced" };
                let mut line = format!(
                    "{} {}: {} {} occurrence(s)",
                    "✓".green(),
                    result.rule_id,
                    verb,
                    result.occurrences
                );
                if result.found > result.occurrences {
                    line.push_str(&format!(" (first of {})", result.found));
                }
                println!("{line}");
                tally.applied += 1;
            }
            RuleStatus::Skipped { reason, .. } if result.is_required_miss() => {
                eprintln!(
                    "{} {}: Required rule skipped ({})",
                    "✗".red(),
                    result.rule_id,
                    reason
                );
                tally.failed += 1;
            }
            RuleStatus::Skipped { reason, .. } => {
                println!("{} {}: Skipped ({})", "⊘".cyan(), result.rule_id, reason);
                tally.skipped += 1;
            }
            RuleStatus::NoMatch if result.required => {
                eprintln!(
                    "{} {}: Required rule matched 0 occurrences",
                    "✗".red(),
                    result.rule_id
                );
                if result.already_applied {
                    eprintln!("  {}", "Replacement text is already present".dimmed());
                }
                print_near_miss(result.near_miss.as_ref(), true);
                tally.failed += 1;
            }
            RuleStatus::NoMatch => {
                let note = if result.already_applied {
                    "already applied"
                } else {
                    "optional"
                };
                println!("{} {}: No match ({})", "⊙".yellow(), result.rule_id, note);
                print_near_miss(result.near_miss.as_ref(), false);
                tally.no_match += 1;
            }
        }
    }

    if !report.violations.is_empty() {
        eprintln!();
        eprintln!(
            "{} {} ({})",
            "✗".red(),
            "VERIFICATION FAILED".red().bold(),
            report.violations.len()
        );
        for violation in &report.violations {
            eprintln!("  - {}", violation);
        }
        tally.failed += report.violations.len();
    }

    tally
}

fn print_near_miss(near_miss: Option<&textpatch::NearMiss>, to_stderr: bool) {
    let Some(near) = near_miss else {
        return;
    };
    let line = format!(
        "  Closest line {} ({:.0}% similar): {}",
        near.line,
        near.similarity * 100.0,
        near.text
    );
    if to_stderr {
        eprintln!("{}", line.dimmed());
    } else {
        println!("{}", line.dimmed());
    }
}

fn print_summary(tally: &Tally) {
    println!();
    println!("{}", "Summary:".bold());
    println!("  {} applied", format!("{}", tally.applied).green());
    println!("  {} no match", format!("{}", tally.no_match).yellow());
    println!("  {} skipped", format!("{}", tally.skipped).cyan());
    println!("  {} failed", format!("{}", tally.failed).red());
}

fn cmd_apply(
    target: &Path,
    ruleset_arg: &str,
    mode: WriteMode,
    show_diff: bool,
    json: bool,
) -> Result<()> {
    // 1. Resolve rule set
    let (ruleset, origin) = load_ruleset(ruleset_arg, target)?;

    // 2. Load, fold, verify, save
    let outcome = patch_document(&FsStore, target, &ruleset, mode)
        .with_context(|| format!("failed to patch {}", target.display()))?;

    if json {
        print_json(target, &outcome)?;
    } else {
        // 3. Report results
        println!("Target: {}", target.display());
        println!("Rule set: {} ({})", ruleset.name(), describe_origin(&origin));
        if mode == WriteMode::Never {
            println!("{}", "[DRY RUN - nothing will be written]".cyan());
        }
        println!();

        let tally = print_report(&outcome.report, mode == WriteMode::Never);

        if show_diff && outcome.report.changed() {
            display_diff(target, outcome.original.as_str(), outcome.patched.as_str());
        }

        println!();
        if outcome.written {
            println!("{} Wrote {}", "✓".green(), target.display());
        } else if outcome.report.changed() && mode == WriteMode::OnSuccess {
            eprintln!(
                "{} {} left unchanged (--strict and the run failed)",
                "⊘".cyan(),
                target.display()
            );
        } else if !outcome.report.changed() {
            println!("{} No changes", "⊙".yellow());
        }

        print_summary(&tally);
    }

    if !outcome.report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_check(target: &Path, ruleset_arg: &str, json: bool) -> Result<()> {
    let (ruleset, origin) = load_ruleset(ruleset_arg, target)?;

    // Read-only; never touches the target.
    let outcome = patch_document(&FsStore, target, &ruleset, WriteMode::Never)
        .with_context(|| format!("failed to check {}", target.display()))?;
    let report = &outcome.report;

    if json {
        print_json(target, &outcome)?;
    } else {
        println!("{}", "Migration Status Report".bold());
        println!("Target: {}", target.display());
        println!("Rule set: {} ({})", ruleset.name(), describe_origin(&origin));
        println!();

        if report.already_migrated() {
            println!(
                "{} {}",
                "✓".green(),
                "ALREADY MIGRATED".green().bold()
            );
        } else {
            let tally = print_report(report, true);
            println!();
            if report.is_success() {
                println!(
                    "{} {} ({} occurrence(s))",
                    "⊙".yellow(),
                    "WOULD CHANGE".yellow().bold(),
                    report.total_occurrences()
                );
            }
            print_summary(&tally);
        }
    }

    if !report.is_success() && !report.already_migrated() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_list() -> Result<()> {
    println!("{}", "Built-in rule sets:".bold());
    for builtin in BUILTINS {
        match builtin.load() {
            Ok(set) => print_ruleset_line(builtin.name, &set),
            Err(e) => eprintln!("  {} {}: {}", "✗".red(), builtin.name, e),
        }
    }

    let dirs = search_dirs(None);
    let files = config::discover(&dirs)?;
    if files.is_empty() {
        return Ok(());
    }

    println!();
    println!("{}", "Discovered rule sets:".bold());
    for file in files {
        match config::load_from_path(&file) {
            Ok(set) => print_ruleset_line(&file.display().to_string(), &set),
            Err(e) => eprintln!("  {} {}: {}", "✗".red(), file.display(), e),
        }
    }

    Ok(())
}

fn print_ruleset_line(label: &str, set: &RuleSet) {
    let required = set.rules().iter().filter(|r| r.required).count();
    println!(
        "  {} {} ({} rules, {} required, {} expectations)",
        label.green(),
        set.description().unwrap_or("").dimmed(),
        set.rules().len(),
        required,
        set.expectations().len()
    );
}
