//! Rule sets shipped inside the binary, plus lookup of rule sets on disk.

use crate::config::loader::{build_named, load_from_path, parse_str, ConfigError};
use crate::ruleset::RuleSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A rule set embedded at compile time.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub source: &'static str,
}

impl Builtin {
    pub fn load(&self) -> Result<RuleSet, ConfigError> {
        build_named(parse_str(self.source)?, self.name)
    }
}

pub const BUILTINS: &[Builtin] = &[Builtin {
    name: "landing-monochrome",
    source: include_str!("../../rulesets/landing-monochrome.toml"),
}];

pub fn builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Where a resolved rule set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    File(PathBuf),
    Builtin(&'static str),
}

/// Resolve a `--ruleset` argument.
///
/// Lookup order:
/// 1. An existing file path.
/// 2. `<name>.toml` directly inside one of `search_dirs`.
/// 3. A built-in rule set of that name.
pub fn resolve(arg: &str, search_dirs: &[PathBuf]) -> Result<(RuleSet, Origin), ConfigError> {
    let as_path = Path::new(arg);
    if as_path.is_file() {
        return Ok((load_from_path(as_path)?, Origin::File(as_path.to_path_buf())));
    }

    for path in discover(search_dirs)? {
        if path.file_stem().and_then(|s| s.to_str()) == Some(arg) {
            return Ok((load_from_path(&path)?, Origin::File(path)));
        }
    }

    if let Some(builtin) = builtin(arg) {
        return Ok((builtin.load()?, Origin::Builtin(builtin.name)));
    }

    Err(ConfigError::UnknownRuleSet {
        name: arg.to_string(),
        searched: search_dirs.to_vec(),
    })
}

/// Every `.toml` file directly inside the existing `dirs`, sorted per dir.
pub fn discover(dirs: &[PathBuf]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut found = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| ConfigError::Io {
                path: dir.clone(),
                source: e.into(),
            })?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
        found.extend(files);
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SIMPLE: &str = r#"
[meta]
name = "on-disk"

[[rules]]
id = "a"
match = { type = "exact", text = "x" }
replace = { text = "y" }
"#;

    #[test]
    fn test_every_builtin_builds() {
        for builtin in BUILTINS {
            let set = builtin.load().unwrap_or_else(|e| panic!("{}: {e}", builtin.name));
            assert!(!set.rules().is_empty());
        }
    }

    #[test]
    fn test_resolve_builtin_by_name() {
        let (set, origin) = resolve("landing-monochrome", &[]).unwrap();
        assert_eq!(set.name(), "landing-monochrome");
        assert_eq!(origin, Origin::Builtin("landing-monochrome"));
    }

    #[test]
    fn test_resolve_prefers_search_dir_over_builtin() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("landing-monochrome.toml");
        fs::write(&file, SIMPLE).unwrap();

        let (set, origin) = resolve("landing-monochrome", &[temp_dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(set.name(), "on-disk");
        assert_eq!(origin, Origin::File(file));
    }

    #[test]
    fn test_resolve_explicit_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("custom.toml");
        fs::write(&file, SIMPLE).unwrap();

        let (set, _) = resolve(file.to_str().unwrap(), &[]).unwrap();
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn test_resolve_unknown() {
        let err = resolve("no-such-set", &[PathBuf::from("/nonexistent")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRuleSet { .. }));
        assert!(err.to_string().contains("no-such-set"));
    }

    #[test]
    fn test_discover_only_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("b.toml"), SIMPLE).unwrap();
        fs::write(temp_dir.path().join("a.toml"), SIMPLE).unwrap();
        fs::write(temp_dir.path().join("notes.md"), "x").unwrap();
        fs::create_dir(temp_dir.path().join("nested")).unwrap();
        fs::write(temp_dir.path().join("nested/c.toml"), SIMPLE).unwrap();

        let files = discover(&[temp_dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.toml", "b.toml"]);
    }
}
