use crate::rule::Rule;
use crate::verify::Expectation;
use std::collections::HashSet;
use std::fmt;

/// An ordered, validated sequence of rules plus the post-conditions that
/// must hold once all of them have run.
///
/// Declaration order is application order: later rules see the output of
/// earlier ones.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    description: Option<String>,
    rules: Vec<Rule>,
    expectations: Vec<Expectation>,
}

impl RuleSet {
    /// Build a rule set, collecting every validation issue before failing.
    pub fn new(
        name: impl Into<String>,
        rules: Vec<Rule>,
        expectations: Vec<Expectation>,
    ) -> Result<Self, ValidationError> {
        let set = Self {
            name: name.into(),
            description: None,
            rules,
            expectations,
        };
        set.validate()?;
        Ok(set)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn expectations(&self) -> &[Expectation] {
        &self.expectations
    }

    fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(rule.id.as_str()) {
                issues.push(ValidationIssue::DuplicateId(rule.id.clone()));
            }

            if rule.matcher.is_blank() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: Some(rule.id.clone()),
                    field: "match",
                });
            } else if rule.rematches_own_output() {
                issues.push(ValidationIssue::SelfMatching(rule.id.clone()));
            }
        }

        for expectation in &self.expectations {
            if expectation.needle.is_empty() {
                issues.push(ValidationIssue::EmptyExpectation);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId(String),
    InvalidPattern {
        rule_id: String,
        message: String,
    },
    UnknownFragment {
        rule_id: String,
        fragment: String,
    },
    InvalidCombo {
        rule_id: Option<String>,
        message: String,
    },
    /// The rule's replacement would be matched again on a second pass.
    SelfMatching(String),
    EmptyExpectation,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rule set contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId(id) => write!(f, "duplicate rule id '{id}'"),
            ValidationIssue::InvalidPattern { rule_id, message } => {
                write!(f, "rule '{rule_id}' has an invalid pattern: {message}")
            }
            ValidationIssue::UnknownFragment { rule_id, fragment } => {
                write!(f, "rule '{rule_id}' references unknown fragment '{fragment}'")
            }
            ValidationIssue::InvalidCombo { rule_id, message } => match rule_id {
                Some(id) => write!(f, "rule '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid rule configuration: {message}"),
            },
            ValidationIssue::SelfMatching(id) => write!(
                f,
                "rule '{id}' matches its own output; guard it with `unless` or narrow the match"
            ),
            ValidationIssue::EmptyExpectation => write!(f, "expectation with empty needle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Placement, Precondition};

    #[test]
    fn test_valid_set() {
        let set = RuleSet::new(
            "colors",
            vec![Rule::exact("a", "violet", "white")],
            vec![Expectation::absent("violet")],
        )
        .unwrap();
        assert_eq!(set.name(), "colors");
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn test_collects_all_issues() {
        let err = RuleSet::new(
            "broken",
            vec![
                Rule::exact("dup", "a", "b"),
                Rule::exact("dup", "c", "d"),
                Rule::exact("", "e", "f"),
                Rule::exact("blank", "", "x"),
                Rule::exact("grow", "x", "xx"),
            ],
            vec![Expectation::present("")],
        )
        .unwrap_err();

        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::DuplicateId("dup".into()),
                ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id"
                },
                ValidationIssue::MissingField {
                    rule_id: Some("blank".into()),
                    field: "match"
                },
                ValidationIssue::SelfMatching("grow".into()),
                ValidationIssue::EmptyExpectation,
            ]
        );
        assert_eq!(err.to_string().lines().count(), 5);
    }

    #[test]
    fn test_empty_rule_list_rejected() {
        let err = RuleSet::new("empty", vec![], vec![]).unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::EmptyRuleList]);
    }

    #[test]
    fn test_guarded_insertion_allowed() {
        let rule = Rule::exact("icon", "export default", "const Icon = 1;\n")
            .placed(Placement::Before)
            .when(Precondition::Lacks("const Icon".into()));
        assert!(RuleSet::new("icons", vec![rule], vec![]).is_ok());
    }

    #[test]
    fn test_unguarded_insertion_rejected() {
        let rule = Rule::exact("icon", "export default", "const Icon = 1;\n")
            .placed(Placement::Before);
        let err = RuleSet::new("icons", vec![rule], vec![]).unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::SelfMatching("icon".into())]);
    }
}
