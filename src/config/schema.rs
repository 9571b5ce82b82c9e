use crate::rule::{Fragment, Matcher, Placement, Precondition, Replacement, Rule, Scope};
use crate::ruleset::{RuleSet, ValidationError, ValidationIssue};
use crate::verify::Expectation;
use serde::Deserialize;
use std::collections::BTreeMap;

/// On-disk form of a rule set.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSetConfig {
    #[serde(default)]
    pub meta: Metadata,
    /// Named text blocks rules can substitute in by name.
    #[serde(default)]
    pub fragments: BTreeMap<String, String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    #[serde(default)]
    pub expect: Vec<ExpectationDefinition>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub placement: Placement,
    /// Run only if the buffer contains this text.
    #[serde(default)]
    pub when: Option<String>,
    /// Run only if the buffer does not contain this text.
    #[serde(default)]
    pub unless: Option<String>,
    #[serde(rename = "match")]
    pub matcher: MatchDefinition,
    pub replace: ReplacementDefinition,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatchDefinition {
    /// Verbatim substring
    Exact { text: String },
    /// Literal start anchor through the next literal end anchor
    Delimited { start: String, end: String },
    /// Regular expression
    Pattern { regex: String },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementDefinition {
    Text(String),
    Fragment(String),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub enum ExpectationDefinition {
    Present(String),
    Absent(String),
}

impl RuleSetConfig {
    /// Resolve fragments, compile patterns and validate, reporting every
    /// problem at once. `default_name` is used when `meta.name` is blank.
    pub fn build(&self, default_name: &str) -> Result<RuleSet, ValidationError> {
        let mut issues = Vec::new();
        let mut rules = Vec::with_capacity(self.rules.len());

        for definition in &self.rules {
            match self.build_rule(definition) {
                Ok(rule) => rules.push(rule),
                Err(mut rule_issues) => issues.append(&mut rule_issues),
            }
        }

        let expectations = self
            .expect
            .iter()
            .map(|e| match e {
                ExpectationDefinition::Present(needle) => Expectation::present(needle),
                ExpectationDefinition::Absent(needle) => Expectation::absent(needle),
            })
            .collect();

        let name = if self.meta.name.trim().is_empty() {
            default_name
        } else {
            self.meta.name.trim()
        };

        match RuleSet::new(name, rules, expectations) {
            Ok(set) if issues.is_empty() => Ok(match &self.meta.description {
                Some(description) => set.with_description(description),
                None => set,
            }),
            Ok(_) => Err(ValidationError { issues }),
            Err(err) => {
                // Rules that failed to build are already reported.
                let skip_empty = !self.rules.is_empty();
                issues.extend(
                    err.issues
                        .into_iter()
                        .filter(|i| !(skip_empty && *i == ValidationIssue::EmptyRuleList)),
                );
                Err(ValidationError { issues })
            }
        }
    }

    fn build_rule(&self, definition: &RuleDefinition) -> Result<Rule, Vec<ValidationIssue>> {
        let mut issues = Vec::new();
        let id = definition.id.clone();

        let matcher = match &definition.matcher {
            MatchDefinition::Exact { text } => Some(Matcher::exact(text)),
            MatchDefinition::Delimited { start, end } => Some(Matcher::delimited(start, end)),
            MatchDefinition::Pattern { regex } => match Matcher::pattern(regex) {
                Ok(matcher) => Some(matcher),
                Err(err) => {
                    issues.push(ValidationIssue::InvalidPattern {
                        rule_id: id.clone(),
                        message: err.to_string(),
                    });
                    None
                }
            },
        };

        let replacement = match &definition.replace {
            ReplacementDefinition::Text(text) => Some(Replacement::Text(text.clone())),
            ReplacementDefinition::Fragment(name) => match self.fragments.get(name) {
                Some(body) => Some(Replacement::Fragment(Fragment::new(name, body))),
                None => {
                    issues.push(ValidationIssue::UnknownFragment {
                        rule_id: id.clone(),
                        fragment: name.clone(),
                    });
                    None
                }
            },
        };

        let precondition = match (&definition.when, &definition.unless) {
            (Some(_), Some(_)) => {
                issues.push(ValidationIssue::InvalidCombo {
                    rule_id: Some(id.clone()),
                    message: "`when` and `unless` cannot both be set".to_string(),
                });
                None
            }
            (Some(text), None) => Some(Precondition::Contains(text.clone())),
            (None, Some(text)) => Some(Precondition::Lacks(text.clone())),
            (None, None) => None,
        };

        let (Some(matcher), Some(replacement)) = (matcher, replacement) else {
            return Err(issues);
        };
        if !issues.is_empty() {
            return Err(issues);
        }

        let mut rule = Rule::new(id, matcher, replacement).placed(definition.placement);
        rule.scope = definition.scope;
        rule.required = definition.required;
        rule.precondition = precondition;
        Ok(rule)
    }
}
