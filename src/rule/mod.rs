//! Declarative find/replace rules.
//!
//! A [`Rule`] is static configuration: built once, never mutated, applied by
//! value to a [`Document`]. `apply` never fails; a rule that finds nothing
//! reports zero occurrences and leaves the decision (miss or accepted no-op)
//! to the caller via [`Rule::required`].

pub mod hint;
pub mod matcher;

pub use hint::{nearest_line, NearMiss};
pub use matcher::Matcher;

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How many of the located spans a rule rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Every non-overlapping occurrence.
    #[default]
    All,
    /// Only the first occurrence, even if more exist.
    First,
}

/// Where the replacement lands relative to the matched span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// The span is replaced by the replacement.
    #[default]
    Replace,
    /// The replacement is inserted before the span, which is kept.
    Before,
    /// The replacement is inserted after the span, which is kept.
    After,
}

/// A named, reusable block of text (e.g. an injected component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: String,
    pub body: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// What a matched span is rewritten to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Literal text. For pattern matchers `$1`/`${name}` are expanded.
    Text(String),
    /// A resolved named fragment, inserted verbatim.
    Fragment(Fragment),
}

impl Replacement {
    pub fn text(&self) -> &str {
        match self {
            Replacement::Text(text) => text,
            Replacement::Fragment(fragment) => &fragment.body,
        }
    }
}

impl From<&str> for Replacement {
    fn from(text: &str) -> Self {
        Replacement::Text(text.to_string())
    }
}

impl From<String> for Replacement {
    fn from(text: String) -> Self {
        Replacement::Text(text)
    }
}

impl From<Fragment> for Replacement {
    fn from(fragment: Fragment) -> Self {
        Replacement::Fragment(fragment)
    }
}

/// Gate evaluated against the current buffer before a rule runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// Run only if the buffer contains the text.
    Contains(String),
    /// Run only if the buffer does not contain the text.
    Lacks(String),
}

impl Precondition {
    pub fn holds(&self, doc: &Document) -> bool {
        match self {
            Precondition::Contains(text) => doc.contains(text),
            Precondition::Lacks(text) => !doc.contains(text),
        }
    }
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Contains(text) => {
                write!(f, "buffer lacks {:?}", matcher::preview(text))
            }
            Precondition::Lacks(text) => {
                write!(f, "buffer already contains {:?}", matcher::preview(text))
            }
        }
    }
}

/// A single declarative transformation.
#[derive(Debug, Clone)]
#[must_use = "Rule does nothing until apply() is called"]
pub struct Rule {
    pub id: String,
    pub matcher: Matcher,
    pub replacement: Replacement,
    pub scope: Scope,
    pub placement: Placement,
    pub precondition: Option<Precondition>,
    /// Zero matches is a failure when set, an accepted no-op otherwise.
    pub required: bool,
}

impl Rule {
    /// A required, global, replacing rule.
    pub fn new(
        id: impl Into<String>,
        matcher: Matcher,
        replacement: impl Into<Replacement>,
    ) -> Self {
        Self {
            id: id.into(),
            matcher,
            replacement: replacement.into(),
            scope: Scope::All,
            placement: Placement::Replace,
            precondition: None,
            required: true,
        }
    }

    pub fn exact(
        id: impl Into<String>,
        text: impl Into<String>,
        replacement: impl Into<Replacement>,
    ) -> Self {
        Self::new(id, Matcher::exact(text), replacement)
    }

    pub fn delimited(
        id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
        replacement: impl Into<Replacement>,
    ) -> Self {
        Self::new(id, Matcher::delimited(start, end), replacement)
    }

    pub fn pattern(
        id: impl Into<String>,
        pattern: &str,
        replacement: impl Into<Replacement>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::new(id, Matcher::pattern(pattern)?, replacement))
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn first_only(mut self) -> Self {
        self.scope = Scope::First;
        self
    }

    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn when(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }

    /// True if this rule's own output could be matched again by its
    /// matcher, i.e. a second pass might apply it twice.
    ///
    /// Conservative: output that cannot be known before a match (capture
    /// expansion) or that reintroduces a delimited start anchor counts as
    /// rematching. An `unless` gate clears all of these.
    pub fn rematches_own_output(&self) -> bool {
        if matches!(self.precondition, Some(Precondition::Lacks(_))) {
            return false;
        }
        if self.placement != Placement::Replace {
            return true;
        }
        match (&self.matcher, &self.replacement) {
            (Matcher::Pattern { .. }, Replacement::Text(template))
                if matcher::has_capture_refs(template) =>
            {
                true
            }
            // A later end anchor anywhere in the buffer closes a new span.
            (Matcher::Delimited { start, .. }, replacement) => {
                replacement.text().contains(start.as_str())
            }
            (matcher, replacement) => matcher.is_match(replacement.text()),
        }
    }

    /// Apply this rule to `doc`, producing the next buffer and a result.
    pub fn apply(&self, doc: Document) -> (Document, ApplicationResult) {
        if let Some(precondition) = &self.precondition {
            if !precondition.holds(&doc) {
                let result = ApplicationResult {
                    status: RuleStatus::Skipped {
                        reason: precondition.to_string(),
                        satisfied: matches!(precondition, Precondition::Lacks(_)),
                    },
                    ..ApplicationResult::empty(self)
                };
                return (doc, result);
            }
        }

        let template = match &self.replacement {
            Replacement::Text(text) => Some(text.as_str()),
            Replacement::Fragment(_) => None,
        };
        let hits = self.matcher.find(doc.as_str(), template);
        let found = hits.len();

        if hits.is_empty() {
            let replacement = self.replacement.text();
            let result = ApplicationResult {
                status: RuleStatus::NoMatch,
                already_applied: !replacement.is_empty() && doc.contains(replacement),
                near_miss: self
                    .matcher
                    .literal_target()
                    .and_then(|target| nearest_line(doc.as_str(), target)),
                ..ApplicationResult::empty(self)
            };
            return (doc, result);
        }

        let take = match self.scope {
            Scope::All => found,
            Scope::First => 1,
        };

        let source = doc.as_str();
        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for hit in hits.iter().take(take) {
            let span = &source[hit.start..hit.end];
            let replacement = hit.expanded.as_deref().unwrap_or(self.replacement.text());
            out.push_str(&source[cursor..hit.start]);
            match self.placement {
                Placement::Replace => out.push_str(replacement),
                Placement::Before => {
                    out.push_str(replacement);
                    out.push_str(span);
                }
                Placement::After => {
                    out.push_str(span);
                    out.push_str(replacement);
                }
            }
            cursor = hit.end;
        }
        out.push_str(&source[cursor..]);

        let result = ApplicationResult {
            status: RuleStatus::Applied,
            matched: true,
            occurrences: take,
            found,
            ..ApplicationResult::empty(self)
        };
        (Document::from(out), result)
    }
}

/// Outcome class of one rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleStatus {
    Applied,
    NoMatch,
    /// The precondition did not hold. `satisfied` is set for `unless`
    /// gates, whose guarded text shows the work is already in the buffer;
    /// an unmet `when` gate means the buffer is not the expected one.
    Skipped { reason: String, satisfied: bool },
}

/// What happened when one rule ran. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationResult {
    pub rule_id: String,
    pub required: bool,
    pub status: RuleStatus,
    pub matched: bool,
    /// Spans rewritten.
    pub occurrences: usize,
    /// Spans the matcher located; exceeds `occurrences` for single-shot rules.
    pub found: usize,
    /// On a miss: the replacement text is already in the buffer.
    pub already_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_miss: Option<NearMiss>,
}

impl ApplicationResult {
    fn empty(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            required: rule.required,
            status: RuleStatus::NoMatch,
            matched: false,
            occurrences: 0,
            found: 0,
            already_applied: false,
            near_miss: None,
        }
    }

    /// A required rule that matched nothing, or was gated off by an unmet
    /// `when` precondition.
    pub fn is_required_miss(&self) -> bool {
        self.required
            && match &self.status {
                RuleStatus::Applied => false,
                RuleStatus::NoMatch => true,
                RuleStatus::Skipped { satisfied, .. } => !satisfied,
            }
    }
}
