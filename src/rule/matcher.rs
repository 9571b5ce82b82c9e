//! Span acquisition for rules.
//!
//! A matcher only finds spans; it never edits. All three kinds report
//! non-overlapping spans in ascending byte order, evaluated against the
//! buffer exactly as given (no escaping, no whitespace folding).

use regex::Regex;
use std::fmt;

/// What a rule looks for in the current buffer.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Verbatim substring, including any embedded braces or quotes.
    Exact { text: String },
    /// From a literal `start` anchor through the first literal `end` anchor
    /// that follows it. Both anchors are part of the span.
    Delimited { start: String, end: String },
    /// Regular expression, used for normalization passes.
    Pattern { regex: Regex },
}

/// One located span plus, for pattern matchers, the capture-expanded
/// replacement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hit {
    pub start: usize,
    pub end: usize,
    pub expanded: Option<String>,
}

impl Matcher {
    pub fn exact(text: impl Into<String>) -> Self {
        Matcher::Exact { text: text.into() }
    }

    pub fn delimited(start: impl Into<String>, end: impl Into<String>) -> Self {
        Matcher::Delimited {
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern {
            regex: Regex::new(pattern)?,
        })
    }

    /// Short kind name used in reports and config.
    pub fn kind(&self) -> &'static str {
        match self {
            Matcher::Exact { .. } => "exact",
            Matcher::Delimited { .. } => "delimited",
            Matcher::Pattern { .. } => "pattern",
        }
    }

    /// The literal text a near-miss search should look for, if any.
    pub fn literal_target(&self) -> Option<&str> {
        match self {
            Matcher::Exact { text } => Some(text),
            Matcher::Delimited { start, .. } => Some(start),
            Matcher::Pattern { .. } => None,
        }
    }

    /// True if the matcher has nothing to search for.
    pub fn is_blank(&self) -> bool {
        match self {
            Matcher::Exact { text } => text.is_empty(),
            Matcher::Delimited { start, end } => start.is_empty() || end.is_empty(),
            Matcher::Pattern { regex } => regex.as_str().is_empty(),
        }
    }

    /// True if at least one span matches `text`.
    pub fn is_match(&self, text: &str) -> bool {
        !self.find(text, None).is_empty()
    }

    /// Locate every span in `text`.
    ///
    /// `template` is only consulted by pattern matchers: when present, each
    /// hit carries the template with `$1`/`${name}` references expanded.
    pub(crate) fn find(&self, text: &str, template: Option<&str>) -> Vec<Hit> {
        match self {
            Matcher::Exact { text: needle } => {
                if needle.is_empty() {
                    return Vec::new();
                }
                text.match_indices(needle.as_str())
                    .map(|(start, m)| Hit {
                        start,
                        end: start + m.len(),
                        expanded: None,
                    })
                    .collect()
            }
            Matcher::Delimited { start, end } => find_delimited(text, start, end),
            Matcher::Pattern { regex } => regex
                .captures_iter(text)
                .filter_map(|caps| {
                    let m = caps.get(0)?;
                    // Zero-width hits would insert at arbitrary positions.
                    if m.start() == m.end() {
                        return None;
                    }
                    let expanded = template.map(|t| {
                        let mut out = String::new();
                        caps.expand(t, &mut out);
                        out
                    });
                    Some(Hit {
                        start: m.start(),
                        end: m.end(),
                        expanded,
                    })
                })
                .collect(),
        }
    }
}

fn find_delimited(text: &str, start: &str, end: &str) -> Vec<Hit> {
    let mut hits = Vec::new();
    if start.is_empty() || end.is_empty() {
        return hits;
    }

    let mut cursor = 0;
    while let Some(offset) = text[cursor..].find(start) {
        let span_start = cursor + offset;
        let after_start = span_start + start.len();
        let Some(end_offset) = text[after_start..].find(end) else {
            break;
        };
        let span_end = after_start + end_offset + end.len();
        hits.push(Hit {
            start: span_start,
            end: span_end,
            expanded: None,
        });
        cursor = span_end;
    }

    hits
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact { text } => write!(f, "exact {:?}", preview(text)),
            Matcher::Delimited { start, end } => {
                write!(f, "delimited {:?} .. {:?}", preview(start), preview(end))
            }
            Matcher::Pattern { regex } => write!(f, "pattern /{}/", regex.as_str()),
        }
    }
}

/// First line of `text`, capped at 60 chars. `…` marks a cut line.
pub(crate) fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or("");
    let mut out: String = first.chars().take(60).collect();
    if out.len() < first.len() {
        out.push('…');
    }
    out
}

/// True if `template` contains a `$1`, `$name` or `${name}` reference that
/// a pattern match would expand. `$$` is a literal dollar.
pub(crate) fn has_capture_refs(template: &str) -> bool {
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
            }
            Some(&next) if next == '{' || next == '_' || next.is_ascii_alphanumeric() => {
                return true;
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(hits: &[Hit]) -> Vec<(usize, usize)> {
        hits.iter().map(|h| (h.start, h.end)).collect()
    }

    #[test]
    fn test_exact_is_verbatim() {
        let m = Matcher::exact("<section className=\"a\">");
        assert!(m.is_match("x <section className=\"a\"> y"));
        assert!(!m.is_match("x < section className=\"a\" > y"));
    }

    #[test]
    fn test_exact_non_overlapping() {
        let m = Matcher::exact("aa");
        assert_eq!(spans(&m.find("aaaaa", None)), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_delimited_includes_anchors() {
        let text = "a {/* start */}\n  body\n{/* end */} b";
        let m = Matcher::delimited("{/* start */}", "{/* end */}");
        let hits = m.find(text, None);
        assert_eq!(hits.len(), 1);
        assert_eq!(
            &text[hits[0].start..hits[0].end],
            "{/* start */}\n  body\n{/* end */}"
        );
    }

    #[test]
    fn test_delimited_repeats_and_stops_without_end() {
        let text = "[x] [y] [z";
        let m = Matcher::delimited("[", "]");
        assert_eq!(spans(&m.find(text, None)), vec![(0, 3), (4, 7)]);
    }

    #[test]
    fn test_delimited_whitespace_sensitive() {
        let m = Matcher::delimited("<div>\n    ", "</div>");
        assert!(m.is_match("<div>\n    hi</div>"));
        assert!(!m.is_match("<div>\n  hi</div>"));
    }

    #[test]
    fn test_pattern_expands_captures() {
        let m = Matcher::pattern(r"</(\w+)\s+>").unwrap();
        let hits = m.find("</section >\n</div  >", Some("</$1>"));
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].expanded.as_deref(), Some("</section>"));
        assert_eq!(hits[1].expanded.as_deref(), Some("</div>"));
    }

    #[test]
    fn test_pattern_skips_zero_width() {
        let m = Matcher::pattern(r"x*").unwrap();
        assert_eq!(spans(&m.find("abxxc", None)), vec![(2, 4)]);
    }

    #[test]
    fn test_preview_marks_only_cut_lines() {
        assert_eq!(preview("short\nsecond line"), "short");
        let long = "x".repeat(70);
        let cut = preview(&long);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.chars().count(), 61);
    }

    #[test]
    fn test_capture_refs_detected() {
        assert!(has_capture_refs("bg-violet-$1/50"));
        assert!(has_capture_refs("</${tag}>"));
        assert!(has_capture_refs("$name"));
        assert!(!has_capture_refs("costs $$5"));
        assert!(!has_capture_refs("</section>"));
        assert!(!has_capture_refs("trailing $"));
    }

    #[test]
    fn test_blank_matchers() {
        assert!(Matcher::exact("").is_blank());
        assert!(Matcher::delimited("a", "").is_blank());
        assert!(!Matcher::exact("a").is_blank());
        assert!(Matcher::exact("").find("abc", None).is_empty());
    }
}
