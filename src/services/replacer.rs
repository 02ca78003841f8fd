use crate::services::markup::{escape_html, normalize_newlines, paragraphs_to_html};
use crate::types::{ReplaceStrategy, ReplacementRule};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::{debug, warn};

const HIGHLIGHT_OPEN: &str = r#"<span class="highlight">"#;
const HIGHLIGHT_CLOSE: &str = "</span>";

/// A run of output text, either untouched input or the replacement of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Replaced(String),
}

impl Segment {
    pub fn text(&self) -> &str {
        match self {
            Segment::Plain(text) | Segment::Replaced(text) => text,
        }
    }

    pub fn is_replaced(&self) -> bool {
        matches!(self, Segment::Replaced(_))
    }

    fn same_kind(&self, text: &str) -> Segment {
        match self {
            Segment::Plain(_) => Segment::Plain(text.to_string()),
            Segment::Replaced(_) => Segment::Replaced(text.to_string()),
        }
    }
}

enum Matcher {
    Pattern(Regex),
    /// Used when the escaped pattern cannot be compiled.
    Literal(String),
}

struct CompiledRule<'r> {
    rule: &'r ReplacementRule,
    matcher: Matcher,
}

impl<'r> CompiledRule<'r> {
    fn compile(rule: &'r ReplacementRule) -> Self {
        let pattern = regex::escape(&rule.find);
        let matcher = match RegexBuilder::new(&pattern)
            .case_insensitive(!rule.match_case)
            .build()
        {
            Ok(regex) => Matcher::Pattern(regex),
            Err(e) => {
                warn!(
                    "Pattern for '{}' failed to compile ({}), using plain substring search",
                    rule.find, e
                );
                Matcher::Literal(rule.find.clone())
            }
        };

        Self { rule, matcher }
    }

    fn find_at(&self, haystack: &str, pos: usize) -> Option<Range<usize>> {
        match &self.matcher {
            Matcher::Pattern(regex) => regex.find_at(haystack, pos).map(|m| m.range()),
            Matcher::Literal(needle) => haystack[pos..]
                .find(needle.as_str())
                .map(|idx| pos + idx..pos + idx + needle.len()),
        }
    }

    /// Non-overlapping matches, left to right. A candidate rejected by the
    /// whole-word check only advances the search by one character.
    fn find_matches(&self, haystack: &str) -> Vec<Range<usize>> {
        let mut matches = Vec::new();
        let mut pos = 0;

        while pos <= haystack.len() {
            let Some(range) = self.find_at(haystack, pos) else {
                break;
            };
            if range.is_empty() {
                break;
            }

            if !self.rule.whole_word || is_word_bounded(haystack, &range) {
                pos = range.end;
                matches.push(range);
            } else {
                pos = range.start + next_char_len(haystack, range.start);
            }
        }

        matches
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_bounded(haystack: &str, range: &Range<usize>) -> bool {
    let before = haystack[..range.start].chars().next_back();
    let after = haystack[range.end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

fn next_char_len(haystack: &str, pos: usize) -> usize {
    haystack[pos..].chars().next().map_or(1, char::len_utf8)
}

struct Edit<'a> {
    range: Range<usize>,
    replacement: &'a str,
}

fn push_segment(out: &mut Vec<Segment>, segment: Segment) {
    if segment.text().is_empty() && !segment.is_replaced() {
        return;
    }
    if let (Some(Segment::Plain(last)), Segment::Plain(text)) = (out.last_mut(), &segment) {
        last.push_str(text);
        return;
    }
    out.push(segment);
}

/// Applies sorted, non-overlapping edits whose ranges index into the
/// concatenation of `segments`. Untouched pieces keep their kind.
fn splice(segments: Vec<Segment>, edits: &[Edit<'_>]) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len() + edits.len() * 2);
    let mut edits = edits.iter().peekable();
    let mut offset = 0;
    let mut consumed_until = 0;

    for segment in segments {
        let text = segment.text();
        let seg_end = offset + text.len();
        let mut pos = offset.max(consumed_until);

        while let Some(edit) = edits.next_if(|edit| edit.range.start < seg_end) {
            if edit.range.start > pos {
                push_segment(
                    &mut out,
                    segment.same_kind(&text[pos - offset..edit.range.start - offset]),
                );
            }
            push_segment(&mut out, Segment::Replaced(edit.replacement.to_string()));
            pos = pos.max(edit.range.end);
            consumed_until = edit.range.end;
        }

        if pos < seg_end {
            push_segment(&mut out, segment.same_kind(&text[pos - offset..]));
        }
        offset = seg_end;
    }

    out
}

/// Renders segments as paragraph markup with highlighted replacements.
pub fn render_html(segments: &[Segment]) -> String {
    let mut html = String::new();
    for segment in segments {
        match segment {
            Segment::Plain(text) => html.push_str(&escape_html(text)),
            Segment::Replaced(text) => {
                html.push_str(HIGHLIGHT_OPEN);
                html.push_str(&escape_html(text).replace('\n', "<br>"));
                html.push_str(HIGHLIGHT_CLOSE);
            }
        }
    }
    paragraphs_to_html(&html)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplacementEngine {
    strategy: ReplaceStrategy,
}

impl ReplacementEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: ReplaceStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ReplaceStrategy {
        self.strategy
    }

    /// Applies `rules` and returns highlighted paragraph markup.
    pub fn replace(&self, text: &str, rules: &[ReplacementRule]) -> String {
        if text.is_empty() {
            return String::new();
        }
        render_html(&self.apply(text, rules))
    }

    /// Applies `rules` and returns the resulting text without any markup.
    pub fn replace_plain(&self, text: &str, rules: &[ReplacementRule]) -> String {
        self.apply(text, rules)
            .iter()
            .map(Segment::text)
            .collect()
    }

    /// Applies `rules` and returns the output as plain/replaced segments.
    ///
    /// Matching runs on the raw text; escaping only happens in [`render_html`].
    pub fn apply(&self, text: &str, rules: &[ReplacementRule]) -> Vec<Segment> {
        let text = normalize_newlines(text);

        let compiled: Vec<CompiledRule<'_>> = rules
            .iter()
            .filter(|rule| !rule.is_noop())
            .map(CompiledRule::compile)
            .collect();

        debug!(
            "Applying {} of {} rules with {:?} strategy",
            compiled.len(),
            rules.len(),
            self.strategy
        );

        match self.strategy {
            ReplaceStrategy::Sequential => Self::apply_sequential(&text, &compiled),
            ReplaceStrategy::SinglePass => Self::apply_single_pass(&text, &compiled),
        }
    }

    fn apply_sequential(text: &str, rules: &[CompiledRule<'_>]) -> Vec<Segment> {
        let mut segments = vec![Segment::Plain(text.to_string())];

        for rule in rules {
            let current: String = segments.iter().map(Segment::text).collect();
            let edits: Vec<Edit<'_>> = rule
                .find_matches(&current)
                .into_iter()
                .map(|range| Edit {
                    range,
                    replacement: &rule.rule.replace,
                })
                .collect();

            debug!("Rule '{}' matched {} times", rule.rule.find, edits.len());
            if !edits.is_empty() {
                segments = splice(segments, &edits);
            }
        }

        segments
    }

    fn apply_single_pass(text: &str, rules: &[CompiledRule<'_>]) -> Vec<Segment> {
        let mut accepted: BTreeMap<usize, Edit<'_>> = BTreeMap::new();

        for rule in rules {
            let mut kept = 0;
            for range in rule.find_matches(text) {
                if overlaps_accepted(&accepted, &range) {
                    continue;
                }
                kept += 1;
                accepted.insert(
                    range.start,
                    Edit {
                        range,
                        replacement: &rule.rule.replace,
                    },
                );
            }
            debug!("Rule '{}' contributed {} matches", rule.rule.find, kept);
        }

        let edits: Vec<Edit<'_>> = accepted.into_values().collect();
        splice(vec![Segment::Plain(text.to_string())], &edits)
    }
}

fn overlaps_accepted(accepted: &BTreeMap<usize, Edit<'_>>, range: &Range<usize>) -> bool {
    if let Some((_, prev)) = accepted.range(..=range.start).next_back() {
        if prev.range.end > range.start {
            return true;
        }
    }
    if let Some((_, next)) = accepted.range(range.start + 1..).next() {
        if next.range.start < range.end {
            return true;
        }
    }
    false
}

/// Applies `rules` sequentially and returns highlighted paragraph markup.
pub fn replace(text: &str, rules: &[ReplacementRule]) -> String {
    ReplacementEngine::default().replace(text, rules)
}
