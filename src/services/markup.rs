//! Plain-text and HTML helpers shared by the replacement engine, the splitter
//! and the CLI.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// A line break, optional whitespace (including more line breaks), a line break.
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph break pattern"));

static PARAGRAPH_JOIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</p>\s*<p>").expect("valid paragraph join pattern"));

static LINE_BREAK_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));

static STRIPPED_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:p|span)(?:\s[^>]*)?>").expect("valid markup tag pattern")
});

/// Counts runs of non-whitespace characters, the way word processors do.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Converts CRLF and lone CR line endings to LF.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Splits text on blank-line boundaries, dropping blank paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .collect()
}

pub fn escape_html(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

pub fn unescape_html(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Wraps each paragraph of already-escaped text in `<p>` and turns the
/// remaining single newlines into `<br>`.
pub fn paragraphs_to_html(escaped: &str) -> String {
    split_paragraphs(escaped)
        .into_iter()
        .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
        .collect()
}

/// Reverses [`paragraphs_to_html`] and highlight markup, giving back the
/// text a user would copy out of the rendered output.
pub fn to_plain_text(markup: &str) -> String {
    let text = PARAGRAPH_JOIN.replace_all(markup, "\n\n");
    let text = LINE_BREAK_TAG.replace_all(&text, "\n");
    let text = STRIPPED_TAG.replace_all(&text, "");
    unescape_html(&text).into_owned()
}
