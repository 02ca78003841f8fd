use serde::{Deserialize, Serialize};

/// Minimum words per chapter used when the floor is enabled from the CLI
/// without an explicit value.
pub const DEFAULT_MIN_WORDS_PER_CHAPTER: usize = 50;

/// Keyword used to build titles when the first line is not a chapter heading.
pub const DEFAULT_FALLBACK_BASE: &str = "Chương";

/// Content given to a chapter that received no paragraphs.
pub const EMPTY_CHAPTER_PLACEHOLDER: &str = " ";

/// A single find/replace directive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRule {
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub match_case: bool,
    #[serde(default)]
    pub whole_word: bool,
}

impl ReplacementRule {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            match_case: false,
            whole_word: false,
        }
    }

    pub fn match_case(mut self, yes: bool) -> Self {
        self.match_case = yes;
        self
    }

    pub fn whole_word(mut self, yes: bool) -> Self {
        self.whole_word = yes;
        self
    }

    pub fn is_noop(&self) -> bool {
        self.find.is_empty()
    }
}

/// How rules interact with each other's output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReplaceStrategy {
    /// Each rule runs over the text produced by the rules before it.
    #[default]
    Sequential,
    /// Every rule matches the original text; earlier rules win overlaps.
    SinglePass,
}

/// How split chapters are numbered from a detected title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberingStyle {
    /// `Chương 5.1`, `Chương 5.2`, ...
    #[default]
    Decimal,
    /// `Chương 5`, `Chương 6`, ...
    Sequential,
}

/// What to do with a chapter that ends up with no paragraphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyChapterPolicy {
    #[default]
    Placeholder,
    Drop,
}

/// A detected chapter heading, decomposed for renumbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTitleInfo {
    pub base: String,
    pub number: String,
    pub suffix: String,
    pub original: String,
}

impl ChapterTitleInfo {
    pub fn fallback(base: &str) -> Self {
        Self {
            base: base.to_string(),
            number: "1".to_string(),
            suffix: String::new(),
            original: format!("{} 1", base),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
}

impl Chapter {
    /// Title and content as the user copies them out.
    pub fn to_plain_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.content.trim_end())
    }

    /// Words in the title plus the content.
    pub fn word_count(&self) -> usize {
        crate::services::markup::count_words(&self.to_plain_text())
    }

    pub fn content_word_count(&self) -> usize {
        crate::services::markup::count_words(&self.content)
    }
}

/// A blank-line delimited block of body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph<'a> {
    pub text: &'a str,
    pub words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitConfig {
    pub splits: usize,
    pub numbering: NumberingStyle,
    /// Zero disables the floor.
    pub min_words_per_chapter: usize,
    pub empty_chapters: EmptyChapterPolicy,
    pub fallback_base: String,
}

impl SplitConfig {
    pub fn new(splits: usize) -> Self {
        Self {
            splits,
            ..Self::default()
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            splits: 1,
            numbering: NumberingStyle::default(),
            min_words_per_chapter: 0,
            empty_chapters: EmptyChapterPolicy::default(),
            fallback_base: DEFAULT_FALLBACK_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
    Stdin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub source_type: SourceType,
    pub fetched_at: String,
    pub total_lines: usize,
    pub total_words: usize,
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub chapter_count: usize,
    pub output_files: Vec<std::path::PathBuf>,
    pub metadata_file: Option<std::path::PathBuf>,
}
