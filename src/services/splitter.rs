use crate::services::markup::{count_words, normalize_newlines, split_paragraphs};
use crate::types::{
    Chapter, ChapterTitleInfo, EmptyChapterPolicy, NumberingStyle, Paragraph, SplitConfig,
    EMPTY_CHAPTER_PLACEHOLDER,
};
use regex::RegexBuilder;
use std::ops::Range;
use tracing::{debug, info, warn};

pub struct ChapterSplitter {
    config: SplitConfig,
}

impl ChapterSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Splits `text` into chapters of roughly equal word count, renumbering
    /// the heading found on the first line.
    pub fn split<S: AsRef<str>>(&self, text: &str, keywords: &[S]) -> Vec<Chapter> {
        let text = normalize_newlines(text);
        let trimmed = text.trim();

        let mut lines = trimmed.splitn(2, '\n');
        let first_line = lines.next().unwrap_or_default().trim();
        let rest = lines.next().unwrap_or_default();

        let (title_info, body) = match Self::detect_title(first_line, keywords) {
            Some(info) => {
                debug!(
                    "Detected chapter heading '{}' (base '{}', number {})",
                    info.original, info.base, info.number
                );
                (info, rest.trim())
            }
            None => {
                debug!("No chapter heading on the first line, using fallback title");
                (ChapterTitleInfo::fallback(&self.config.fallback_base), trimmed)
            }
        };

        let paragraphs: Vec<Paragraph<'_>> = split_paragraphs(body)
            .into_iter()
            .map(|text| Paragraph {
                text,
                words: count_words(text),
            })
            .collect();
        let total_words: usize = paragraphs.iter().map(|p| p.words).sum();
        let splits = self.effective_splits(total_words);

        if splits <= 1 || total_words == 0 {
            info!(
                "Returning a single chapter ({} words, {} requested splits)",
                total_words, self.config.splits
            );
            let content = if body.is_empty() {
                EMPTY_CHAPTER_PLACEHOLDER.to_string()
            } else {
                body.to_string()
            };
            return vec![Chapter {
                title: title_info.original,
                content,
            }];
        }

        let words: Vec<usize> = paragraphs.iter().map(|p| p.words).collect();
        let ranges = Self::distribute(&words, splits);

        let contents: Vec<Option<String>> = ranges
            .into_iter()
            .map(|range| {
                if range.is_empty() {
                    None
                } else {
                    Some(
                        paragraphs[range]
                            .iter()
                            .map(|p| p.text)
                            .collect::<Vec<_>>()
                            .join("\n\n"),
                    )
                }
            })
            .collect();

        let contents: Vec<String> = match self.config.empty_chapters {
            EmptyChapterPolicy::Placeholder => contents
                .into_iter()
                .map(|c| c.unwrap_or_else(|| EMPTY_CHAPTER_PLACEHOLDER.to_string()))
                .collect(),
            EmptyChapterPolicy::Drop => contents.into_iter().flatten().collect(),
        };

        let chapters: Vec<Chapter> = contents
            .into_iter()
            .enumerate()
            .map(|(idx, content)| Chapter {
                title: self.format_title(&title_info, idx + 1),
                content,
            })
            .collect();

        info!(
            "Split {} paragraphs ({} words) into {} chapters",
            paragraphs.len(),
            total_words,
            chapters.len()
        );

        chapters
    }

    /// Matches `line` against `keyword digits [suffix]`, where the suffix
    /// starts with `.`, `:` or whitespace. Keywords match case-insensitively.
    pub fn detect_title<S: AsRef<str>>(line: &str, keywords: &[S]) -> Option<ChapterTitleInfo> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return None;
        }

        let pattern = format!(r"^({})\s*([0-9]+)([.:\s].*)?$", alternatives.join("|"));
        let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(e) => {
                warn!("Chapter keyword pattern failed to compile: {}", e);
                return None;
            }
        };

        let captures = regex.captures(line)?;
        Some(ChapterTitleInfo {
            base: captures[1].to_string(),
            number: captures[2].to_string(),
            suffix: captures
                .get(3)
                .map(|m| m.as_str().trim_end().to_string())
                .unwrap_or_default(),
            original: line.to_string(),
        })
    }

    /// Chapter count after applying the minimum-words floor.
    pub fn effective_splits(&self, total_words: usize) -> usize {
        let requested = self.config.splits.max(1);
        let floor = self.config.min_words_per_chapter;
        if floor == 0 {
            return requested;
        }
        requested.min(total_words.div_ceil(floor).max(1))
    }

    /// Assigns paragraphs to `splits` chapters. Chapter `i` closes once the
    /// running word count reaches `i * total / splits`; the last chapter takes
    /// everything left. Ranges index into `words` and may be empty.
    pub fn distribute(words: &[usize], splits: usize) -> Vec<Range<usize>> {
        let splits = splits.max(1);
        let total: u128 = words.iter().map(|&w| w as u128).sum();
        let mut ranges = Vec::with_capacity(splits);
        let mut running: u128 = 0;
        let mut start = 0;
        let mut end = 0;

        for i in 1..=splits {
            if i == splits {
                end = words.len();
            } else {
                while end < words.len() && running * (splits as u128) < (i as u128) * total {
                    running += words[end] as u128;
                    end += 1;
                }
            }
            ranges.push(start..end);
            start = end;
        }

        ranges
    }

    /// Title for the `index`-th (1-based) output chapter.
    pub fn format_title(&self, info: &ChapterTitleInfo, index: usize) -> String {
        let number = match self.config.numbering {
            NumberingStyle::Decimal => format!("{}.{}", info.number, index),
            NumberingStyle::Sequential => match info.number.parse::<u64>() {
                Ok(start) => format!(
                    "{:0width$}",
                    start.saturating_add(index as u64 - 1),
                    width = info.number.len()
                ),
                Err(_) => {
                    debug!(
                        "Chapter number {} does not fit, numbering as decimal",
                        info.number
                    );
                    format!("{}.{}", info.number, index)
                }
            },
        };

        format!("{} {}{}", info.base, number, info.suffix)
    }
}

/// Splits `text` into `num_splits` chapters with default settings.
pub fn split<S: AsRef<str>>(text: &str, num_splits: usize, keywords: &[S]) -> Vec<Chapter> {
    ChapterSplitter::new(SplitConfig::new(num_splits)).split(text, keywords)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORDS: [&str; 4] = ["Chương", "Chapter", "Phần", "Hồi"];

    fn sample_body() -> String {
        (1..=10)
            .map(|i| {
                let words: Vec<String> = (0..(i * 7 % 23 + 3)).map(|w| format!("w{}", w)).collect();
                words.join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_split_with_detected_title() {
        let text = "Chương 5: Mở đầu\n\nPara one here.\n\nPara two here.";
        let info = ChapterSplitter::detect_title("Chương 5: Mở đầu", &["Chương"]).unwrap();
        assert_eq!(info.base, "Chương");
        assert_eq!(info.number, "5");
        assert_eq!(info.suffix, ": Mở đầu");

        let chapters = split(text, 2, &["Chương"]);
        assert_eq!(
            chapters,
            vec![
                Chapter {
                    title: "Chương 5.1: Mở đầu".to_string(),
                    content: "Para one here.".to_string(),
                },
                Chapter {
                    title: "Chương 5.2: Mở đầu".to_string(),
                    content: "Para two here.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_detect_title_variants() {
        let info = ChapterSplitter::detect_title("chapter 3 The Start", &KEYWORDS).unwrap();
        assert_eq!(info.base, "chapter");
        assert_eq!(info.number, "3");
        assert_eq!(info.suffix, " The Start");

        let info = ChapterSplitter::detect_title("Hồi12", &KEYWORDS).unwrap();
        assert_eq!(info.number, "12");
        assert_eq!(info.suffix, "");

        assert!(ChapterSplitter::detect_title("Chapter 12abc", &KEYWORDS).is_none());
        assert!(ChapterSplitter::detect_title("Chương mở đầu", &KEYWORDS).is_none());
        assert!(ChapterSplitter::detect_title("Prologue 1", &KEYWORDS).is_none());
        assert!(ChapterSplitter::detect_title::<&str>("Chapter 1", &[]).is_none());
        assert!(ChapterSplitter::detect_title("Chapter 1", &["", "  "]).is_none());
    }

    #[test]
    fn test_keywords_are_literal() {
        let info = ChapterSplitter::detect_title("C++ 2. Templates", &["C++"]).unwrap();
        assert_eq!(info.base, "C++");
        assert_eq!(info.suffix, ". Templates");
        assert!(ChapterSplitter::detect_title("Partx 1", &["Part."]).is_none());
    }

    #[test]
    fn test_single_split_returns_whole_body() {
        let text = "Chapter 2: Rain\n\nFirst paragraph.\n\n\nSecond\nparagraph.";
        let chapters = split(text, 1, &KEYWORDS);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chapter 2: Rain");
        assert_eq!(chapters[0].content, "First paragraph.\n\n\nSecond\nparagraph.");
    }

    #[test]
    fn test_zero_splits_treated_as_one() {
        let chapters = split("some words here", 0, &KEYWORDS);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content, "some words here");
    }

    #[test]
    fn test_untitled_text_uses_fallback() {
        let text = "Just some text\n\nMore text here\n\nAnd the end";
        let chapters = split(text, 2, &KEYWORDS);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chương 1.1");
        assert_eq!(chapters[1].title, "Chương 1.2");
        assert!(chapters[0].content.starts_with("Just some text"));

        let single = split(text, 1, &KEYWORDS);
        assert_eq!(single[0].title, "Chương 1");
        assert_eq!(single[0].content, text);
    }

    #[test]
    fn test_empty_and_title_only_text() {
        let chapters = split("  \n\n ", 3, &KEYWORDS);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chương 1");
        assert_eq!(chapters[0].content, EMPTY_CHAPTER_PLACEHOLDER);

        let chapters = split("Chương 2: Hết\n", 3, &KEYWORDS);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "Chương 2: Hết");
        assert_eq!(chapters[0].content, EMPTY_CHAPTER_PLACEHOLDER);
    }

    #[test]
    fn test_sequential_numbering_keeps_padding() {
        let config = SplitConfig {
            splits: 3,
            numbering: NumberingStyle::Sequential,
            ..SplitConfig::default()
        };
        let splitter = ChapterSplitter::new(config);
        let text = "Chapter 09: Storm\n\none two\n\nthree four\n\nfive six";
        let titles: Vec<String> = splitter
            .split(text, &KEYWORDS)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Chapter 09: Storm", "Chapter 10: Storm", "Chapter 11: Storm"]
        );
    }

    #[test]
    fn test_sequential_numbering_overflow_falls_back_to_decimal() {
        let config = SplitConfig {
            numbering: NumberingStyle::Sequential,
            ..SplitConfig::default()
        };
        let splitter = ChapterSplitter::new(config);
        let info = ChapterTitleInfo {
            base: "Phần".to_string(),
            number: "99999999999999999999999".to_string(),
            suffix: String::new(),
            original: String::new(),
        };
        assert_eq!(
            splitter.format_title(&info, 2),
            "Phần 99999999999999999999999.2"
        );
    }

    #[test]
    fn test_empty_chapters_get_placeholder() {
        let text = "Chương 1\n\none two three\n\nfour five six";
        let chapters = split(text, 4, &KEYWORDS);
        let contents: Vec<&str> = chapters.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["one two three", " ", "four five six", " "]);
        assert_eq!(chapters[3].title, "Chương 1.4");
    }

    #[test]
    fn test_empty_chapters_dropped() {
        let config = SplitConfig {
            splits: 4,
            empty_chapters: EmptyChapterPolicy::Drop,
            ..SplitConfig::default()
        };
        let text = "Chương 1\n\none two three\n\nfour five six";
        let chapters = ChapterSplitter::new(config).split(text, &KEYWORDS);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chương 1.1");
        assert_eq!(chapters[1].title, "Chương 1.2");
        assert_eq!(chapters[1].content, "four five six");
    }

    #[test]
    fn test_minimum_words_floor() {
        let body: Vec<String> = (0..12)
            .map(|_| "a b c d e f g h i j".to_string())
            .collect();
        let text = body.join("\n\n");
        let config = SplitConfig {
            splits: 5,
            min_words_per_chapter: 50,
            ..SplitConfig::default()
        };
        let splitter = ChapterSplitter::new(config);
        assert_eq!(splitter.effective_splits(120), 3);
        assert_eq!(splitter.effective_splits(0), 1);
        assert_eq!(splitter.split(&text, &KEYWORDS).len(), 3);

        let short = splitter.split("too short to split\n\nreally", &KEYWORDS);
        assert_eq!(short.len(), 1);
    }

    #[test]
    fn test_distribute_balances_words() {
        let ranges = ChapterSplitter::distribute(&[10, 10, 10, 10], 2);
        assert_eq!(ranges, vec![0..2, 2..4]);

        let ranges = ChapterSplitter::distribute(&[30, 5, 5, 5, 5], 2);
        assert_eq!(ranges, vec![0..1, 1..5]);

        let ranges = ChapterSplitter::distribute(&[1, 1, 1], 3);
        assert_eq!(ranges, vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_split_preserves_paragraphs_and_word_counts() {
        let body = sample_body();
        let text = format!("Chapter 7: Test\n\n{}", body);
        let expected_paragraphs = split_paragraphs(&body);
        let expected_words = count_words(&body);

        for n in 1..=12 {
            let chapters = split(&text, n, &KEYWORDS);
            assert!(!chapters.is_empty());
            assert!(chapters.len() <= n.max(1));
            assert!(chapters.iter().all(|c| !c.content.is_empty()));

            let rebuilt: Vec<&str> = chapters
                .iter()
                .flat_map(|c| split_paragraphs(&c.content))
                .collect();
            assert_eq!(rebuilt, expected_paragraphs, "paragraphs differ for n={}", n);

            let words: usize = chapters.iter().map(Chapter::content_word_count).sum();
            assert_eq!(words, expected_words, "word count differs for n={}", n);
        }
    }

    #[test]
    fn test_crlf_input() {
        let text = "Chapter 1\r\n\r\nalpha beta\r\n\r\ngamma delta";
        let chapters = split(text, 2, &KEYWORDS);
        assert_eq!(chapters[0].content, "alpha beta");
        assert_eq!(chapters[1].content, "gamma delta");
    }
}
