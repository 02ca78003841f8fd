//! # Text Toolkit
//!
//! Find/replace with highlighted output across named rule profiles, and
//! splitting of long text into word-balanced, renumbered chapters.
//!
//! Both operations are pure functions over in-memory strings; loading
//! settings, reading sources and writing results live in the outer services
//! used by the `ttk` binary.
//!
//! ## Example Usage
//!
//! ```rust
//! use text_toolkit::{replace, split, ReplacementRule};
//!
//! let rules = vec![ReplacementRule::new("world", "Earth").whole_word(true)];
//! let html = replace("Hello world", &rules);
//! assert_eq!(html, r#"<p>Hello <span class="highlight">Earth</span></p>"#);
//!
//! let text = "Chương 5: Mở đầu\n\nPara one here.\n\nPara two here.";
//! let chapters = split(text, 2, &["Chương"]);
//! assert_eq!(chapters[0].title, "Chương 5.1: Mở đầu");
//! assert_eq!(chapters[1].content, "Para two here.");
//! ```

pub mod error;
pub mod services;
pub mod types;

pub use error::{Result, ToolkitError};
pub use services::markup::{count_words, to_plain_text};
pub use services::replacer::replace;
pub use services::splitter::split;
pub use services::{
    ChapterExporter, ChapterSplitter, ContentFetcher, ReplacementEngine, Segment, Settings,
    SettingsStore,
};
pub use types::{
    Chapter, ChapterTitleInfo, EmptyChapterPolicy, NumberingStyle, ReplaceStrategy,
    ReplacementRule, SourceInfo, SourceType, SplitConfig,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
