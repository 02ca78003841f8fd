pub mod exporter;
pub mod fetcher;
pub mod markup;
pub mod replacer;
pub mod settings;
pub mod splitter;

pub use exporter::ChapterExporter;
pub use fetcher::ContentFetcher;
pub use replacer::{ReplacementEngine, Segment};
pub use settings::{Settings, SettingsStore};
pub use splitter::ChapterSplitter;
