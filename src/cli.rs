use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use text_toolkit::{NumberingStyle, ReplaceStrategy};

#[derive(Parser)]
#[command(name = "ttk")]
#[command(about = "Find/replace with highlighting and word-balanced chapter splitting")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file holding replace profiles and chapter keywords
    #[arg(long, global = true, default_value = "./text-toolkit.json")]
    pub settings: PathBuf,

    /// Output directory for written files
    #[arg(short, long, global = true, default_value = "./output")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a profile's find/replace rules and highlight the changes
    Replace(ReplaceArgs),

    /// Split text into word-balanced, renumbered chapters
    Split(SplitArgs),

    /// Count words and preview possible splits
    Count(CountArgs),

    /// Manage replace profiles and chapter keywords
    Profile(ProfileArgs),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Sequential,
    SinglePass,
}

impl From<StrategyArg> for ReplaceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => ReplaceStrategy::Sequential,
            StrategyArg::SinglePass => ReplaceStrategy::SinglePass,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NumberingArg {
    Decimal,
    Sequential,
}

impl From<NumberingArg> for NumberingStyle {
    fn from(arg: NumberingArg) -> Self {
        match arg {
            NumberingArg::Decimal => NumberingStyle::Decimal,
            NumberingArg::Sequential => NumberingStyle::Sequential,
        }
    }
}

#[derive(Args)]
pub struct ReplaceArgs {
    /// Input source (file path, URL, or - for stdin)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Profile to use instead of the active one
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// How rules see each other's output
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Print replaced text without HTML markup
    #[arg(long)]
    pub plain: bool,

    /// Write the result into the output directory instead of stdout
    #[arg(long)]
    pub write: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Input source (file path, URL, or - for stdin)
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Number of chapters to create
    #[arg(short, long, default_value = "2")]
    pub splits: usize,

    /// Chapter numbering convention
    #[arg(long, value_enum)]
    pub numbering: Option<NumberingArg>,

    /// Minimum words per chapter (50 when given without a value)
    #[arg(long, value_name = "WORDS", num_args = 0..=1)]
    pub min_words: Option<Option<usize>>,

    /// Omit chapters that receive no paragraphs
    #[arg(long)]
    pub drop_empty: bool,

    /// Print chapters to stdout instead of writing files
    #[arg(long)]
    pub print: bool,

    /// Skip the JSON metadata file
    #[arg(long)]
    pub no_metadata: bool,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CountArgs {
    /// Input sources (file paths, URLs, or - for stdin)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Show chapter sizes for each split preview
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileCommand,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// List profiles and chapter keywords
    List,

    /// Show the rules of a profile (the active one by default)
    Show { name: Option<String> },

    /// Create an empty profile and make it active
    Add { name: String },

    /// Copy the active profile and make the copy active
    Copy { name: String },

    /// Rename the active profile
    Rename { name: String },

    /// Delete a profile
    Delete { name: String },

    /// Make a profile active
    Use { name: String },

    /// Append a rule to the active profile
    AddRule {
        find: String,
        replace: String,

        #[arg(long)]
        match_case: bool,

        #[arg(long)]
        whole_word: bool,
    },

    /// Add a chapter keyword
    AddKeyword { keyword: String },

    /// Remove a chapter keyword
    RemoveKeyword { keyword: String },

    /// Replace the settings with those from a file
    Import { file: PathBuf },

    /// Write the settings to a file
    Export { file: PathBuf },
}
