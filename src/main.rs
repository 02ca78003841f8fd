mod cli;

use clap::Parser;
use cli::{Cli, Commands, CountArgs, ProfileCommand, ReplaceArgs, SplitArgs};
use std::path::Path;
use text_toolkit::services::exporter::ChapterExporter;
use text_toolkit::services::markup::{count_words, split_paragraphs, to_plain_text};
use text_toolkit::types::DEFAULT_MIN_WORDS_PER_CHAPTER;
use text_toolkit::{
    ChapterSplitter, ContentFetcher, EmptyChapterPolicy, ReplacementEngine, ReplacementRule,
    Result, SettingsStore, ToolkitError,
};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG takes precedence over --verbose
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Replace(args) => handle_replace_command(args, &cli.settings, &cli.output).await,
        Commands::Split(args) => handle_split_command(args, &cli.settings, &cli.output).await,
        Commands::Count(args) => handle_count_command(args, &cli.settings).await,
        Commands::Profile(args) => handle_profile_command(&args.action, &cli.settings).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_replace_command(
    args: &ReplaceArgs,
    settings_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    let settings = SettingsStore::load(settings_path).await?;
    let (text, source) = ContentFetcher::fetch_content(&args.source).await?;

    let profile = args.profile.as_deref().unwrap_or(&settings.active_mode);
    let rules = settings.rules_for(profile)?;
    let engine = match args.strategy {
        Some(strategy) => ReplacementEngine::with_strategy(strategy.into()),
        None => settings.replace_engine(),
    };

    info!(
        "Applying {} rules of profile '{}' to '{}' ({} words, {:?} strategy)",
        rules.iter().filter(|r| !r.is_noop()).count(),
        profile,
        source.name,
        source.total_words,
        engine.strategy()
    );

    let (output, extension) = if args.plain {
        (engine.replace_plain(&text, rules), "txt")
    } else {
        (engine.replace(&text, rules), "html")
    };

    let output_words = if args.plain {
        count_words(&output)
    } else {
        count_words(&to_plain_text(&output))
    };
    info!("Output word count: {}", output_words);

    if args.write {
        ChapterExporter::write_replaced(output_dir, &source.name, extension, &output).await?;
    } else {
        println!("{}", output);
    }

    Ok(())
}

async fn handle_split_command(
    args: &SplitArgs,
    settings_path: &Path,
    output_dir: &Path,
) -> Result<()> {
    if args.splits == 0 {
        return Err(ToolkitError::SplitConfig {
            reason: "Number of splits must be greater than 0".to_string(),
        });
    }

    // Check if output directory exists and handle force flag
    if !args.print && output_dir.exists() && !args.force {
        let entries = std::fs::read_dir(output_dir).map_err(|e| ToolkitError::OutputDirectory {
            reason: format!("Cannot read output directory: {}", e),
        })?;

        if entries.count() > 0 {
            return Err(ToolkitError::OutputDirectory {
                reason: "Output directory is not empty. Use --force to overwrite.".to_string(),
            });
        }
    }

    let settings = SettingsStore::load(settings_path).await?;
    let (text, source) = ContentFetcher::fetch_content(&args.source).await?;

    let mut config = settings.split_config(args.splits);
    if let Some(numbering) = args.numbering {
        config.numbering = numbering.into();
    }
    if let Some(min_words) = args.min_words {
        config.min_words_per_chapter = min_words.unwrap_or(DEFAULT_MIN_WORDS_PER_CHAPTER);
    }
    if args.drop_empty {
        config.empty_chapters = EmptyChapterPolicy::Drop;
    }

    info!(
        "Splitting '{}' ({} words) into {} chapters",
        source.name, source.total_words, config.splits
    );

    let splitter = ChapterSplitter::new(config);
    let chapters = splitter.split(&text, &settings.chapter_keywords);

    if chapters.len() < args.splits {
        warn!(
            "Produced {} chapters instead of {} requested",
            chapters.len(),
            args.splits
        );
    }
    for (idx, chapter) in chapters.iter().enumerate() {
        info!(
            "  Chapter {}: '{}' ({} words)",
            idx + 1,
            chapter.title,
            chapter.word_count()
        );
    }

    if args.print {
        for chapter in &chapters {
            println!("{}\n", chapter.to_plain_text());
        }
        return Ok(());
    }

    let result =
        ChapterExporter::export(&chapters, &source.name, output_dir, !args.no_metadata).await?;

    info!(
        "Successfully created {} chapter files for '{}':",
        result.chapter_count, source.name
    );
    for output_file in &result.output_files {
        info!("  - {}", output_file.display());
    }
    if let Some(metadata_file) = &result.metadata_file {
        info!("  - {} (metadata)", metadata_file.display());
    }

    Ok(())
}

async fn handle_count_command(args: &CountArgs, settings_path: &Path) -> Result<()> {
    let sources = ContentFetcher::validate_sources(&args.sources)?;
    let settings = SettingsStore::load(settings_path).await?;

    for source in sources {
        let (text, info) = ContentFetcher::fetch_content(&source).await?;
        let first_line = text.trim().lines().next().unwrap_or_default();
        let heading = ChapterSplitter::detect_title(first_line.trim(), &settings.chapter_keywords);

        println!("\n=== Analysis for '{}' ===", info.name);
        println!("Source type: {:?}", info.source_type);
        println!("Total words: {}", info.total_words);
        println!("Total lines: {}", info.total_lines);
        println!("Paragraphs: {}", split_paragraphs(&text).len());
        match &heading {
            Some(title) => println!(
                "Chapter heading: {} (number {}, suffix '{}')",
                title.base, title.number, title.suffix
            ),
            None => println!("Chapter heading: none detected"),
        }

        println!("\nPotential Split Scenarios:");
        for splits in 2..=10 {
            let splitter = ChapterSplitter::new(settings.split_config(splits));
            let chapters = splitter.split(&text, &settings.chapter_keywords);
            let sizes: Vec<usize> = chapters.iter().map(|c| c.content_word_count()).collect();
            let largest = sizes.iter().copied().max().unwrap_or(0);
            println!(
                "  {} splits: {} chapters, largest {} words",
                splits,
                chapters.len(),
                largest
            );
            if args.detailed {
                for chapter in &chapters {
                    println!("    {}: {} words", chapter.title, chapter.content_word_count());
                }
            }
        }
    }

    Ok(())
}

async fn handle_profile_command(action: &ProfileCommand, settings_path: &Path) -> Result<()> {
    let mut settings = SettingsStore::load(settings_path).await?;

    match action {
        ProfileCommand::List => {
            println!("Profiles:");
            for (name, mode) in &settings.modes {
                let marker = if *name == settings.active_mode { "*" } else { " " };
                let rules = mode.pairs.iter().filter(|r| !r.is_noop()).count();
                println!("  {} {} ({} rules)", marker, name, rules);
            }
            println!("Chapter keywords: {}", settings.chapter_keywords.join(", "));
            return Ok(());
        }
        ProfileCommand::Show { name } => {
            let name = name.as_deref().unwrap_or(&settings.active_mode);
            println!("Rules of '{}':", name);
            for (idx, rule) in settings.rules_for(name)?.iter().enumerate() {
                if rule.is_noop() {
                    continue;
                }
                let mut flags = Vec::new();
                if rule.match_case {
                    flags.push("match case");
                }
                if rule.whole_word {
                    flags.push("whole word");
                }
                println!(
                    "  {}. '{}' -> '{}' {}",
                    idx + 1,
                    rule.find,
                    rule.replace,
                    if flags.is_empty() {
                        String::new()
                    } else {
                        format!("[{}]", flags.join(", "))
                    }
                );
            }
            return Ok(());
        }
        ProfileCommand::Export { file } => {
            SettingsStore::save(file, &settings).await?;
            info!("Settings exported to: {}", file.display());
            return Ok(());
        }
        ProfileCommand::Add { name } => settings.add_mode(name)?,
        ProfileCommand::Copy { name } => settings.copy_mode(name)?,
        ProfileCommand::Rename { name } => settings.rename_mode(name)?,
        ProfileCommand::Delete { name } => settings.delete_mode(name)?,
        ProfileCommand::Use { name } => settings.set_active_mode(name)?,
        ProfileCommand::AddRule {
            find,
            replace,
            match_case,
            whole_word,
        } => settings.add_rule(
            ReplacementRule::new(find.as_str(), replace.as_str())
                .match_case(*match_case)
                .whole_word(*whole_word),
        )?,
        ProfileCommand::AddKeyword { keyword } => {
            if !settings.add_keyword(keyword) {
                warn!("Keyword '{}' is blank or already present", keyword);
                return Ok(());
            }
        }
        ProfileCommand::RemoveKeyword { keyword } => {
            if !settings.remove_keyword(keyword) {
                warn!("Keyword '{}' not found", keyword);
                return Ok(());
            }
        }
        ProfileCommand::Import { file } => {
            settings = SettingsStore::import(file).await?;
            info!("Imported settings from: {}", file.display());
        }
    }

    SettingsStore::save(settings_path, &settings).await?;
    info!(
        "Settings saved to {} (active profile '{}')",
        settings_path.display(),
        settings.active_mode
    );
    Ok(())
}
