//! Named rule profiles ("modes") and chapter keywords, plus the JSON file
//! they are kept in. The layout matches the settings exported by the web
//! version of the tool, so those files import unchanged.

use crate::error::{Result, ToolkitError};
use crate::services::replacer::ReplacementEngine;
use crate::types::{
    EmptyChapterPolicy, NumberingStyle, ReplaceStrategy, ReplacementRule, SplitConfig,
    DEFAULT_FALLBACK_BASE,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

pub const DEFAULT_MODE_NAME: &str = "Mặc định";

fn default_fallback_base() -> String {
    DEFAULT_FALLBACK_BASE.to_string()
}

pub fn default_keywords() -> Vec<String> {
    ["Chương", "Chapter", "Phần", "Hồi"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    #[serde(default)]
    pub pairs: Vec<ReplacementRule>,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            pairs: vec![ReplacementRule::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub modes: BTreeMap<String, Mode>,
    pub active_mode: String,
    #[serde(default = "default_keywords")]
    pub chapter_keywords: Vec<String>,
    #[serde(default)]
    pub numbering: NumberingStyle,
    #[serde(default)]
    pub replace_strategy: ReplaceStrategy,
    #[serde(default)]
    pub min_words_per_chapter: usize,
    #[serde(default)]
    pub empty_chapters: EmptyChapterPolicy,
    /// Title base used when the text has no recognised chapter heading.
    #[serde(default = "default_fallback_base")]
    pub fallback_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        let mut modes = BTreeMap::new();
        modes.insert(DEFAULT_MODE_NAME.to_string(), Mode::default());
        Self {
            modes,
            active_mode: DEFAULT_MODE_NAME.to_string(),
            chapter_keywords: default_keywords(),
            numbering: NumberingStyle::default(),
            replace_strategy: ReplaceStrategy::default(),
            min_words_per_chapter: 0,
            empty_chapters: EmptyChapterPolicy::default(),
            fallback_base: default_fallback_base(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            return Err(ToolkitError::Settings {
                reason: "at least one mode is required".to_string(),
            });
        }
        if !self.modes.contains_key(&self.active_mode) {
            return Err(ToolkitError::Settings {
                reason: format!("active mode '{}' is not defined", self.active_mode),
            });
        }
        Ok(())
    }

    pub fn mode(&self, name: &str) -> Result<&Mode> {
        self.modes.get(name).ok_or_else(|| ToolkitError::ProfileNotFound {
            name: name.to_string(),
        })
    }

    pub fn active_rules(&self) -> Result<&[ReplacementRule]> {
        self.rules_for(&self.active_mode)
    }

    pub fn rules_for(&self, name: &str) -> Result<&[ReplacementRule]> {
        Ok(&self.mode(name)?.pairs)
    }

    pub fn set_active_mode(&mut self, name: &str) -> Result<()> {
        self.mode(name)?;
        self.active_mode = name.to_string();
        Ok(())
    }

    /// Creates a mode with one empty rule and makes it active.
    pub fn add_mode(&mut self, name: &str) -> Result<()> {
        let name = self.check_new_name(name)?;
        self.modes.insert(name.clone(), Mode::default());
        self.active_mode = name;
        Ok(())
    }

    /// Copies the active mode under `name` and makes the copy active.
    pub fn copy_mode(&mut self, name: &str) -> Result<()> {
        let name = self.check_new_name(name)?;
        let copy = self.mode(&self.active_mode)?.clone();
        self.modes.insert(name.clone(), copy);
        self.active_mode = name;
        Ok(())
    }

    pub fn rename_mode(&mut self, name: &str) -> Result<()> {
        let name = self.check_new_name(name)?;
        let mode = self
            .modes
            .remove(&self.active_mode)
            .ok_or_else(|| ToolkitError::ProfileNotFound {
                name: self.active_mode.clone(),
            })?;
        debug!("Renaming mode '{}' to '{}'", self.active_mode, name);
        self.modes.insert(name.clone(), mode);
        self.active_mode = name;
        Ok(())
    }

    /// Removes a mode. The last remaining mode cannot be deleted; if the
    /// active mode is removed the first remaining one becomes active.
    pub fn delete_mode(&mut self, name: &str) -> Result<()> {
        self.mode(name)?;
        if self.modes.len() <= 1 {
            return Err(ToolkitError::LastProfile);
        }
        self.modes.remove(name);
        if self.active_mode == name {
            if let Some(first) = self.modes.keys().next() {
                self.active_mode = first.clone();
            }
        }
        Ok(())
    }

    pub fn set_active_rules(&mut self, rules: Vec<ReplacementRule>) -> Result<()> {
        let active = self.active_mode.clone();
        let mode = self
            .modes
            .get_mut(&active)
            .ok_or(ToolkitError::ProfileNotFound { name: active })?;
        mode.pairs = rules;
        Ok(())
    }

    /// Appends a rule to the active mode, replacing the placeholder empty
    /// rule a fresh mode starts with.
    pub fn add_rule(&mut self, rule: ReplacementRule) -> Result<()> {
        let mut rules = self.active_rules()?.to_vec();
        rules.retain(|r| !r.is_noop());
        rules.push(rule);
        self.set_active_rules(rules)
    }

    /// Returns `false` when the keyword is blank or already present.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.chapter_keywords.iter().any(|k| k == keyword) {
            return false;
        }
        self.chapter_keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, keyword: &str) -> bool {
        let before = self.chapter_keywords.len();
        self.chapter_keywords.retain(|k| k != keyword);
        self.chapter_keywords.len() != before
    }

    pub fn split_config(&self, splits: usize) -> SplitConfig {
        SplitConfig {
            splits,
            numbering: self.numbering,
            min_words_per_chapter: self.min_words_per_chapter,
            empty_chapters: self.empty_chapters,
            fallback_base: self.fallback_base.clone(),
        }
    }

    pub fn replace_engine(&self) -> ReplacementEngine {
        ReplacementEngine::with_strategy(self.replace_strategy)
    }

    fn check_new_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ToolkitError::Settings {
                reason: "mode name cannot be empty".to_string(),
            });
        }
        if self.modes.contains_key(name) {
            return Err(ToolkitError::ProfileExists {
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }
}

pub struct SettingsStore;

impl SettingsStore {
    /// Reads settings from `path`, falling back to defaults when the file
    /// does not exist yet.
    pub async fn load(path: &Path) -> Result<Settings> {
        if !path.exists() {
            info!(
                "Settings file {} not found, using defaults",
                path.display()
            );
            return Ok(Settings::default());
        }
        Self::read(path).await
    }

    /// Like [`SettingsStore::load`] but the file must exist.
    pub async fn import(path: &Path) -> Result<Settings> {
        if !path.exists() {
            return Err(ToolkitError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        Self::read(path).await
    }

    pub async fn save(path: &Path, settings: &Settings) -> Result<()> {
        settings.validate()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(path, json).await?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    async fn read(path: &Path) -> Result<Settings> {
        let content = fs::read_to_string(path).await?;
        let settings: Settings =
            serde_json::from_str(&content).map_err(|e| ToolkitError::Settings {
                reason: format!("{}: {}", path.display(), e),
            })?;
        settings.validate()?;
        debug!(
            "Loaded {} modes from {} (active '{}')",
            settings.modes.len(),
            path.display(),
            settings.active_mode
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.active_mode, DEFAULT_MODE_NAME);
        assert_eq!(settings.chapter_keywords, default_keywords());
        let rules = settings.active_rules().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].is_noop());
    }

    #[test]
    fn test_mode_management() {
        let mut settings = Settings::default();

        settings.add_mode("Truyện").unwrap();
        assert_eq!(settings.active_mode, "Truyện");
        assert!(matches!(
            settings.add_mode("Truyện"),
            Err(ToolkitError::ProfileExists { .. })
        ));
        assert!(settings.add_mode("   ").is_err());

        settings
            .add_rule(ReplacementRule::new("anh", "chàng").whole_word(true))
            .unwrap();
        assert_eq!(settings.active_rules().unwrap().len(), 1);

        settings.copy_mode("Truyện (copy)").unwrap();
        assert_eq!(settings.active_mode, "Truyện (copy)");
        assert_eq!(
            settings.active_rules().unwrap(),
            settings.rules_for("Truyện").unwrap()
        );

        settings.rename_mode("Bản sao").unwrap();
        assert!(settings.mode("Truyện (copy)").is_err());
        assert_eq!(settings.active_rules().unwrap()[0].find, "anh");
        assert!(settings.rename_mode("Truyện").is_err());

        settings.delete_mode("Bản sao").unwrap();
        assert_eq!(settings.active_mode, DEFAULT_MODE_NAME);
        assert!(matches!(
            settings.delete_mode("missing"),
            Err(ToolkitError::ProfileNotFound { .. })
        ));

        settings.delete_mode("Truyện").unwrap();
        assert!(matches!(
            settings.delete_mode(DEFAULT_MODE_NAME),
            Err(ToolkitError::LastProfile)
        ));
        assert_eq!(settings.active_mode, DEFAULT_MODE_NAME);
    }

    #[test]
    fn test_set_active_mode() {
        let mut settings = Settings::default();
        settings.add_mode("Other").unwrap();
        settings.set_active_mode(DEFAULT_MODE_NAME).unwrap();
        assert_eq!(settings.active_mode, DEFAULT_MODE_NAME);
        assert!(settings.set_active_mode("nope").is_err());
    }

    #[test]
    fn test_keywords() {
        let mut settings = Settings::default();
        assert!(settings.add_keyword("  Quyển "));
        assert!(!settings.add_keyword("Quyển"));
        assert!(!settings.add_keyword(" "));
        assert!(settings.chapter_keywords.contains(&"Quyển".to_string()));
        assert!(settings.remove_keyword("Hồi"));
        assert!(!settings.remove_keyword("Hồi"));
    }

    #[test]
    fn test_parses_exported_web_settings() {
        let json = r#"{
            "modes": {
                "Mặc định": { "pairs": [ { "find": "ko", "replace": "không" } ] },
                "Khác": { "pairs": [ { "find": "a", "replace": "b", "matchCase": true, "wholeWord": true } ] }
            },
            "activeMode": "Khác"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.chapter_keywords, default_keywords());
        assert_eq!(settings.replace_strategy, ReplaceStrategy::Sequential);
        assert_eq!(settings.fallback_base, DEFAULT_FALLBACK_BASE);

        let default_rules = settings.rules_for(DEFAULT_MODE_NAME).unwrap();
        assert!(!default_rules[0].match_case);
        assert!(!default_rules[0].whole_word);
        assert!(settings.active_rules().unwrap()[0].whole_word);
    }

    #[test]
    fn test_split_config_from_settings() {
        let settings = Settings {
            numbering: NumberingStyle::Sequential,
            min_words_per_chapter: 80,
            ..Settings::default()
        };
        let config = settings.split_config(4);
        assert_eq!(config.splits, 4);
        assert_eq!(config.numbering, NumberingStyle::Sequential);
        assert_eq!(config.min_words_per_chapter, 80);
        assert_eq!(config.fallback_base, DEFAULT_FALLBACK_BASE);
    }

    #[test]
    fn test_fallback_base_reaches_split_titles() {
        let json = r#"{
            "modes": { "Mặc định": { "pairs": [] } },
            "activeMode": "Mặc định",
            "fallbackBase": "Chapter"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.fallback_base, "Chapter");

        let config = settings.split_config(2);
        assert_eq!(config.fallback_base, "Chapter");

        let chapters = crate::services::splitter::ChapterSplitter::new(config)
            .split("no heading here\n\nsecond paragraph", &settings.chapter_keywords);
        assert_eq!(chapters[0].title, "Chapter 1.1");
        assert_eq!(chapters[1].title, "Chapter 1.2");
    }

    #[test]
    fn test_deleting_active_mode_activates_first_sorted_name() {
        let mut settings = Settings::default();
        settings.add_mode("Zeta").unwrap();
        settings.add_mode("Alpha").unwrap();
        settings.set_active_mode("Zeta").unwrap();

        settings.delete_mode("Zeta").unwrap();
        assert_eq!(settings.active_mode, "Alpha");

        settings.set_active_mode(DEFAULT_MODE_NAME).unwrap();
        settings.delete_mode("Alpha").unwrap();
        assert_eq!(settings.active_mode, DEFAULT_MODE_NAME);
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        let settings = SettingsStore::load(&path).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert!(matches!(
            SettingsStore::import(&path).await,
            Err(ToolkitError::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.add_mode("Chế độ mới").unwrap();
        settings.add_rule(ReplacementRule::new("x", "y")).unwrap();
        settings.replace_strategy = ReplaceStrategy::SinglePass;

        SettingsStore::save(&path, &settings).await.unwrap();
        let loaded = SettingsStore::load(&path).await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_settings() {
        let temp_dir = TempDir::new().unwrap();

        let unknown_active = temp_dir.path().join("unknown_active.json");
        std::fs::write(
            &unknown_active,
            r#"{ "modes": { "A": { "pairs": [] } }, "activeMode": "B" }"#,
        )
        .unwrap();
        assert!(matches!(
            SettingsStore::import(&unknown_active).await,
            Err(ToolkitError::Settings { .. })
        ));

        let missing_modes = temp_dir.path().join("missing_modes.json");
        std::fs::write(&missing_modes, r#"{ "activeMode": "A" }"#).unwrap();
        assert!(matches!(
            SettingsStore::import(&missing_modes).await,
            Err(ToolkitError::Settings { .. })
        ));
    }
}
