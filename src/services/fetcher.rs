use crate::error::{Result, ToolkitError};
use crate::services::markup::{count_words, normalize_newlines};
use crate::types::{SourceInfo, SourceType};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::info;
use url::Url;

const UTF8_BOM: char = '\u{feff}';

/// Source name that reads from standard input.
pub const STDIN_SOURCE: &str = "-";

pub struct ContentFetcher;

impl ContentFetcher {
    /// Reads text from a file path, an http(s) URL or `-` for stdin. The
    /// result has its BOM stripped and line endings normalized to `\n`.
    pub async fn fetch_content(source: &str) -> Result<(String, SourceInfo)> {
        let (raw, name, source_type) = if source == STDIN_SOURCE {
            (Self::read_stdin().await?, "stdin".to_string(), SourceType::Stdin)
        } else if Self::is_url(source) {
            let (raw, name) = Self::fetch_from_url(source).await?;
            (raw, name, SourceType::Url)
        } else {
            let (raw, name) = Self::fetch_from_file(source).await?;
            (raw, name, SourceType::LocalFile)
        };

        let content = Self::clean_text(&raw);
        let info = SourceInfo {
            name,
            source_type,
            fetched_at: chrono::Utc::now().to_rfc3339(),
            total_lines: content.lines().count(),
            total_words: count_words(&content),
        };

        Ok((content, info))
    }

    pub fn clean_text(raw: &str) -> String {
        let text = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        normalize_newlines(text).into_owned()
    }

    async fn read_stdin() -> Result<String> {
        info!("Reading text from stdin");
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await?;
        Ok(content)
    }

    async fn fetch_from_url(url: &str) -> Result<(String, String)> {
        info!("Fetching content from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let response = reqwest::Client::new().get(url).send().await?;

        if !response.status().is_success() {
            return Err(ToolkitError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let content = response.text().await?;
        Ok((content, Self::extract_filename_from_url(&parsed_url)))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(String, String)> {
        info!("Reading file: {}", file_path);

        let path = Path::new(file_path);
        if !path.exists() {
            return Err(ToolkitError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok((content, filename))
    }

    fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("downloaded.txt")
            .to_string()
    }

    pub fn validate_sources(sources: &[String]) -> Result<Vec<String>> {
        let mut validated = Vec::new();

        for source in sources {
            if source == STDIN_SOURCE {
                validated.push(source.clone());
            } else if Self::is_url(source) {
                Url::parse(source)?;
                validated.push(source.clone());
            } else {
                let path = Path::new(source);
                if path.is_file() {
                    validated.push(source.clone());
                } else {
                    return Err(ToolkitError::FileNotFound {
                        path: source.clone(),
                    });
                }
            }
        }

        Ok(validated)
    }
}
