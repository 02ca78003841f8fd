use crate::error::{Result, ToolkitError};
use crate::types::{Chapter, ExportResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub struct ChapterExporter;

impl ChapterExporter {
    /// Writes one plain-text file per chapter and, optionally, a JSON file
    /// describing them.
    pub async fn export(
        chapters: &[Chapter],
        source_name: &str,
        output_dir: &Path,
        include_metadata: bool,
    ) -> Result<ExportResult> {
        info!(
            "Writing {} chapters of '{}' to {}",
            chapters.len(),
            source_name,
            output_dir.display()
        );

        Self::ensure_output_directory(output_dir).await?;

        let mut output_files = Vec::with_capacity(chapters.len());
        for (idx, chapter) in chapters.iter().enumerate() {
            let path =
                Self::generate_output_filename(output_dir, source_name, idx + 1, chapters.len());
            fs::write(&path, chapter.to_plain_text()).await.map_err(|e| {
                ToolkitError::OutputDirectory {
                    reason: format!("Failed to write chapter file {}: {}", path.display(), e),
                }
            })?;
            debug!("Wrote '{}' to {}", chapter.title, path.display());
            output_files.push(path);
        }

        let metadata_file = if include_metadata {
            let path = Self::generate_metadata_filename(output_dir, source_name);
            Self::write_metadata_file(&path, source_name, chapters, &output_files).await?;
            Some(path)
        } else {
            None
        };

        Ok(ExportResult {
            chapter_count: output_files.len(),
            output_files,
            metadata_file,
        })
    }

    /// Writes the output of a replace run as `<stem>_replaced.<extension>`.
    pub async fn write_replaced(
        output_dir: &Path,
        source_name: &str,
        extension: &str,
        content: &str,
    ) -> Result<PathBuf> {
        Self::ensure_output_directory(output_dir).await?;

        let path = output_dir.join(format!(
            "{}_replaced.{}",
            Self::file_stem(source_name),
            extension
        ));
        fs::write(&path, content).await.map_err(|e| ToolkitError::OutputDirectory {
            reason: format!("Failed to write replaced output {}: {}", path.display(), e),
        })?;

        info!("Replaced output written to: {}", path.display());
        Ok(path)
    }

    async fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                ToolkitError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        }
        Ok(())
    }

    pub fn file_stem(source_name: &str) -> &str {
        Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }

    pub fn generate_output_filename(
        output_dir: &Path,
        source_name: &str,
        chapter_number: usize,
        total_chapters: usize,
    ) -> PathBuf {
        let filename = format!(
            "{}_chapter_{:0width$}_of_{}.txt",
            Self::file_stem(source_name),
            chapter_number,
            total_chapters,
            width = total_chapters.to_string().len()
        );
        output_dir.join(filename)
    }

    fn generate_metadata_filename(output_dir: &Path, source_name: &str) -> PathBuf {
        output_dir.join(format!("{}_chapters.json", Self::file_stem(source_name)))
    }

    async fn write_metadata_file(
        metadata_path: &Path,
        source_name: &str,
        chapters: &[Chapter],
        output_files: &[PathBuf],
    ) -> Result<()> {
        let chapter_info: Vec<serde_json::Value> = chapters
            .iter()
            .zip(output_files)
            .enumerate()
            .map(|(idx, (chapter, path))| {
                serde_json::json!({
                    "number": idx + 1,
                    "title": chapter.title,
                    "words": chapter.content_word_count(),
                    "filename": path.file_name().and_then(|n| n.to_str()).unwrap_or_default(),
                })
            })
            .collect();

        let metadata = serde_json::json!({
            "source": source_name,
            "created_at": chrono::Utc::now().to_rfc3339(),
            "total_chapters": chapters.len(),
            "total_words": chapters.iter().map(Chapter::content_word_count).sum::<usize>(),
            "chapters": chapter_info,
        });

        let json_content = serde_json::to_string_pretty(&metadata)?;
        fs::write(metadata_path, json_content).await.map_err(|e| {
            ToolkitError::OutputDirectory {
                reason: format!("Failed to write metadata file: {}", e),
            }
        })?;

        info!("Generated metadata file: {}", metadata_path.display());
        Ok(())
    }
}
