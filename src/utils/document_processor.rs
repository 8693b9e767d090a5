use crate::config::Config;
use crate::core::parser::{DocxParser, Parser};
use crate::core::qa::{find_json_files, load_records, write_csv};
use crate::core::section::SectionAnnotator;
use crate::core::writer::{DocxWriter, Writer};
use crate::error::ToolError;
use crate::utils::listing::{folder_entries, has_suffix};
use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of annotating one document.
#[derive(Debug, Clone)]
pub struct AnnotateReport {
    pub output_path: PathBuf,
    /// Paragraphs matching the section marker predicate
    pub candidates: usize,
    /// Paragraphs whose text actually changed
    pub rewritten: usize,
}

/// One converted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub source_name: String,
    pub output_name: String,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConvertReport {
    pub output_dir: PathBuf,
    pub converted: Vec<ConvertedFile>,
}

#[derive(Debug, Clone)]
pub struct MergeReport {
    pub output_path: PathBuf,
    pub files: usize,
    pub records: usize,
}

/// Runs the three batch tools. Each run is independent and the first
/// failure aborts it.
pub struct DocumentProcessor {
    config: Config,
    parser: DocxParser,
    writer: DocxWriter,
    annotator: SectionAnnotator,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl DocumentProcessor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parser: DocxParser,
            writer: DocxWriter,
            annotator: SectionAnnotator::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Prefix section markers in every body paragraph and save the result as
    /// `<parent of input folder>/<sections_dir>/<input file name>`.
    pub fn annotate_file<P: AsRef<Path>>(&self, input: P) -> Result<AnnotateReport> {
        let input_path = input.as_ref();
        info!("Annotating sections in: {}", input_path.display());

        let file_name = input_path
            .file_name()
            .ok_or_else(|| anyhow!("'{}' does not name a file", input_path.display()))?;

        let mut candidates = 0;
        let document = self.writer.rewrite_paragraphs(input_path, |text| {
            let annotated = self.annotator.annotate(text);
            if annotated.is_some() {
                candidates += 1;
                debug!("Section marker candidate: {:?}", text);
            }
            annotated
        })?;

        let output_dir = grandparent(input_path).join(&self.config.sections_dir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Cannot create '{}'", output_dir.display()))?;
        let output_path = output_dir.join(file_name);
        document.save(&output_path)?;

        info!(
            "Rewrote {} of {} candidate paragraphs into {}",
            document.rewritten,
            candidates,
            output_path.display()
        );

        Ok(AnnotateReport {
            output_path,
            candidates,
            rewritten: document.rewritten,
        })
    }

    /// Convert every document directly inside `folder` to a text file in
    /// `<parent of folder>/<text_dir>`. `on_converted` is called after each file.
    pub fn convert_folder<P, F>(&self, folder: P, mut on_converted: F) -> Result<ConvertReport>
    where
        P: AsRef<Path>,
        F: FnMut(&ConvertedFile),
    {
        let folder = folder.as_ref();
        info!("Converting documents in: {}", folder.display());

        let absolute = fs::canonicalize(folder)
            .with_context(|| format!("Failed to resolve folder '{}'", folder.display()))?;
        let output_dir = absolute.parent().unwrap_or(&absolute).join(&self.config.text_dir);
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Cannot create '{}'", output_dir.display()))?;
        debug!("Output directory prepared: {}", output_dir.display());

        let mut converted = Vec::new();
        for file_path in folder_entries(folder, self.config.sort_entries)? {
            if !has_suffix(&file_path, &self.config.docx_extension) || !file_path.is_file() {
                debug!("Skipping entry: {:?}", file_path.file_name());
                continue;
            }

            let converted_file = self.convert_file(&file_path, &output_dir)?;
            on_converted(&converted_file);
            converted.push(converted_file);
        }

        info!("Converted {} documents into {}", converted.len(), output_dir.display());
        Ok(ConvertReport {
            output_dir,
            converted,
        })
    }

    fn convert_file(&self, file_path: &Path, output_dir: &Path) -> Result<ConvertedFile> {
        let document = self.parser.parse(file_path)?;
        debug!(
            "Parsed {} paragraphs ({} headings, {} bytes) from {}",
            document.metadata.paragraph_count,
            document.heading_count(),
            document.metadata.file_size,
            document.metadata.file_path
        );

        let source_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output_name = PathBuf::from(&source_name)
            .with_extension(&self.config.text_extension)
            .to_string_lossy()
            .into_owned();
        let output_path = output_dir.join(&output_name);

        fs::write(&output_path, document.plain_text())
            .with_context(|| format!("Cannot write '{}'", output_path.display()))?;

        Ok(ConvertedFile {
            source_name,
            output_name,
            output_path,
        })
    }

    /// Merge every JSON record file directly inside `folder` into
    /// `<folder>/<csv_name>`.
    pub fn merge_folder<P: AsRef<Path>>(&self, folder: P) -> Result<MergeReport> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            return Err(ToolError::InvalidFolder(folder.to_path_buf()).into());
        }

        let files = find_json_files(folder, &self.config.json_extension, self.config.sort_entries)?;
        if files.is_empty() {
            return Err(ToolError::NoJsonFiles(folder.to_path_buf()).into());
        }
        info!("Merging {} JSON files from {}", files.len(), folder.display());

        // Everything is loaded before the CSV is created, so a bad file leaves no output.
        let records = load_records(&files)?;

        let output_path = folder.join(&self.config.csv_name);
        write_csv(&output_path, &records)?;
        info!("Wrote {} records to {}", records.len(), output_path.display());

        Ok(MergeReport {
            output_path,
            files: files.len(),
            records: records.len(),
        })
    }
}

/// Folder one level above the file's folder; falls back to the nearest
/// available ancestor for paths too short to have one.
fn grandparent(path: &Path) -> &Path {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    parent.parent().unwrap_or(parent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grandparent_of_nested_file() {
        assert_eq!(grandparent(Path::new("/data/in/doc.docx")), Path::new("/data"));
        assert_eq!(grandparent(Path::new("in/doc.docx")), Path::new(""));
        assert_eq!(grandparent(Path::new("doc.docx")), Path::new(""));
        assert_eq!(grandparent(Path::new("/doc.docx")), Path::new("/"));
    }

    #[test]
    fn merge_rejects_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentProcessor::default()
            .merge_folder(dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolError>(),
            Some(ToolError::InvalidFolder(_))
        ));
    }
}
