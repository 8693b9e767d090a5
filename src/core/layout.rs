use crate::{Paragraph, ParagraphKind};

/// In-memory text of a parsed document, used by the text converter and the annotator.
#[derive(Debug, Clone, Default)]
pub struct DocumentText {
    pub paragraphs: Vec<Paragraph>,
    pub metadata: DocumentMetadata,
}

/// Additional metadata about the parsed document
#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    pub file_path: String,
    pub file_size: u64,
    pub paragraph_count: usize,
}

impl DocumentText {
    pub fn new(paragraphs: Vec<Paragraph>, file_path: String, file_size: u64) -> Self {
        let paragraph_count = paragraphs.len();
        Self {
            paragraphs,
            metadata: DocumentMetadata {
                file_path,
                file_size,
                paragraph_count,
            },
        }
    }

    /// Paragraph texts joined with `\n`. Empty paragraphs become empty lines
    /// and no trailing newline is added.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get a paragraph by its position in the body
    pub fn get_paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs.get(index)
    }

    pub fn heading_count(&self) -> usize {
        self.paragraphs
            .iter()
            .filter(|p| matches!(p.kind, ParagraphKind::Heading(_)))
            .count()
    }
}
