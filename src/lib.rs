pub mod core {
    pub mod layout;
    pub mod parser;
    pub mod qa;
    pub mod section;
    pub mod writer;
}

pub mod utils {
    pub mod document_processor;
    pub mod listing;
    pub mod source;
}

pub mod config;
pub mod error;

/// A body paragraph of a Word document, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub index: usize,
    pub kind: ParagraphKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
    Heading(u8),
    Body,
}
