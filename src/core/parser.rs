use crate::core::layout::DocumentText;
use crate::{Paragraph, ParagraphKind};
use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DOCUMENT_XML: &str = "word/document.xml";

/// Outline level 9 is Word's "body text" level.
const BODY_OUTLINE_LEVEL: u8 = 9;

pub trait Parser {
    /// Parse a document on disk and return its body paragraphs
    fn parse<P: AsRef<Path>>(&self, path: P) -> Result<DocumentText>;
}

/// DocxParser: extracts the body paragraphs of `word/document.xml` using roxmltree.
///
/// Only `w:p` elements that are direct children of `w:body` count as paragraphs;
/// table cells, headers, footers and text boxes are not part of the paragraph list.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxParser;

impl Parser for DocxParser {
    fn parse<P: AsRef<Path>>(&self, path: P) -> Result<DocumentText> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
        let file_size = file.metadata()?.len();

        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("'{}' is not a Word document", path.display()))?;
        let doc_xml = read_document_xml(&mut archive)
            .with_context(|| format!("Cannot read document body of '{}'", path.display()))?;

        let paragraphs = self
            .parse_document_xml(&doc_xml)
            .with_context(|| format!("Malformed document body in '{}'", path.display()))?;

        Ok(DocumentText::new(
            paragraphs,
            path.to_string_lossy().to_string(),
            file_size,
        ))
    }
}

impl DocxParser {
    /// Parse the content of `word/document.xml` into body paragraphs
    pub fn parse_document_xml(&self, xml: &str) -> Result<Vec<Paragraph>> {
        let doc = Document::parse(xml.strip_prefix('\u{feff}').unwrap_or(xml))?;
        let body = doc
            .root_element()
            .children()
            .find(|n| is_element_named(n, "body"))
            .ok_or_else(|| anyhow!("document has no w:body element"))?;

        let paragraphs = body
            .children()
            .filter(|n| is_element_named(n, "p"))
            .enumerate()
            .map(|(index, p_node)| Paragraph {
                index,
                kind: self.determine_kind(p_node),
                text: paragraph_text(p_node),
            })
            .collect();

        Ok(paragraphs)
    }

    /// Determine paragraph kind from outline level or a `Heading*` style
    fn determine_kind(&self, p_node: Node) -> ParagraphKind {
        let Some(p_pr) = p_node.children().find(|n| is_element_named(n, "pPr")) else {
            return ParagraphKind::Body;
        };

        let outline_level = p_pr
            .children()
            .find(|n| is_element_named(n, "outlineLvl"))
            .and_then(|n| n.attribute((W_NS, "val")))
            .and_then(|v| v.parse::<u8>().ok());
        if let Some(level) = outline_level {
            if level < BODY_OUTLINE_LEVEL {
                return ParagraphKind::Heading(level + 1);
            }
        }

        let style = p_pr
            .children()
            .find(|n| is_element_named(n, "pStyle"))
            .and_then(|n| n.attribute((W_NS, "val")));
        if let Some(rest) = style.and_then(|s| s.strip_prefix("Heading")) {
            return ParagraphKind::Heading(rest.parse::<u8>().unwrap_or(1));
        }

        ParagraphKind::Body
    }
}

pub(crate) fn read_document_xml<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let mut doc_xml = String::new();
    archive.by_name(DOCUMENT_XML)?.read_to_string(&mut doc_xml)?;
    Ok(doc_xml)
}

/// Text of a paragraph: its runs, including runs wrapped in hyperlinks.
pub(crate) fn paragraph_text(p_node: Node) -> String {
    let mut text = String::new();
    for child in p_node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "r" => push_run_text(child, &mut text),
            "hyperlink" => {
                for run in child.children().filter(|n| is_element_named(n, "r")) {
                    push_run_text(run, &mut text);
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(run: Node, out: &mut String) {
    for child in run.children().filter(|n| n.is_element()) {
        let name = child.tag_name().name();
        if name == "t" {
            if let Some(txt) = child.text() {
                out.push_str(txt);
            }
        } else if let Some(symbol) = run_symbol(name, child.attribute((W_NS, "type"))) {
            out.push_str(symbol);
        }
    }
}

/// Text contributed by a non-`w:t` run child.
pub(crate) fn run_symbol(local_name: &str, break_type: Option<&str>) -> Option<&'static str> {
    match local_name {
        "tab" => Some("\t"),
        "br" => match break_type {
            None | Some("textWrapping") => Some("\n"),
            _ => None,
        },
        "cr" => Some("\n"),
        "noBreakHyphen" => Some("-"),
        _ => None,
    }
}

fn is_element_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}
