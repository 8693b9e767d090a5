use crate::core::parser::{read_document_xml, run_symbol, DOCUMENT_XML};
use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer as XmlWriter};
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::ops::Range;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Writer re-serializes a .docx package with edited paragraph texts.
pub trait Writer {
    /// Rebuild `original` in memory, replacing the text of every body paragraph
    /// for which `edit` returns a different string. The original file is not modified.
    fn rewrite_paragraphs<P, F>(&self, original: P, edit: F) -> Result<RewrittenDocument>
    where
        P: AsRef<Path>,
        F: FnMut(&str) -> Option<String>;
}

/// A re-serialized package ready to be saved.
#[derive(Debug, Clone)]
pub struct RewrittenDocument {
    pub bytes: Vec<u8>,
    pub rewritten: usize,
}

impl RewrittenDocument {
    pub fn save<P: AsRef<Path>>(&self, out_path: P) -> Result<()> {
        let output_path = out_path.as_ref();
        fs::write(output_path, &self.bytes)
            .with_context(|| format!("Cannot write '{}'", output_path.display()))
    }
}

/// DocxWriter streams `word/document.xml` through quick-xml and raw-copies every
/// other package part.
///
/// A rewritten paragraph keeps its `w:pPr` and receives a single run carrying
/// the `w:rPr` of its first run. Paragraphs left alone are written back byte for byte.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter;

impl Writer for DocxWriter {
    fn rewrite_paragraphs<P, F>(&self, original: P, mut edit: F) -> Result<RewrittenDocument>
    where
        P: AsRef<Path>,
        F: FnMut(&str) -> Option<String>,
    {
        let original_path = original.as_ref();

        let file = File::open(original_path)
            .with_context(|| format!("Cannot open '{}'", original_path.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("'{}' is not a Word document", original_path.display()))?;

        let doc_xml = read_document_xml(&mut archive)
            .with_context(|| format!("Cannot read document body of '{}'", original_path.display()))?;
        let (new_doc_xml, rewritten) = self
            .rewrite_document_xml(&doc_xml, &mut edit)
            .with_context(|| format!("Malformed document body in '{}'", original_path.display()))?;

        // Assembled in memory: the output may replace the input file.
        let mut zip_writer = ZipWriter::new(Cursor::new(Vec::new()));
        for i in 0..archive.len() {
            let entry = archive.by_index(i)?;
            if entry.name() == DOCUMENT_XML {
                let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
                zip_writer.start_file(DOCUMENT_XML, options)?;
                zip_writer.write_all(new_doc_xml.as_bytes())?;
            } else {
                zip_writer.raw_copy_file(entry)?;
            }
        }
        let bytes = zip_writer.finish()?.into_inner();

        Ok(RewrittenDocument { bytes, rewritten })
    }
}

impl DocxWriter {
    /// Rewrite the body paragraphs of a `word/document.xml` string.
    pub fn rewrite_document_xml<F>(&self, xml: &str, edit: &mut F) -> Result<(String, usize)>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut reader = Reader::from_str(xml);
        let mut writer = XmlWriter::new(Vec::new());
        let mut open_elements: Vec<Vec<u8>> = Vec::new();
        let mut rewritten = 0;

        loop {
            let in_body = open_elements.last().map(Vec::as_slice) == Some(b"body".as_slice());
            match reader.read_event()? {
                Event::Eof => break,
                Event::Start(e) if in_body && e.local_name().as_ref() == b"p" => {
                    let paragraph = BufferedParagraph::collect(&mut reader, e)?;
                    if paragraph.emit(&mut writer, edit)? {
                        rewritten += 1;
                    }
                }
                Event::Empty(e) if in_body && e.local_name().as_ref() == b"p" => {
                    let paragraph = BufferedParagraph::empty(e);
                    if paragraph.emit(&mut writer, edit)? {
                        rewritten += 1;
                    }
                }
                Event::Start(e) => {
                    open_elements.push(e.local_name().as_ref().to_vec());
                    writer.write_event(Event::Start(e))?;
                }
                Event::End(e) => {
                    open_elements.pop();
                    writer.write_event(Event::End(e))?;
                }
                other => writer.write_event(other)?,
            }
        }

        let xml = String::from_utf8(writer.into_inner())?;
        Ok((xml, rewritten))
    }
}

/// A body paragraph held in memory between its start and end tags.
struct BufferedParagraph<'a> {
    start: BytesStart<'a>,
    content: Vec<Event<'a>>,
    end: Option<BytesEnd<'a>>,
}

impl<'a> BufferedParagraph<'a> {
    fn empty(start: BytesStart<'a>) -> Self {
        Self {
            start,
            content: Vec::new(),
            end: None,
        }
    }

    fn collect(reader: &mut Reader<&'a [u8]>, start: BytesStart<'a>) -> Result<Self> {
        let mut content = Vec::new();
        let mut depth = 0usize;
        loop {
            let event = reader.read_event()?;
            match event {
                Event::Start(_) => depth += 1,
                Event::End(e) if depth == 0 => {
                    return Ok(Self {
                        start,
                        content,
                        end: Some(e),
                    })
                }
                Event::End(_) => depth -= 1,
                Event::Eof => bail!("document ended inside a paragraph"),
                _ => {}
            }
            content.push(event);
        }
    }

    /// Paragraph text with the same run rules as the parser.
    fn text(&self) -> Result<String> {
        let mut text = String::new();
        let mut open: Vec<Vec<u8>> = Vec::new();

        for event in &self.content {
            match event {
                Event::Start(e) => {
                    if is_run_path(&open) {
                        push_symbol(e, &mut text)?;
                    }
                    open.push(e.local_name().as_ref().to_vec());
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Empty(e) if is_run_path(&open) => push_symbol(e, &mut text)?,
                Event::Text(t) if is_text_path(&open) => text.push_str(&t.unescape()?),
                Event::CData(c) if is_text_path(&open) => text.push_str(std::str::from_utf8(c)?),
                _ => {}
            }
        }

        Ok(text)
    }

    /// Write the paragraph, edited or not. Returns whether its text changed.
    fn emit<W, F>(self, writer: &mut XmlWriter<W>, edit: &mut F) -> Result<bool>
    where
        W: Write,
        F: FnMut(&str) -> Option<String>,
    {
        let current = self.text()?;
        match edit(&current).filter(|new_text| *new_text != current) {
            Some(new_text) => {
                self.write_replaced(writer, &new_text)?;
                Ok(true)
            }
            None => {
                self.write_unchanged(writer)?;
                Ok(false)
            }
        }
    }

    fn write_unchanged<W: Write>(self, writer: &mut XmlWriter<W>) -> Result<()> {
        match self.end {
            Some(end) => {
                writer.write_event(Event::Start(self.start))?;
                for event in self.content {
                    writer.write_event(event)?;
                }
                writer.write_event(Event::End(end))?;
            }
            None => writer.write_event(Event::Empty(self.start))?,
        }
        Ok(())
    }

    fn write_replaced<W: Write>(&self, writer: &mut XmlWriter<W>, new_text: &str) -> Result<()> {
        let prefix = self
            .start
            .name()
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());
        let qualified = |local: &str| match &prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        };

        let children = child_elements(&self.content);
        let paragraph_props = children
            .iter()
            .find(|range| is_element(&self.content[range.start], b"pPr"));
        let run_props = children
            .iter()
            .find(|range| is_element(&self.content[range.start], b"r"))
            .and_then(|run| {
                let run_events = &self.content[run.clone()];
                if run_events.len() < 2 {
                    return None;
                }
                let inner = &run_events[1..run_events.len() - 1];
                child_elements(inner)
                    .into_iter()
                    .find(|range| is_element(&inner[range.start], b"rPr"))
                    .map(|range| &inner[range])
            });

        writer.write_event(Event::Start(self.start.borrow()))?;
        if let Some(range) = paragraph_props {
            for event in &self.content[range.clone()] {
                writer.write_event(event)?;
            }
        }

        let run_name = qualified("r");
        writer.write_event(Event::Start(BytesStart::new(run_name.as_str())))?;
        if let Some(events) = run_props {
            for event in events {
                writer.write_event(event)?;
            }
        }
        write_run_content(writer, new_text, &qualified)?;
        writer.write_event(Event::End(BytesEnd::new(run_name.as_str())))?;

        let paragraph_name = String::from_utf8_lossy(self.start.name().as_ref()).into_owned();
        writer.write_event(Event::End(BytesEnd::new(paragraph_name)))?;
        Ok(())
    }
}

/// Emit text as `w:t` pieces, with tabs and line breaks as their own elements.
fn write_run_content<W, N>(writer: &mut XmlWriter<W>, text: &str, qualified: &N) -> Result<()>
where
    W: Write,
    N: Fn(&str) -> String,
{
    let text_name = qualified("t");
    let mut pending = String::new();

    let flush = |writer: &mut XmlWriter<W>, pending: &mut String| -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let start = BytesStart::new(text_name.as_str()).with_attributes([("xml:space", "preserve")]);
        writer.write_event(Event::Start(start))?;
        writer.write_event(Event::Text(BytesText::new(pending.as_str())))?;
        writer.write_event(Event::End(BytesEnd::new(text_name.as_str())))?;
        pending.clear();
        Ok(())
    };

    for ch in text.chars() {
        let element = match ch {
            '\t' => Some("tab"),
            '\n' | '\r' => Some("br"),
            _ => None,
        };
        match element {
            Some(local) => {
                flush(writer, &mut pending)?;
                writer.write_event(Event::Empty(BytesStart::new(qualified(local))))?;
            }
            None => pending.push(ch),
        }
    }
    flush(writer, &mut pending)
}

fn push_symbol(element: &BytesStart, out: &mut String) -> Result<()> {
    let local_name = element.local_name();
    let name = std::str::from_utf8(local_name.as_ref())?;
    let break_type = element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .map(|attr| attr.unescape_value().map(|v| v.into_owned()))
        .transpose()?;
    if let Some(symbol) = run_symbol(name, break_type.as_deref()) {
        out.push_str(symbol);
    }
    Ok(())
}

/// Inside a run that belongs to the paragraph (directly or via a hyperlink).
fn is_run_path(open: &[Vec<u8>]) -> bool {
    match open {
        [r] => r == b"r",
        [h, r] => h == b"hyperlink" && r == b"r",
        _ => false,
    }
}

fn is_text_path(open: &[Vec<u8>]) -> bool {
    match open.split_last() {
        Some((t, run_path)) => t == b"t" && is_run_path(run_path),
        None => false,
    }
}

fn is_element(event: &Event, local: &[u8]) -> bool {
    match event {
        Event::Start(e) | Event::Empty(e) => e.local_name().as_ref() == local,
        _ => false,
    }
}

/// Event ranges of the top-level elements in `events`.
fn child_elements(events: &[Event]) -> Vec<Range<usize>> {
    let mut children = Vec::new();
    let mut depth = 0usize;
    let mut open_at = 0usize;
    for (i, event) in events.iter().enumerate() {
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    open_at = i;
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    children.push(open_at..i + 1);
                }
            }
            Event::Empty(_) if depth == 0 => children.push(i..i + 1),
            _ => {}
        }
    }
    children
}
