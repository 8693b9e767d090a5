use crate::utils::listing::{folder_entries, has_suffix};
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Column order of the merged CSV. Fixed, never derived from the input.
pub const CSV_HEADERS: [&str; 5] = ["question", "instruction", "answer", "metadata", "context"];

/// One question/answer training example. Every field is optional and keys
/// outside the five columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QaRecord {
    pub question: Option<Value>,
    pub instruction: Option<Value>,
    pub answer: Option<Value>,
    pub metadata: Option<Value>,
    pub context: Option<Value>,
}

impl QaRecord {
    /// CSV cells in `CSV_HEADERS` order; absent or null fields are empty.
    pub fn to_row(&self) -> [String; 5] {
        [
            &self.question,
            &self.instruction,
            &self.answer,
            &self.metadata,
            &self.context,
        ]
        .map(render_field)
    }
}

/// Strings verbatim, anything else as compact JSON.
fn render_field(value: &Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Regular files directly inside `folder` whose name ends with `extension`.
pub fn find_json_files(folder: &Path, extension: &str, sorted: bool) -> Result<Vec<PathBuf>> {
    Ok(folder_entries(folder, sorted)?
        .into_iter()
        .filter(|path| has_suffix(path, extension) && path.is_file())
        .collect())
}

/// Parse every file as a JSON array of records and concatenate them in file order.
/// The first malformed file aborts the whole load.
pub fn load_records(files: &[PathBuf]) -> Result<Vec<QaRecord>> {
    let mut all_records = Vec::new();
    for path in files {
        let file = File::open(path).with_context(|| format!("Cannot open '{}'", path.display()))?;
        let records: Vec<QaRecord> = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("'{}' is not a JSON array of records", path.display()))?;
        log::debug!("Loaded {} records from {}", records.len(), path.display());
        all_records.extend(records);
    }
    Ok(all_records)
}

pub fn write_csv(path: &Path, records: &[QaRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Cannot create '{}'", path.display()))?;
    write_csv_to(file, records).with_context(|| format!("Cannot write '{}'", path.display()))
}

/// Header plus one row per record, CRLF-terminated.
pub fn write_csv_to<W: Write>(writer: W, records: &[QaRecord]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADERS)?;
    for record in records {
        csv_writer.write_record(record.to_row())?;
    }
    csv_writer.flush()?;
    Ok(())
}
