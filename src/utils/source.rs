use anyhow::Result;
use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::path::PathBuf;

/// What the user picked as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Path(PathBuf),
    None,
}

/// Supplies the input path of a run. Keeps prompting out of the pipelines.
pub trait SourceResolver {
    fn resolve(&mut self) -> Result<Selection>;
}

/// A path given up front, e.g. on the command line.
#[derive(Debug, Clone)]
pub struct ArgSource {
    path: PathBuf,
}

impl ArgSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourceResolver for ArgSource {
    fn resolve(&mut self) -> Result<Selection> {
        Ok(Selection::Path(self.path.clone()))
    }
}

/// Asks for a path on a line-oriented console. An empty answer or end of
/// input means nothing was selected.
pub struct PromptSource<R, W> {
    prompt: String,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSource<R, W> {
    pub fn new(prompt: impl Into<String>, input: R, output: W) -> Self {
        Self {
            prompt: prompt.into(),
            input,
            output,
        }
    }
}

impl PromptSource<StdinLock<'static>, Stdout> {
    pub fn stdin(prompt: impl Into<String>) -> Self {
        Self::new(prompt, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> SourceResolver for PromptSource<R, W> {
    fn resolve(&mut self) -> Result<Selection> {
        write!(self.output, "{}", self.prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        let answer = line.trim_end_matches(&['\r', '\n'][..]);
        if answer.is_empty() {
            return Ok(Selection::None);
        }
        Ok(Selection::Path(PathBuf::from(answer)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn prompt_reads_one_line_and_keeps_inner_spaces() {
        let mut output = Vec::new();
        let mut source = PromptSource::new(
            "Enter the folder path: ",
            Cursor::new("/data/my qa files\r\nignored\n"),
            &mut output,
        );
        assert_eq!(
            source.resolve().unwrap(),
            Selection::Path(PathBuf::from("/data/my qa files"))
        );
        drop(source);
        assert_eq!(String::from_utf8(output).unwrap(), "Enter the folder path: ");
    }

    #[test]
    fn empty_answer_or_eof_is_no_selection() {
        let mut empty = PromptSource::new("> ", Cursor::new("\n"), Vec::new());
        assert_eq!(empty.resolve().unwrap(), Selection::None);

        let mut eof = PromptSource::new("> ", Cursor::new(""), Vec::new());
        assert_eq!(eof.resolve().unwrap(), Selection::None);
    }

    #[test]
    fn arg_source_returns_its_path() {
        let mut source = ArgSource::new("in/report.docx");
        assert_eq!(
            source.resolve().unwrap(),
            Selection::Path(PathBuf::from("in/report.docx"))
        );
    }
}
