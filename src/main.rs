use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use docx_tools::config::Config;
use docx_tools::error::ToolError;
use docx_tools::utils::document_processor::DocumentProcessor;
use docx_tools::utils::source::{ArgSource, PromptSource, Selection, SourceResolver};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "docx-tools",
    version,
    about = "Batch utilities for Word documents and QA JSON files"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file overriding output names and listing order
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prefix section markers with "Section " and save the document under with_sections/
    Sections {
        /// Word document to annotate; prompted for when omitted
        file: Option<PathBuf>,
    },
    /// Convert every .docx in a folder to a .txt file under a sibling txt_files/ folder
    ToText {
        /// Folder containing .docx files; prompted for when omitted
        folder: Option<PathBuf>,
    },
    /// Merge all JSON record files in a folder into combined_data.csv
    MergeQa {
        /// Folder containing .json files; prompted for when omitted
        folder: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(err),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let processor = DocumentProcessor::new(config);

    match cli.command {
        Commands::Sections { file } => {
            let input = match select(file, "Select a Word file: ")? {
                Selection::Path(path) => path,
                Selection::None => return Err(ToolError::NoSelection("No file selected.").into()),
            };
            let report = processor.annotate_file(&input)?;
            println!("File saved as: {}", report.output_path.display());
        }
        Commands::ToText { folder } => {
            let folder = match select(folder, "Select folder containing DOCX files: ")? {
                Selection::Path(path) => path,
                Selection::None => {
                    return Err(ToolError::NoSelection("No folder was selected.").into())
                }
            };
            processor.convert_folder(&folder, |converted| {
                println!("Converted {} to {}", converted.source_name, converted.output_name);
            })?;
        }
        Commands::MergeQa { folder } => {
            // An empty answer is just another path that does not exist.
            let folder = match select(folder, "Enter the folder path containing JSON files: ")? {
                Selection::Path(path) => path,
                Selection::None => PathBuf::new(),
            };
            let report = processor.merge_folder(&folder)?;
            println!(
                "Data successfully combined and written to {}",
                report.output_path.display()
            );
        }
    }

    Ok(())
}

/// Use the command-line argument when given, otherwise ask on the console.
fn select(arg: Option<PathBuf>, prompt: &str) -> Result<Selection> {
    let mut source: Box<dyn SourceResolver> = match arg {
        Some(path) => Box::new(ArgSource::new(path)),
        None => Box::new(PromptSource::stdin(prompt)),
    };
    source.resolve()
}

fn report_error(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ToolError>() {
        Some(tool_error) => {
            println!("{tool_error}");
            if tool_error.is_graceful() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        None => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
