use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use survey_digest::config::{Config, PipelineKind, DEFAULT_TAG_COLUMN};
use survey_digest::ingestion::read_table;
use survey_digest::logging::init_logging;
use survey_digest::pipeline::{build_document, load_tables, SurveyBot};
use survey_digest::processing::tags::summarize_tags;
use survey_digest::processing::DocumentOptions;
use survey_digest::publish::spreadsheet::{processed_path, write_workbook};
use survey_digest::slack::InboundEvent;
use survey_digest::DigestResult;

#[derive(Parser, Debug)]
#[command(name = "survey-digest", version, about = "Turn survey exports into documents and tag summaries")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a message event payload (JSON) end to end.
    HandleEvent {
        /// Path to the event JSON.
        event: PathBuf,
        /// Override the configured pipeline (`document` or `tag-summary`).
        #[arg(long)]
        pipeline: Option<String>,
    },
    /// Print the document outline for local CSV files.
    Render {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Omit respondent signatures.
        #[arg(long)]
        anonymous: bool,
    },
    /// Write the tag summary workbook for a local CSV file.
    Summarize {
        file: PathBuf,
        #[arg(long, default_value = DEFAULT_TAG_COLUMN)]
        tag_column: String,
        /// Output path (defaults to `<stem>_processed.xlsx` next to the input).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "survey-digest failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> DigestResult<()> {
    match command {
        Command::HandleEvent { event, pipeline } => {
            let mut config = Config::from_env()?;
            if let Some(p) = pipeline {
                config.pipeline = p.parse::<PipelineKind>()?;
            }
            let event = InboundEvent::from_json(&fs::read_to_string(&event)?)?;
            let bot = SurveyBot::from_config(&config)?;
            let report = bot.handle_event(&event)?;
            for line in report.messages() {
                println!("{line}");
            }
            info!(
                downloaded = report.downloaded.len(),
                skipped = report.skipped.len(),
                cleaned = report.cleanup.removed.len(),
                "event handled"
            );
        }
        Command::Render { files, anonymous } => {
            let (tables, skipped) = load_tables(&files);
            for s in &skipped {
                eprintln!("skipped {}: {}", s.name, s.reason);
            }
            let doc = build_document(&tables, &DocumentOptions::anonymized(anonymous));
            print!("{}", doc.to_outline());
        }
        Command::Summarize {
            file,
            tag_column,
            output,
        } => {
            let table = read_table(&file)?;
            let summary = summarize_tags(&table, &tag_column)?;
            let out = output.unwrap_or_else(|| processed_path(&file));
            write_workbook(&summary.to_table(), &out)?;
            println!(
                "wrote {} ({} tags in {} categories)",
                out.display(),
                summary.total,
                summary.category_totals.len()
            );
        }
    }
    Ok(())
}
