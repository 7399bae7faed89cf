mod browser;
mod intermediate;
mod listing;
mod pipeline;
mod prompt;
mod records;
mod report;
mod settings;
mod summary;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use browser::BrowserSession;
use records::Record;
use settings::Settings;
use summary::{BrowserSummarizer, SummarizerEndpoint};

#[derive(Parser)]
#[command(
    name = "hn_summarizer",
    about = "Hacker News top articles, optionally with AI summaries, as a spreadsheet"
)]
struct Cli {
    /// Settings file (default: ./hn_summarizer.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the front page, then build the summarized report if asked to
    Run {
        /// Summarize without asking
        #[arg(long, conflicts_with = "no_summaries")]
        summaries: bool,
        /// Only write the intermediate file, without asking
        #[arg(long)]
        no_summaries: bool,
    },
    /// Scrape the front page into the intermediate file only
    Scrape,
    /// Summarize articles from an existing intermediate file and write the report
    Report {
        /// Intermediate file to read (default: csv_path from settings)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Run {
            summaries,
            no_summaries,
        } => {
            let summarize = if summaries {
                true
            } else if no_summaries {
                false
            } else {
                prompt::ask_summaries().context("Failed to read answer")?
            };

            let mut session = BrowserSession::launch(settings.headless).await?;
            let outcome = run(&mut session, &settings, summarize).await;
            close_session(session).await;
            outcome
        }
        Commands::Scrape => {
            let mut session = BrowserSession::launch(settings.headless).await?;
            let outcome = run(&mut session, &settings, false).await;
            close_session(session).await;
            outcome
        }
        Commands::Report { input } => {
            let input = input.unwrap_or_else(|| settings.csv_path.clone());
            let records = intermediate::read_records(&input)
                .with_context(|| format!("Failed to load articles from {}", input.display()))?;
            println!("Loaded {} articles from {}", records.len(), input.display());

            let mut session = BrowserSession::launch(settings.headless).await?;
            let outcome = summarize_to_report(&mut session, &settings, records, &input).await;
            close_session(session).await;
            outcome
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(session: &mut BrowserSession, settings: &Settings, summarize: bool) -> Result<()> {
    let records = listing::scrape_listing(session, &settings.listing_url, settings.article_count)
        .await
        .context("Failed to scrape listing")?;
    intermediate::write_records(&settings.csv_path, &records)
        .context("Failed to write intermediate file")?;

    if !summarize {
        println!("CSV file created successfully! ({})", settings.csv_path.display());
        return Ok(());
    }
    summarize_to_report(session, settings, records, &settings.csv_path).await
}

async fn summarize_to_report(
    session: &mut BrowserSession,
    settings: &Settings,
    records: Vec<Record>,
    intermediate: &Path,
) -> Result<()> {
    println!("AI Summaries powered by SummarAIse\u{2122}!");
    println!("For more information, visit: {}", settings.summarizer_url);

    let pb = pipeline::progress_bar(records.len());
    let mut summarizer =
        BrowserSummarizer::new(session, SummarizerEndpoint::from_settings(settings));
    let report = pipeline::run(&mut summarizer, records, settings, Some(intermediate), pb)
        .await
        .context("Error writing Excel file")?;

    println!(
        "Excel file and AI Summaries created successfully! {} rows ({} without summary) -> {}",
        report.rows,
        report.fallbacks,
        report.path.display()
    );
    Ok(())
}

async fn close_session(session: BrowserSession) {
    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn duration_formats() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn cli_flags_conflict() {
        assert!(Cli::try_parse_from(["hn_summarizer", "run", "--summaries", "--no-summaries"]).is_err());
        assert!(Cli::try_parse_from(["hn_summarizer", "report", "-i", "a.csv"]).is_ok());
    }
}
