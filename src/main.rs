use anyhow::Context;
use clap::{Parser, Subcommand};
use pubmed_agent::{Config, PubMedAssistant, TaskOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pubmed-agent", version, about = "Resilient PubMed research agent")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search PubMed and print the matching PMIDs.
    Search {
        query: String,
        /// Keep at most this many results.
        #[arg(long, default_value_t = 10)]
        topk: usize,
    },
    /// Fetch details for a single article.
    Article { pmid: String },
    /// Fetch details for many articles concurrently.
    Batch { pmids: Vec<String> },
    /// Translate text through the configured backend.
    Translate {
        text: String,
        #[arg(long)]
        target_lang: Option<String>,
    },
    /// List the registered tools.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let assistant =
        PubMedAssistant::new("pubmed-assistant", &config).context("failed to build agent")?;

    match cli.command {
        Command::Search { query, topk } => {
            let pmids = assistant.search(&query, topk).await?;
            println!("{}", serde_json::to_string_pretty(&pmids)?);
        }
        Command::Article { pmid } => {
            let article = assistant.article_details(&pmid).await?;
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
        Command::Batch { pmids } => {
            let outcomes = assistant.batch_article_outcomes(&pmids).await?;
            let mut articles = Vec::new();
            for (pmid, outcome) in pmids.iter().zip(&outcomes) {
                match outcome {
                    TaskOutcome::Success(article) => articles.push(article.clone()),
                    TaskOutcome::Failure(failure) => {
                        eprintln!("PMID {pmid}: {}", failure.message);
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
        Command::Translate { text, target_lang } => {
            let translation = assistant.translate(&text, target_lang.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&translation)?);
        }
        Command::Tools => {
            let mut names: Vec<&str> = assistant.agent().tool_names();
            names.sort_unstable();
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}
