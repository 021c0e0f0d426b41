use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

mod ai;
mod config;
mod db;
mod error;
mod ingest;
mod models;
mod services;

use ai::{BasicSummarizer, EnrichedSummarizer, OpenAiClient, Summarize};
use config::Config;
use db::{HeadlineStore, Repository};
use error::{AppError, Result};
use ingest::IngestPipeline;
use services::ContentFetcher;

/// One entry of an ingest input file: a JSON array of these.
#[derive(Debug, Deserialize)]
struct HeadlinePair {
    title: String,
    url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let config = Config::load()?;
    let repository = Repository::new(&config.db_path).await?;

    if args.iter().any(|a| a == "--count") {
        let count = repository.count_headlines().await?;
        println!("{} headlines stored", count);
        return Ok(());
    }

    if args.iter().any(|a| a == "--today") {
        let today = Utc::now().date_naive();
        let headlines = repository.headlines_for_date(today).await?;
        for h in &headlines {
            println!(
                "[{}] {} ({}) quality={}",
                h.source,
                h.title,
                h.category.as_deref().unwrap_or("-"),
                h.quality.as_str()
            );
        }
        println!("{} headlines collected today", headlines.len());
        return Ok(());
    }

    let (Some(file), Some(source)) = (
        flag_value(&args, "--ingest"),
        flag_value(&args, "--source"),
    ) else {
        print_usage();
        return Ok(());
    };
    let default_category = flag_value(&args, "--category");

    let pairs = read_pairs(Path::new(file))?;
    println!("Ingesting {} headlines from {}", pairs.len(), source);

    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| AppError::Config("openai_api_key is not set".to_string()))?;
    let client = Arc::new(OpenAiClient::new(api_key, config.openai_model.clone()));
    let summarizer = select_summarizer(&config, client);

    let store: Arc<dyn HeadlineStore> = Arc::new(repository);
    let pipeline = IngestPipeline::new(store, Arc::new(ContentFetcher::new()), summarizer)
        .with_batch_size(config.commit_batch_size);

    let report = pipeline
        .ingest(source, &pairs, default_category.map(|c| c.as_str()))
        .await;

    println!(
        "Done: {} inserted, {} skipped, {} degraded",
        report.inserted, report.skipped, report.degraded
    );
    if let Some(reason) = &report.aborted {
        println!("Aborted early: {}", reason);
    }

    Ok(())
}

/// The variant choice is made once per process, here at startup.
fn select_summarizer(config: &Config, client: Arc<OpenAiClient>) -> Arc<dyn Summarize> {
    match config.summarizer.as_str() {
        "enriched" => Arc::new(EnrichedSummarizer::new(
            client,
            config.summary_max_chars,
            config.comment_max_chars,
        )),
        "basic" => Arc::new(BasicSummarizer::new(client, config.summary_max_chars)),
        other => {
            tracing::warn!("Unknown summarizer {:?}, falling back to basic", other);
            Arc::new(BasicSummarizer::new(client, config.summary_max_chars))
        }
    }
}

fn read_pairs(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path)?;
    let pairs: Vec<HeadlinePair> = serde_json::from_str(&content)?;
    Ok(pairs.into_iter().map(|p| (p.title, p.url)).collect())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
}

fn print_usage() {
    println!("Usage:");
    println!("  newswire --ingest FILE --source NAME [--category CAT]");
    println!("           FILE is a JSON array of {{\"title\", \"url\"}} objects");
    println!("  newswire --count        total stored headlines");
    println!("  newswire --today        headlines collected today");
}
