use anyhow::{Context, Result};
use clap::Parser;
use retail_insights::agents::SchemaInferrer;
use retail_insights::ingestion::{load_dataframe, DatasetFormat};
use retail_insights::profiler::profile_dataframe;
use retail_insights::{AssistantConfig, DataAssistant, LlmClient, QueryExecutor};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "insights")]
#[command(about = "Ask questions about a retail dataset in plain English")]
struct Args {
    /// CSV, JSON or Parquet file to analyse
    dataset: PathBuf,

    /// Table name the dataset is registered under (or set INSIGHTS_TABLE)
    #[arg(long)]
    table: Option<String>,

    /// Where to write the inferred schema (or set INSIGHTS_SCHEMA_PATH)
    #[arg(long)]
    schema_out: Option<PathBuf>,

    /// OpenAI API key (or set OPENAI_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = AssistantConfig::from_env()
        .with_api_key(args.api_key)
        .with_model(args.model)
        .with_base_url(args.base_url)
        .with_table_name(args.table)
        .with_schema_path(args.schema_out);

    info!("🚀 Retail Insights starting...");
    info!("Dataset: {}", args.dataset.display());

    let format = DatasetFormat::detect(&args.dataset)?;
    let df = load_dataframe(&args.dataset, format)
        .with_context(|| format!("failed to load {}", args.dataset.display()))?;
    let profile = profile_dataframe(&df)?;
    info!("📊 Profiled {} rows x {} columns", profile.row_count, profile.columns.len());

    let model = Arc::new(LlmClient::from_config(&config.llm)?);
    info!("🤖 Using model {}", model.model());

    let schema = SchemaInferrer::new(model.clone()).infer(&profile).await?;
    schema.save_pretty(&config.schema_path)?;
    info!("💾 Schema saved to {}", config.schema_path.display());

    println!("\n=== Semantic Schema ===");
    println!("{}", serde_json::to_string_pretty(&schema)?);

    let executor = QueryExecutor::open_in_memory()?;
    executor.register_dataset(&config.table_name, &args.dataset, format)?;

    let mut assistant = DataAssistant::new(schema, executor, config.table_name.clone(), model);

    println!("\nAsk a question (type 'exit' to quit)");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("\nUser: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let question = line?;
        let question = question.trim();

        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match assistant.ask(question).await {
            Ok(reply) => println!("\nAssistant: {}", reply.answer),
            Err(e) => {
                error!("Turn failed: {}", e);
                println!("\nAssistant: Sorry, I could not answer that ({})", e);
            }
        }
    }

    info!("👋 Bye");
    Ok(())
}
