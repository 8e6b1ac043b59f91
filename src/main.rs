use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wayfind_core::config::AppConfig;
use wayfind_core::traits::CompletionClient;
use wayfind_core::types::RunInput;
use wayfind_llm::RetryingClient;
use wayfind_pipeline::state::RunState;
use wayfind_pipeline::{builtin, Pipeline};
use wayfind_retrieval::{load_jsonl, HttpEmbeddingProvider, SqliteIndex};

#[derive(Parser)]
#[command(name = "wayfind", version, about = "Intent-routed LLM pipeline runner")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "wayfind.toml")]
    config: PathBuf,

    /// Print the run trace after the result
    #[arg(long, global = true)]
    show_trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question through the QA pipeline
    Ask {
        /// The question to answer
        #[arg(trailing_var_arg = true)]
        question: Vec<String>,
    },
    /// Route a text-processing task (summarize, bullet points, sentiment)
    Route {
        /// What to do with the text
        #[arg(short, long)]
        instruction: String,
        /// File to read the text from (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Load a JSONL corpus into the retrieval index
    Index {
        /// Path to the corpus file ({"text": ..., "source": ...} per line)
        path: PathBuf,
        /// Maximum number of records to load
        #[arg(long, default_value_t = 500)]
        limit: usize,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wayfind=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Ask { question } => {
            let question = question.join(" ");
            if question.trim().is_empty() {
                anyhow::bail!("no question given");
            }

            let completion = build_completion(&config);
            let index = open_index(&config)?;
            let pipeline = Pipeline::new(builtin::qa(), config.model.clone(), completion)?
                .with_search(index, config.retrieval.top_k)
                .with_gate(config.gate.clone());

            let state = pipeline.run_to_state(RunInput::new(question)).await?;
            print_result(&state, cli.show_trace)?;
        }
        Commands::Route { instruction, file } => {
            let text = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            if text.trim().is_empty() {
                anyhow::bail!("no input text given");
            }

            let completion = build_completion(&config);
            let pipeline = Pipeline::new(builtin::tasks(), config.model.clone(), completion)?;

            let input = RunInput::new(text.trim_end()).with_instruction(instruction);
            let state = pipeline.run_to_state(input).await?;
            print_result(&state, cli.show_trace)?;
        }
        Commands::Index { path, limit } => {
            let docs = load_jsonl(&path, limit)?;
            if docs.is_empty() {
                anyhow::bail!("no documents found in {}", path.display());
            }

            let index = open_index(&config)?;
            let stored = index.add_documents(&docs).await?;
            let total = index.document_count()?;
            info!(stored, total, "Corpus indexed");
            println!("Indexed {} documents ({} total in index)", stored, total);
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Wrap the configured primary model (plus any fallbacks) in the retrying
/// client. This is the one completion handle every pipeline shares.
fn build_completion(config: &AppConfig) -> Arc<dyn CompletionClient> {
    let primary = wayfind_llm::create_client(&config.model);
    let fallbacks = config
        .fallback_models
        .iter()
        .map(|m| (m.clone(), wayfind_llm::create_client(m)))
        .collect();
    let retry = config.model.retry.clone().unwrap_or_default();
    Arc::new(RetryingClient::new(primary, fallbacks, retry))
}

fn open_index(config: &AppConfig) -> anyhow::Result<Arc<SqliteIndex>> {
    let embeddings = Arc::new(HttpEmbeddingProvider::new(&config.retrieval.embedding));
    let index = SqliteIndex::open(Path::new(&config.retrieval.db_path), embeddings)
        .with_context(|| format!("opening index {}", config.retrieval.db_path))?;
    Ok(Arc::new(index))
}

fn print_result(state: &RunState, show_trace: bool) -> anyhow::Result<()> {
    let output = state
        .final_output
        .as_deref()
        .context("run produced no output")?;
    println!("{}", output);

    if show_trace {
        println!("\n--- trace ---");
        println!("{}", serde_json::to_string_pretty(&state.trace)?);
    }

    Ok(())
}
