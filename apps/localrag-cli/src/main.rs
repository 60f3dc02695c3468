use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use localrag_core::config::{env_name, resolve_with_base, Config, Settings};
use localrag_core::loader::TextLoader;
use localrag_core::traits::DocumentLoader;
use localrag_core::{Chunker, QueryResult};
use localrag_embed::embedder_from_settings;
use localrag_pipeline::prompt::source_label;
use localrag_pipeline::{Responder, RetrievalPipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "localrag", about = "Ask questions about a folder of documents")]
struct Cli {
    /// Directory holding config.toml and config.<env>.toml (default: current dir)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Show a progress bar while embedding chunks
    #[arg(long, global = true)]
    progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve passages and compose an answer
    Ask {
        question: String,
        #[command(flatten)]
        opts: RetrieveArgs,
    },
    /// Retrieve passages only
    Search {
        question: String,
        #[command(flatten)]
        opts: RetrieveArgs,
    },
    /// Print the chunk boundaries of one file
    Chunks {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct RetrieveArgs {
    /// Document directory (overrides data.docs_dir)
    #[arg(long)]
    docs: Option<PathBuf>,
    /// Number of passages to retrieve (overrides retrieval.top_k)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config_dir {
        Some(dir) => Config::load_from(dir, &env_name()),
        None => Config::load(),
    };
    let config_dir = cli.config_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut settings = config.settings().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;

    match cli.command {
        Commands::Ask { question, opts } => {
            let result = retrieve(&mut settings, &config_dir, &opts, cli.progress, &question).await?;
            let responder = Responder::from_settings(&settings.generation)?;
            let answer = responder.respond(&question, result).await;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("\n💬 Answer:\n{}\n", answer.text);
                print_sources(&answer.result);
            }
        }
        Commands::Search { question, opts } => {
            let result = retrieve(&mut settings, &config_dir, &opts, cli.progress, &question).await?;
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_sources(&result);
            }
        }
        Commands::Chunks { file, json } => print_chunks(&settings, &file, json)?,
    }
    Ok(())
}

async fn retrieve(
    settings: &mut Settings,
    config_dir: &Path,
    opts: &RetrieveArgs,
    progress: bool,
    question: &str,
) -> anyhow::Result<QueryResult> {
    if let Some(k) = opts.top_k {
        settings.retrieval.top_k = k;
    }
    let docs_dir = opts.docs.clone().unwrap_or_else(|| resolve_with_base(config_dir, &settings.data.docs_dir));
    let documents = TextLoader::new(&docs_dir).load_all()?;

    let embedder = embedder_from_settings(&settings.embedding)?;
    tracing::info!(embedder = embedder.id(), "indexing {} documents from {}", documents.len(), docs_dir.display());
    let mut pipeline = RetrievalPipeline::from_settings(settings, embedder)?.with_progress(progress);
    pipeline
        .ingest(&documents)
        .await
        .with_context(|| format!("nothing to index under {}", docs_dir.display()))?;

    Ok(pipeline.query(question).await?)
}

fn print_sources(result: &QueryResult) {
    match &result.fallback_reason {
        Some(reason) => println!("📚 Sources (retrieved via {}: {reason}):", result.path),
        None => println!("📚 Sources (retrieved via {}):", result.path),
    }
    if result.is_empty() {
        println!("  (none)");
    }
    for (i, p) in result.iter().enumerate() {
        let preview: String = p.chunk.text.chars().take(150).collect();
        println!("\n  {}  score={:.3}", source_label(i + 1, p), p.score);
        println!("     📝 {}", preview.replace('\n', " "));
    }
}

fn print_chunks(settings: &Settings, file: &Path, json: bool) -> anyhow::Result<()> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let document = TextLoader::new(dir).load(file)?;
    let chunks = Chunker::new(settings.chunking)?.split(&document);
    if json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
        return Ok(());
    }
    println!(
        "{}: {} chunks (size {}, overlap {})",
        document.id,
        chunks.len(),
        settings.chunking.chunk_size,
        settings.chunking.overlap
    );
    for chunk in &chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!("  {:>4}  chars {}..{}  {:?}", chunk.index, chunk.span.start, chunk.span.end, preview);
    }
    Ok(())
}
