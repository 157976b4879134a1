use anyhow::Context;
use clap::{Parser, Subcommand};
use reframe::pipeline::{self, HttpServices, RunOptions, ServiceFactory, DEFAULT_QUERY};
use reframe::{FunctionalRewriter, Ranker, RetrievalConfig, Settings};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Synthetic corpus generation and dynamic few-shot prompting
#[derive(Parser, Debug)]
#[command(name = "reframe")]
#[command(about = "Generate a dysfunctional/functional corpus and build few-shot prompts", long_about = None)]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long, env = "REFRAME_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate records with every configured source and export them
    Generate,
    /// Rewrite exported source datasets into functional pairs
    Rewrite,
    /// Embed a pairs dataset and insert it into the store
    Index {
        /// Dataset to index (defaults to the combined dataset)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Build and save a few-shot prompt for a text
    Prompt {
        /// Text to transform
        #[arg(short, long)]
        text: Option<String>,

        /// Number of examples (defaults to retrieval.top_n)
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Generate, complete pairs and optionally index in one go
    Run {
        /// Rewrite every record, not only those missing functional text
        #[arg(long)]
        rewrite: bool,

        /// Embed and store the resulting pairs
        #[arg(long)]
        index: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // before parsing so `.env` can supply `REFRAME_CONFIG`
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Ok(path) = dotenv {
        info!("Loaded environment from {:?}", path);
    }

    info!("Starting reframe v{}", env!("CARGO_PKG_VERSION"));
    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    info!("Data directory: {:?}", settings.paths.data_dir);

    let services = HttpServices::new(&settings);

    match args.command {
        Command::Generate => {
            let runs = pipeline::generate_sources(&settings, &services)?;
            let combined = pipeline::export_runs(&settings.paths, &runs)?;
            let requested: usize = runs.iter().map(|r| r.output.requested()).sum();
            for run in &runs {
                for topic in run.output.aborted() {
                    info!("{}: no records for '{}'", run.source.model, topic.topic);
                }
            }
            info!("There are {} generated records, {} requested", combined.len(), requested);
        }
        Command::Rewrite => {
            let generator = services
                .generator(settings.rewrite.provider)
                .context("failed to create rewrite client")?;
            let rewriter = FunctionalRewriter::new(generator, &settings.rewrite);
            let pairs = pipeline::rewrite_dataset(&settings.paths, &settings.generation.sources, &rewriter)?;
            info!("Combined dataset has {} pairs", pairs.len());
        }
        Command::Index { input } => {
            let store = pipeline::open_store(&settings)?;
            let embedder = services.embedder().context("failed to create embedding client")?;
            let path = input.unwrap_or_else(|| settings.paths.dataset_paths(None).0);
            let ids = pipeline::index_file(embedder.as_ref(), &store, &path)?;
            info!("Inserted {} examples ({} in store)", ids.len(), store.count()?);
        }
        Command::Prompt { text, top_n } => {
            let text = text.unwrap_or_else(|| DEFAULT_QUERY.to_string());
            info!("This text will be added to the prompt:\n{}", text);
            let store = pipeline::open_store(&settings)?;
            let embedder = services.embedder().context("failed to create embedding client")?;
            let ranker = match top_n {
                Some(top_n) => Ranker::new(RetrievalConfig { top_n }),
                None => Ranker::new(settings.retrieval.clone()),
            };
            let (prompt, retrieved) =
                pipeline::build_fewshot_prompt(embedder.as_ref(), &store, &ranker, &text)?;
            for (pair, score) in retrieved.iter() {
                info!("{:.4} {}", score, pair.dysfunctional_text);
            }
            pipeline::save_prompt(&settings.paths.prompts_dir, &prompt)?;
        }
        Command::Run { rewrite, index } => {
            let summary = pipeline::run(&settings, RunOptions { rewrite, index }, &services)?;
            info!(
                "Generated {} of {} requested records ({} topics aborted), {} pairs, {} indexed",
                summary.generated,
                summary.requested,
                summary.aborted_topics,
                summary.pairs,
                summary.indexed
            );
        }
    }

    info!("ALL DONE!");
    Ok(())
}

