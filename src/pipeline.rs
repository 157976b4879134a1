//! Programmatic driver for the full corpus pipeline.
//!
//! generate (per source) -> export -> rewrite -> combine -> index, plus the
//! retrieval side: embed a query, rank the stored corpus, assemble and save
//! a few-shot prompt. Every step takes its inputs explicitly; nothing here
//! prompts the user.

use anyhow::{Context, Result};
use chrono::Local;
use reframe_core::{
    Embedder, ExampleId, ExamplePair, GeneratedRecord, NewExample, PathsConfig, ProviderKind,
    RetrievalResult, Settings, SourceConfig, TextGenerator, Vector,
};
use reframe_generation::{FunctionalRewriter, GenerationEngine, GenerationOutput};
use reframe_prompt::fewshot_prompt;
use reframe_similarity::Ranker;
use reframe_storage::{read_json, write_dataset, EmbeddingStore};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Query used by the `prompt` command when no text is given
pub const DEFAULT_QUERY: &str = "Your poor decisions regarding our child's health show your laziness, putting all the responsibility on me.";

/// Creates the service clients a run needs
pub trait ServiceFactory {
    fn generator(&self, kind: ProviderKind) -> reframe_core::Result<Box<dyn TextGenerator>>;
    fn embedder(&self) -> reframe_core::Result<Box<dyn Embedder>>;
}

/// HTTP clients built from settings
pub struct HttpServices<'a> {
    settings: &'a Settings,
}

impl<'a> HttpServices<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

impl ServiceFactory for HttpServices<'_> {
    fn generator(&self, kind: ProviderKind) -> reframe_core::Result<Box<dyn TextGenerator>> {
        reframe_providers::generator_for(kind, self.settings)
    }

    fn embedder(&self) -> reframe_core::Result<Box<dyn Embedder>> {
        reframe_providers::embedder_for(self.settings)
    }
}

/// Output of one generation source
#[derive(Debug, Clone)]
pub struct SourceRun {
    pub source: SourceConfig,
    pub output: GenerationOutput,
}

impl SourceRun {
    /// File label for this source's dataset
    pub fn label(&self) -> String {
        dataset_label(&self.source.model)
    }
}

/// Model name made safe for use in a file name
pub fn dataset_label(model: &str) -> String {
    model
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Run the engine for one source over the configured topics
pub fn generate_source<G: TextGenerator>(
    generator: G,
    source: &SourceConfig,
    settings: &Settings,
) -> Result<GenerationOutput> {
    info!(
        "Start generating synthetic data with {} ({}, {} mode)",
        source.model,
        source.provider.as_str(),
        source.mode.as_str()
    );
    let engine = GenerationEngine::for_source(generator, source, &settings.generation);
    let output = engine
        .generate(settings.topics.as_slice(), settings.generation.records_per_topic, source.mode)
        .with_context(|| format!("generation with {} failed", source.model))?;
    info!(
        "{}: {} records generated, {} requested",
        source.model,
        output.produced(),
        output.requested()
    );
    Ok(output)
}

/// Run every configured source in order
pub fn generate_sources(settings: &Settings, services: &dyn ServiceFactory) -> Result<Vec<SourceRun>> {
    let mut runs = Vec::with_capacity(settings.generation.sources.len());
    for source in &settings.generation.sources {
        let generator = services
            .generator(source.provider)
            .with_context(|| format!("failed to create {} client", source.provider.as_str()))?;
        let output = generate_source(generator, source, settings)?;
        runs.push(SourceRun {
            source: source.clone(),
            output,
        });
    }
    Ok(runs)
}

/// Write each source's dataset; returns the records of all sources in order
pub fn export_sources(paths: &PathsConfig, runs: &[SourceRun]) -> Result<Vec<GeneratedRecord>> {
    let mut combined = Vec::new();
    for run in runs {
        let (json, csv) = paths.dataset_paths(Some(&run.label()));
        write_dataset(&json, &csv, &run.output.records)
            .with_context(|| format!("failed to export dataset for {}", run.source.model))?;
        combined.extend(run.output.records.iter().cloned());
    }
    Ok(combined)
}

/// Write each source's dataset and the combined dataset; returns the combined records
pub fn export_runs(paths: &PathsConfig, runs: &[SourceRun]) -> Result<Vec<GeneratedRecord>> {
    let combined = export_sources(paths, runs)?;
    let (json, csv) = paths.dataset_paths(None);
    write_dataset(&json, &csv, &combined).context("failed to export combined dataset")?;
    Ok(combined)
}

/// Turn generated records into pairs.
///
/// Records without functional text are always rewritten; with `rewrite_all`
/// every record is. Without a rewriter, incomplete records are dropped.
pub fn complete_pairs<G: TextGenerator>(
    records: &[GeneratedRecord],
    rewriter: Option<&FunctionalRewriter<G>>,
    rewrite_all: bool,
) -> Result<Vec<ExamplePair>> {
    let mut pairs = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for record in records {
        let existing = if rewrite_all { None } else { record.to_pair() };
        match (existing, rewriter) {
            (Some(pair), _) => pairs.push(pair),
            (None, Some(rewriter)) => {
                let functional = rewriter
                    .rewrite_one(&record.dysfunctional_text)
                    .context("functional rewrite failed")?;
                pairs.push(ExamplePair::new(record.dysfunctional_text.clone(), functional));
            }
            (None, None) => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("{} records have no functional text and were skipped", dropped);
    }
    Ok(pairs)
}

/// Rewrite the exported dataset of every source and write the combined pairs
pub fn rewrite_dataset<G: TextGenerator>(
    paths: &PathsConfig,
    sources: &[SourceConfig],
    rewriter: &FunctionalRewriter<G>,
) -> Result<Vec<ExamplePair>> {
    let mut combined = Vec::new();
    for source in sources {
        let (json, _) = paths.dataset_paths(Some(&dataset_label(&source.model)));
        info!("Loading synthetic data generated with {}", source.model);
        let records: Vec<GeneratedRecord> =
            read_json(&json).with_context(|| format!("failed to load {:?}", json))?;
        info!("Converting to functional language dataset created with {}", source.model);
        combined.extend(rewriter.rewrite(&records)?);
    }
    let (json, csv) = paths.dataset_paths(None);
    write_dataset(&json, &csv, &combined).context("failed to export combined dataset")?;
    Ok(combined)
}

/// Embed every pair's dysfunctional text and insert the batch
pub fn index_pairs<E: Embedder + ?Sized>(
    embedder: &E,
    store: &EmbeddingStore,
    pairs: &[ExamplePair],
) -> Result<Vec<ExampleId>> {
    info!("Getting embeddings for {} examples with {}", pairs.len(), embedder.model());
    let mut batch = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let embedding = embedder
            .embed(&pair.dysfunctional_text)
            .context("embedding request failed")?;
        batch.push(NewExample::new(pair.clone(), embedding));
    }
    if let Some(first) = batch.first() {
        info!(
            "Number of vector embeddings: {}, length: {}",
            batch.len(),
            first.embedding.dim()
        );
    }
    let ids = store.insert(&batch).context("failed to insert embeddings")?;
    Ok(ids)
}

/// Index a dataset file written by the export step
pub fn index_file<E: Embedder + ?Sized>(embedder: &E, store: &EmbeddingStore, path: &Path) -> Result<Vec<ExampleId>> {
    info!("Loading dataset {:?}", path);
    let pairs: Vec<ExamplePair> = read_json(path).with_context(|| format!("failed to load {:?}", path))?;
    index_pairs(embedder, store, &pairs)
}

/// Embed the query, rank the stored corpus and assemble the prompt
pub fn build_fewshot_prompt<E: Embedder + ?Sized>(
    embedder: &E,
    store: &EmbeddingStore,
    ranker: &Ranker,
    query_text: &str,
) -> Result<(String, RetrievalResult)> {
    let query = Vector::new(
        embedder
            .embed(query_text)
            .context("failed to embed the query text")?,
    );
    let retrieved = ranker
        .rank_scan(&query, store.scan_all())
        .context("ranking failed")?;
    info!("Selected {} examples for the prompt", retrieved.len());
    let prompt = fewshot_prompt(&retrieved.examples, query_text);
    Ok((prompt, retrieved))
}

/// Save `prompt` as `prompt_{timestamp}.txt` in `dir`
pub fn save_prompt(dir: &Path, prompt: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {:?}", dir))?;
    let stamp = Local::now().format("%Y-%m-%d_%H.%M.%S");
    let path = dir.join(format!("prompt_{}.txt", stamp));
    std::fs::write(&path, prompt).with_context(|| format!("failed to write {:?}", path))?;
    info!("File saved as {:?}", path);
    Ok(path)
}

/// Steps of a full run beyond generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Rewrite every generated record, not only those missing functional text
    pub rewrite: bool,
    /// Embed the combined pairs and insert them into the store
    pub index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub requested: usize,
    pub generated: usize,
    pub aborted_topics: usize,
    pub pairs: usize,
    pub indexed: usize,
}

/// generate -> export per source -> complete pairs -> export combined -> (index)
pub fn run(settings: &Settings, options: RunOptions, services: &dyn ServiceFactory) -> Result<RunSummary> {
    // the store must open cleanly before any generation work
    let store = if options.index {
        Some(open_store(settings)?)
    } else {
        None
    };

    let runs = generate_sources(settings, services)?;
    // the combined file only ever holds finished pairs
    let records = export_sources(&settings.paths, &runs)?;

    let mut summary = RunSummary {
        requested: runs.iter().map(|r| r.output.requested()).sum(),
        generated: records.len(),
        aborted_topics: runs.iter().map(|r| r.output.aborted().count()).sum(),
        ..RunSummary::default()
    };

    let needs_rewrite = options.rewrite || records.iter().any(|r| r.functional_text.is_none());
    let pairs = if needs_rewrite {
        let generator = services
            .generator(settings.rewrite.provider)
            .context("failed to create rewrite client")?;
        let rewriter = FunctionalRewriter::new(generator, &settings.rewrite);
        complete_pairs(&records, Some(&rewriter), options.rewrite)?
    } else {
        complete_pairs::<Box<dyn TextGenerator>>(&records, None, false)?
    };
    let (json, csv) = settings.paths.dataset_paths(None);
    write_dataset(&json, &csv, &pairs).context("failed to export combined dataset")?;
    summary.pairs = pairs.len();

    if let Some(store) = store {
        let embedder = services.embedder().context("failed to create embedding client")?;
        summary.indexed = index_pairs(embedder.as_ref(), &store, &pairs)?.len();
    }

    info!(
        "Run complete: {} of {} requested records generated, {} pairs, {} indexed",
        summary.generated, summary.requested, summary.pairs, summary.indexed
    );
    Ok(summary)
}

/// Open the configured store, creating it when missing
pub fn open_store(settings: &Settings) -> Result<EmbeddingStore> {
    let path = settings.paths.database_path();
    EmbeddingStore::open_or_create(&path, settings.embedding.dimension)
        .with_context(|| format!("failed to open embedding store {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_label() {
        assert_eq!(dataset_label("gpt-3.5-turbo"), "gpt-3.5-turbo");
        assert_eq!(dataset_label("llama3:8b"), "llama3_8b");
        assert_eq!(dataset_label("org/model"), "org_model");
    }

    #[test]
    fn test_save_prompt_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_prompt(&dir.path().join("prompts"), "hello").unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("prompt_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn test_complete_pairs_without_rewriter_drops_incomplete() {
        let records = vec![
            GeneratedRecord {
                dysfunctional_text: "a".to_string(),
                functional_text: Some("b".to_string()),
            },
            GeneratedRecord {
                dysfunctional_text: "c".to_string(),
                functional_text: None,
            },
        ];
        let pairs = complete_pairs::<Box<dyn TextGenerator>>(&records, None, false).unwrap();
        assert_eq!(pairs, vec![ExamplePair::new("a", "b")]);
    }
}
