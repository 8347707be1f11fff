use clap::{Parser, Subcommand};
use pharma_retrieval_core::{
    run_ingestion, Category, HashedTrigramEmbedder, LocalVectorStore, LopdfExtractor,
    PipelineConfig, QueryRequest, QueryService, DATA_DIR_ENV, DEFAULT_TOP_K, STORE_DIR_ENV,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEMO_QUERY: &str = "What is major cause of headache";

#[derive(Parser)]
#[command(name = "pharma-retrieval", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the source PDF corpus.
    #[arg(long, env = DATA_DIR_ENV, default_value = "data/pharmacy")]
    data_dir: String,

    /// Directory the vector store persists to.
    #[arg(long, env = STORE_DIR_ENV, default_value = "vector_store")]
    store_dir: String,
}

#[derive(Subcommand)]
enum Command {
    /// Load the known PDFs, chunk, embed, and persist the vector store.
    Ingest,
    /// Run one similarity query against the populated store.
    Query {
        /// Free-text query.
        #[arg(long)]
        text: String,
        /// Restrict results to one category label (drug_label or medicaid_policy).
        #[arg(long)]
        category: Option<Category>,
        /// Number of results to return.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Ingest and then run the canned example query.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::new(&cli.data_dir, &cli.store_dir);

    match cli.command {
        Command::Ingest => ingest(&config).await,
        Command::Query {
            text,
            category,
            top_k,
        } => {
            let mut request = QueryRequest::new(text).with_top_k(top_k);
            if let Some(category) = category {
                request = request.with_category(category);
            }
            query(&config, request).await
        }
        Command::Demo => {
            ingest(&config).await?;
            query(&config, QueryRequest::new(DEMO_QUERY)).await
        }
    }
}

async fn ingest(config: &PipelineConfig) -> anyhow::Result<()> {
    info!(data_dir = %config.data_dir.display(), "starting document ingestion");

    let extractor = LopdfExtractor;
    let embedder = HashedTrigramEmbedder {
        dimensions: config.embedding_dimensions,
    };
    let store = LocalVectorStore::new(&config.store_dir, config.embedding_dimensions);

    let outcome = run_ingestion(config, &extractor, &store, &embedder).await?;

    if outcome.already_ingested {
        info!(
            store_dir = %config.store_dir.display(),
            "vector store already populated, skipping ingestion; delete the store directory to re-ingest"
        );
        return Ok(());
    }

    for skipped in &outcome.skipped {
        warn!(file = %skipped.file_name, reason = %skipped.reason, "skipping missing document");
    }
    for (file, count) in &outcome.per_file_counts {
        info!(file = %file, chunks = count, "split document");
    }
    info!(
        total_chunks = outcome.chunk_count,
        store_dir = %config.store_dir.display(),
        "embeddings stored"
    );

    Ok(())
}

async fn query(config: &PipelineConfig, request: QueryRequest) -> anyhow::Result<()> {
    let embedder = HashedTrigramEmbedder {
        dimensions: config.embedding_dimensions,
    };
    let store = LocalVectorStore::new(&config.store_dir, config.embedding_dimensions);
    let service = QueryService::new(store, embedder);

    info!(text = %request.text, "received query");
    if let Some(category) = request.category {
        info!(category = %category, "applying metadata filter");
    }

    let hits = service.search(&request).await?;

    if hits.is_empty() {
        warn!("no relevant documents found for the query with the given filters");
        return Ok(());
    }

    info!(count = hits.len(), "found relevant document chunks");
    for (index, hit) in hits.iter().enumerate() {
        let preview: String = hit.chunk.text.chars().take(300).collect();
        info!(
            result = index + 1,
            score = f64::from(hit.score),
            source = %hit.chunk.source_file,
            category = %hit.chunk.category,
            page = hit.chunk.page,
            content = %preview,
            "query result"
        );
    }

    Ok(())
}
