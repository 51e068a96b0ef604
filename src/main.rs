use clap::{Parser, Subcommand, ValueEnum};
use incident_retrieval::{
    config::Config,
    error::Result,
    ingestion::{HttpTicketSource, IngestionSynchronizer},
    playbooks::PlaybookCatalog,
    search::{FusionWeights, HybridSearcher, LexicalSearch},
    store::{
        InMemoryPlaybookStore, InMemoryTicketStore, PlaybookStore, SledSyncStateStore, TicketStore,
    },
    vector::{CollectionSpec, EmbeddingClient, RecordVectorizer, VectorIndexClient, VectorizationService},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "incident-retrieval")]
#[command(about = "Hybrid retrieval over incident tickets and playbooks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull every ticket from the external source into the stores
    Sync {
        /// Re-run even when a completed import is already on record
        #[arg(short, long)]
        force: bool,
    },

    /// Rebuild the vector twin of every stored ticket
    Revectorize,

    /// Hybrid search over one of the collections
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short, long, value_enum, default_value_t = SearchTarget::Tickets)]
        target: SearchTarget,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Reachability of the embedding model and the vector index
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchTarget {
    Tickets,
    Playbooks,
}

/// Lexical path for ticket hybrid search, backed by the record store
struct TicketLexical {
    store: Arc<dyn TicketStore>,
}

#[async_trait]
impl LexicalSearch for TicketLexical {
    async fn search_ids(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let tickets = self.store.search_text(query, limit).await?;
        Ok(tickets.into_iter().map(|t| t.id.to_string()).collect())
    }
}

fn vector_service(
    config: &Config,
    mut spec: CollectionSpec,
) -> Result<Arc<VectorizationService>> {
    let embeddings = EmbeddingClient::new(
        &config.embedding.endpoint,
        &config.embedding.provider,
        Duration::from_secs(config.embedding.timeout_secs),
    )?;
    let index = VectorIndexClient::new(
        &config.vector_index.url,
        config.vector_index.api_key.clone(),
        Duration::from_secs(config.vector_index.timeout_secs),
    )?;
    spec.metric = config.vector_index.metric;
    Ok(Arc::new(VectorizationService::new(index, embeddings, spec)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration before tracing so the configured level applies
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("incident_retrieval={}", config.observability.log_level).into());
    if config.observability.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting incident-retrieval v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let ticket_store: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());
    let playbook_store: Arc<dyn PlaybookStore> = Arc::new(InMemoryPlaybookStore::new());

    let ticket_vectors = vector_service(
        &config,
        CollectionSpec::tickets(config.vector_index.ticket_collection.clone()),
    )?;
    let playbook_vectors = vector_service(
        &config,
        CollectionSpec::playbooks(config.vector_index.playbook_collection.clone()),
    )?;

    let weights = FusionWeights {
        vector: config.search.vector_weight,
        text: config.search.text_weight,
    };

    match cli.command {
        Commands::Sync { force } => {
            let source = Arc::new(HttpTicketSource::new(
                &config.ingestion.source_url,
                &config.ingestion.source_name,
                &config.ingestion.filter_query,
                config.ingestion.api_token.clone(),
                Duration::from_secs(config.ingestion.timeout_secs),
            )?);
            let state_store = Arc::new(SledSyncStateStore::new(&config.state.path)?);
            let synchronizer = IngestionSynchronizer::new(
                source,
                ticket_store,
                ticket_vectors.clone() as Arc<dyn RecordVectorizer>,
                state_store,
                config.ingestion.batch_size,
                config.ingestion.policy,
            );

            let outcome = synchronizer.full_import(force).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Revectorize => {
            let source = Arc::new(HttpTicketSource::new(
                &config.ingestion.source_url,
                &config.ingestion.source_name,
                &config.ingestion.filter_query,
                config.ingestion.api_token.clone(),
                Duration::from_secs(config.ingestion.timeout_secs),
            )?);
            let state_store = Arc::new(SledSyncStateStore::new(&config.state.path)?);
            let synchronizer = IngestionSynchronizer::new(
                source,
                ticket_store,
                ticket_vectors.clone() as Arc<dyn RecordVectorizer>,
                state_store,
                config.ingestion.batch_size,
                config.ingestion.policy,
            );

            let outcome = synchronizer.revectorize_all().await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }

        Commands::Search {
            query,
            target,
            limit,
        } => match target {
            SearchTarget::Tickets => {
                let lexical = Arc::new(TicketLexical {
                    store: ticket_store,
                });
                let searcher = HybridSearcher::new(
                    ticket_vectors.clone() as Arc<dyn RecordVectorizer>,
                    lexical,
                    weights,
                    limit,
                );
                let response = searcher.search(&query).await?;
                if response.degraded {
                    tracing::warn!("One retrieval path failed; results are partial");
                }
                println!("{}", serde_json::to_string_pretty(&response.hits)?);
            }
            SearchTarget::Playbooks => {
                let catalog = PlaybookCatalog::new(
                    playbook_store,
                    playbook_vectors.clone() as Arc<dyn RecordVectorizer>,
                    weights,
                    limit,
                );
                let response = catalog.search(&query).await?;
                if response.degraded {
                    tracing::warn!("One retrieval path failed; results are partial");
                }
                println!("{}", serde_json::to_string_pretty(&response.results)?);
            }
        },

        Commands::Health => {
            let (tickets, playbooks) =
                tokio::join!(ticket_vectors.health(), playbook_vectors.health());
            let report = serde_json::json!({
                "tickets": tickets,
                "playbooks": playbooks,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
