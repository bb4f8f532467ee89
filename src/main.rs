use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use kindred::backend::routing::{PartitionKey, StaticPartitionResolver};
use kindred::backend::solr::SolrBackend;
use kindred::bulk::run_bulk;
use kindred::config::Config;
use kindred::document::DocumentRef;
use kindred::logging;
use kindred::service::SimilarityService;

#[derive(Parser)]
#[command(
    name = "kindred",
    version,
    about = "Hybrid similar-document retrieval over Solr-style search backends"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find documents similar to one document and print them as JSON
    Suggest {
        /// Record type of the source document, e.g. "pages"
        #[arg(long = "type")]
        doc_type: String,
        /// Record uid of the source document
        #[arg(long)]
        uid: u32,
        /// Root container id (defaults to backend.default_root_id)
        #[arg(long)]
        root: Option<u32>,
        /// Language id (defaults to 0)
        #[arg(long)]
        language: Option<u32>,
        /// Override the configured similarity mode: auto, lexical, vector, hybrid
        #[arg(long)]
        mode: Option<String>,
        /// Override the configured result count
        #[arg(long)]
        limit: Option<usize>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Precompute suggestions for every indexed document under a root container
    Bulk {
        /// Root container id (defaults to backend.default_root_id)
        #[arg(long)]
        root: Option<u32>,
        /// Language id (defaults to 0)
        #[arg(long)]
        language: Option<u32>,
        /// Cap the number of documents processed
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the effective configuration as JSON
    ConfigShow,
}

/// Wire the HTTP backend, router, and a pinned context resolver into a service.
fn build_service(config: Config, context: PartitionKey) -> Result<SimilarityService> {
    let backend = Arc::new(SolrBackend::new(&config.backend)?);
    let resolver = Arc::new(StaticPartitionResolver::new(context));
    Ok(SimilarityService::new(config, backend, resolver)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // 3. Initialize logging (stderr only, stdout stays reserved for results)
    logging::init_logging(&config);

    match cli.command {
        Commands::Suggest {
            doc_type,
            uid,
            root,
            language,
            mode,
            limit,
            pretty,
        } => {
            if let Some(mode) = mode {
                config.similarity.mode = mode;
            }
            if let Some(limit) = limit {
                config.similarity.max_results = limit;
            }

            let document = DocumentRef::new(doc_type, uid)?;
            let context = PartitionKey {
                root_id: root.unwrap_or(config.backend.default_root_id),
                language_id: language.unwrap_or(0),
            };

            let service = build_service(config, context)?;
            let results = service.find_similar_in(&document, context).await?;

            if pretty {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                println!("{}", serde_json::to_string(&results)?);
            }
        }

        Commands::Bulk {
            root,
            language,
            limit,
        } => {
            let root_id = root.unwrap_or(config.backend.default_root_id);
            let language_id = language.unwrap_or(0);
            let context = PartitionKey {
                root_id,
                language_id,
            };

            let service = build_service(config, context)?;
            let report = run_bulk(&service, root_id, language_id, limit).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::ConfigShow => {
            // credentials stay out of stdout
            config.backend.password = config.backend.password.map(|_| "***".to_string());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
