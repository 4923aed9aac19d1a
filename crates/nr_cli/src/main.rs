use clap::{Parser, Subcommand};
use nr_core::{CancelSignal, NewsQuery};
use nr_inference::models::gemini::DEFAULT_GEMINI_MODEL;
use nr_inference::RetryPolicy;
use nr_search::NewsService;
use nr_web::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod logging;

#[derive(Parser, Debug)]
#[command(author, version, about = "Retrieve, rank and summarize news articles", long_about = None)]
pub struct Cli {
    #[arg(long, default_value = "memory")]
    storage: String,
    /// JSON file with the article corpus to load at startup
    #[arg(long, env = "NEWS_DATA")]
    data: Option<PathBuf>,
    #[arg(long, default_value = "gemini", help = "Model to use for inference. Available models: gemini (default), dummy")]
    model: String,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Override the upstream base URL
    #[arg(long)]
    model_url: Option<String>,
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,
    #[arg(long, default_value_t = 20)]
    connect_timeout_secs: u64,
    #[arg(long, default_value_t = 60)]
    request_timeout_secs: u64,
    /// Summary attempts per article before giving up
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    summary_attempts: u32,
    /// Base backoff between summary attempts, multiplied by the attempt number
    #[arg(long, default_value_t = 2000)]
    retry_delay_ms: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
    /// Latest articles in a category
    Category { name: String },
    /// Most relevant articles at or above a score threshold
    Score {
        #[arg(default_value_t = 0.7)]
        threshold: f64,
    },
    /// Free-text search
    Search { query: String },
    /// Latest articles from a source
    Source { name: String },
    /// Articles closest to a point
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 10.0)]
        radius: f64,
    },
    /// Natural-language query
    Query { query: String },
    /// Summarize a single article by id
    Summary { id: String },
}

impl Commands {
    fn news_query(&self) -> Option<NewsQuery> {
        match self {
            Commands::Category { name } => Some(NewsQuery::Category(name.clone())),
            Commands::Score { threshold } => Some(NewsQuery::Score(*threshold)),
            Commands::Search { query } => Some(NewsQuery::Search(query.clone())),
            Commands::Source { name } => Some(NewsQuery::Source(name.clone())),
            Commands::Nearby { lat, lon, radius } => Some(NewsQuery::Nearby {
                lat: *lat,
                lon: *lon,
                radius_km: *radius,
            }),
            Commands::Query { query } => Some(NewsQuery::Natural(query.clone())),
            Commands::Serve { .. } | Commands::Summary { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_logging();
    let cli = Cli::parse();

    let storage = nr_storage::create_storage(&cli.storage, cli.data.as_deref()).await?;
    info!("Storage initialized (using {})", cli.storage);

    let config = nr_inference::Config {
        model_name: cli.model.clone(),
        api_key: cli.api_key.clone(),
        model_url: cli.model_url.clone(),
        upstream_model: cli.gemini_model.clone(),
        connect_timeout: Duration::from_secs(cli.connect_timeout_secs),
        request_timeout: Duration::from_secs(cli.request_timeout_secs),
        retry_policy: RetryPolicy {
            max_attempts: cli.summary_attempts,
            base_delay: Duration::from_millis(cli.retry_delay_ms),
        },
    };
    let retry_policy = config.retry_policy;
    let model = nr_inference::create_model(Some(config)).await?;
    info!("Language model initialized (using {})", model.name());

    let service = NewsService::new(storage, model).with_retry_policy(retry_policy);

    match cli.command {
        Commands::Serve { addr } => {
            nr_web::serve(AppState::new(service), addr).await?;
        }
        Commands::Summary { id } => {
            let summary = service.summary_by_id(&id).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        command => {
            let Some(query) = command.news_query() else {
                return Ok(());
            };
            let cancel = CancelSignal::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, abandoning pending retries");
                    on_interrupt.cancel();
                }
            });

            let result = service.execute(query, Some(&cancel)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
