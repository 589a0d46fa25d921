use anyhow::Context;
use clap::{Parser, Subcommand};
use poem::{listener::TcpListener, Server};
use std::sync::Arc;
use storefront_api::api_handlers::ServiceInfo;
use storefront_api::config::AppConfig;
use storefront_api::database::Database;
use storefront_api::documents::DocumentStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "api-server")]
#[command(about = "Storefront search API server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve => serve_command(config).await,
        Commands::Migrate => migrate_command(config).await,
    }
}

async fn serve_command(config: AppConfig) -> anyhow::Result<()> {
    let database = Arc::new(Database::new(&config.database).await?);
    tracing::info!(url = %config.database.url, "Database initialized");

    let documents = match &config.documents_path {
        Some(path) => DocumentStore::load_json(path)?,
        None => {
            tracing::info!("DOCUMENTS_PATH not set, starting with an empty document store");
            DocumentStore::storefront()
        }
    };

    let info = ServiceInfo {
        environment: config.environment.clone(),
    };
    let app = storefront_api::routes(database.clone(), documents, info);

    let addr = config.bind_addr();
    tracing::info!(%addr, environment = %config.environment, "Starting storefront API server");

    let server_result = Server::new(TcpListener::bind(&addr))
        .run(app)
        .await
        .with_context(|| format!("Server on {} failed", addr));

    database.close().await;
    server_result
}

async fn migrate_command(config: AppConfig) -> anyhow::Result<()> {
    let database = Database::new(&config.database).await?;
    tracing::info!(url = %config.database.url, "Migrations applied");
    database.close().await;
    Ok(())
}
