//! Contribution Engine HTTP server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use contribution_engine::api::{create_router, AppState};
use contribution_engine::config::ConfigLoader;
use contribution_engine::error::{EngineError, EngineResult};
use contribution_engine::orchestrator::{Collaborators, TaskOrchestrator};
use contribution_engine::store::InMemoryStore;

/// Contribution calculation server.
#[derive(Parser, Debug)]
#[command(name = "contribution-engine", version, about)]
struct Args {
    /// Configuration directory containing server.yaml and rates/.
    #[arg(long, default_value = "./config")]
    config: PathBuf,

    /// Address to bind, overriding server.yaml.
    #[arg(long)]
    bind: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(args: Args) -> EngineResult<()> {
    let config = ConfigLoader::load(&args.config)?;
    let settings = config.settings().clone();

    let store = Arc::new(InMemoryStore::new());
    if let Some(seed) = config.salary_seed() {
        info!(
            owner = %seed.owner,
            records = seed.records.len(),
            "Seeding salary records"
        );
        store
            .insert_salaries(&seed.owner, seed.records.clone())
            .await;
    }

    let orchestrator = TaskOrchestrator::start(
        Collaborators::in_memory(Arc::new(config), store),
        settings.default_city.clone(),
    );
    let router = create_router(AppState::new(orchestrator));

    let bind_addr = args.bind.unwrap_or(settings.bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| EngineError::internal(format!("Failed to bind {}: {}", bind_addr, e)))?;

    info!(
        bind_addr = %bind_addr,
        default_city = %settings.default_city,
        "Contribution engine listening"
    );

    axum::serve(listener, router)
        .await
        .map_err(|e| EngineError::internal(format!("Server error: {}", e)))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Contribution engine stopped");
            ExitCode::FAILURE
        }
    }
}
