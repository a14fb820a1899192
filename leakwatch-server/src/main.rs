//! # Leakwatch Server
//!
//! Secret-scanning backend for forge-hosted repositories.
//!
//! ## Overview
//!
//! - **Repository tracking**: owners and repositories discovered through the
//!   GitHub App integration
//! - **Incremental scanning**: trufflehog driven per repository from its
//!   last fully scanned commit
//! - **Finding storage**: deduplicated secret scan results in PostgreSQL
//! - **Task runtime**: an in-process worker pool executing scan and sync
//!   units dispatched from the API
//!
//! The server is built on Axum and uses PostgreSQL for persistent storage
//! and Redis for list-response caching.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leakwatch_core::application::unit_of_work::AppUnitOfWork;
use leakwatch_core::cache::versions::{
    CacheVersions, InMemoryCacheVersions, RedisCacheVersions,
};
use leakwatch_core::database::postgres::PostgresDatabase;
use leakwatch_core::forge::ForgeClient;
use leakwatch_core::forge::github::{GithubAppClient, GithubAppConfig};
use leakwatch_core::scanner::coordinator::ScanCoordinator;
use leakwatch_core::scanner::fleet::FleetOrchestrator;
use leakwatch_core::scanner::process::{SecretScanner, TrufflehogScanner};
use leakwatch_core::tasks::runtime::{TaskExecutor, TaskRuntime, TokioTaskQueue};

use leakwatch_server::infra::app_state::AppState;
use leakwatch_server::infra::config::Config;
use leakwatch_server::infra::response_cache::ResponseCache;
use leakwatch_server::routes;

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "leakwatch-server")]
#[command(about = "Secret-scanning and vulnerability-tracking backend")]
struct Cli {
    /// Address to serve the API on
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8000")]
    bind: SocketAddr,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Maximum PostgreSQL connections in the pool
    #[arg(long, env = "MAX_DB_CONNECTIONS", default_value_t = 10)]
    max_db_connections: u32,

    /// Redis connection string; omit to run without list-response caching
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Disable list-response caching even when Redis is configured
    #[arg(long, env = "DISABLE_CACHE", default_value_t = false)]
    disable_cache: bool,

    /// GitHub App id
    #[arg(long, env = "GITHUB_APP_ID")]
    github_app_id: String,

    /// GitHub App installation id
    #[arg(long, env = "GITHUB_INSTALLATION_ID")]
    github_installation_id: u64,

    /// Path to the GitHub App private key (PEM)
    #[arg(long, env = "GITHUB_PRIVATE_KEY_PATH")]
    github_private_key_path: String,

    /// Path to the trufflehog binary
    #[arg(long, env = "SCANNER_BINARY", default_value = "trufflehog")]
    scanner_binary: String,

    /// User-agent suffix the scanner sends with its requests
    #[arg(long, env = "SCANNER_USER_AGENT_SUFFIX", default_value = "Leakwatch")]
    scanner_user_agent_suffix: String,

    /// Default scanner-internal concurrency
    #[arg(long, env = "SCAN_CONCURRENCY", default_value_t = 10)]
    scan_concurrency: u32,

    /// Task worker count
    #[arg(long, env = "TASK_WORKERS", default_value_t = 4)]
    task_workers: usize,

    /// Task queue depth; dispatches fail once it is full
    #[arg(long, env = "TASK_QUEUE_DEPTH", default_value_t = 1024)]
    task_queue_depth: usize,
}

impl Cli {
    fn into_config(self) -> Config {
        let cache_enabled = self.redis_url.is_some() && !self.disable_cache;
        Config {
            bind_addr: self.bind,
            database_url: self.database_url,
            max_db_connections: self.max_db_connections,
            redis_url: self.redis_url,
            cache_enabled,
            github_app_id: self.github_app_id,
            github_installation_id: self.github_installation_id,
            github_private_key_path: self.github_private_key_path,
            scanner_binary: self.scanner_binary,
            scanner_user_agent_suffix: self.scanner_user_agent_suffix,
            scan_concurrency: self.scan_concurrency,
            task_workers: self.task_workers,
            task_queue_depth: self.task_queue_depth,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leakwatch_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Cli::parse().into_config());

    let db = PostgresDatabase::connect(&config.database_url, config.max_db_connections)
        .await
        .context("database connection failed")?;
    db.migrate().await.context("database migration failed")?;

    let uow = AppUnitOfWork::from_postgres(&db);

    let (versions, response_cache): (Arc<dyn CacheVersions>, Option<ResponseCache>) =
        match &config.redis_url {
            Some(redis_url) => {
                let client =
                    redis::Client::open(redis_url.as_str()).context("invalid Redis URL")?;
                let conn = redis::aio::ConnectionManager::new(client)
                    .await
                    .context("Redis connection failed")?;
                let cache = config
                    .cache_enabled
                    .then(|| ResponseCache::new(conn.clone()));
                (Arc::new(RedisCacheVersions::from_connection(conn)), cache)
            }
            None => {
                info!("no Redis configured, using in-memory cache versions");
                (Arc::new(InMemoryCacheVersions::new()), None)
            }
        };

    let private_key_pem = tokio::fs::read_to_string(&config.github_private_key_path)
        .await
        .with_context(|| {
            format!(
                "failed to read GitHub App private key from {}",
                config.github_private_key_path
            )
        })?;

    let forge: Arc<dyn ForgeClient> = Arc::new(
        GithubAppClient::new(GithubAppConfig {
            app_id: config.github_app_id.clone(),
            installation_id: config.github_installation_id,
            private_key_pem,
            user_agent: format!("leakwatch/{}", env!("CARGO_PKG_VERSION")),
        })
        .context("failed to construct GitHub client")?,
    );

    let scanner: Arc<dyn SecretScanner> = Arc::new(TrufflehogScanner::new(
        config.scanner_binary.clone(),
        config.scanner_user_agent_suffix.clone(),
    ));

    let (queue, receiver) = TokioTaskQueue::channel(config.task_queue_depth);

    let coordinator = Arc::new(ScanCoordinator::new(
        uow.clone(),
        forge.clone(),
        scanner,
        versions.clone(),
    ));
    let fleet = Arc::new(FleetOrchestrator::new(
        uow.clone(),
        forge,
        queue.clone(),
        versions.clone(),
    ));

    let executor = Arc::new(TaskExecutor::new(coordinator, fleet));
    let runtime = TaskRuntime::spawn(executor, receiver, config.task_workers);

    let state = AppState {
        uow,
        dispatcher: queue,
        versions,
        response_cache,
        config: config.clone(),
    };

    let router = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("listening on {}", config.bind_addr);

    axum::serve(listener, router)
        .await
        .context("server exited unexpectedly")?;

    runtime.shutdown();
    Ok(())
}
