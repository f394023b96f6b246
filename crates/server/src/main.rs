mod api;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use mentionloop_core::config::load_dotenv;
use mentionloop_core::Config;
use mentionloop_store::{init_pg_pool, PgJobStore, PgMentionStore};
use mentionloop_twitter::HttpTwitterClient;
use mentionloop_worker::{start_workers, StaticComposer, WorkerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    if !config.twitter.is_configured() {
        anyhow::bail!(
            "TWITTER_APP_AUTH_TOKEN, TWITTER_USER_ID and TWITTER_ACCOUNT_HANDLE are required"
        );
    }

    let pool = init_pg_pool(&config.postgres).await?;

    let client = HttpTwitterClient::from_config(&config.twitter)?;
    let ctx = Arc::new(WorkerContext {
        jobs: Arc::new(PgJobStore::new(pool.clone())),
        mentions: Arc::new(PgMentionStore::new(pool)),
        client: Arc::new(client),
        composer: Arc::new(StaticComposer::new(config.twitter.reply_text.clone())),
        user_id: config.twitter.user_id.clone(),
        account_handle: config.twitter.account_handle.clone(),
    });

    start_workers(ctx, &config.workers).await?;
    info!("Workers started");

    let app = Router::new()
        .route("/health", get(api::health))
        .layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
