use quiz_backend::{config::Config, database::store::DocumentStore, AppState};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Config::from_env()?;
    let poll = Duration::from_millis(config.worker_poll_ms);

    let store = DocumentStore::open(&config).await?;
    let app_state = AppState::new(&store, config)?;
    if !app_state.ai_service.is_configured() {
        tracing::warn!("OPENAI_API_KEY not set, quiz generation jobs will fail and feedback uses templates");
    }

    app_state.queue.requeue_stale().await?;
    info!(poll_ms = poll.as_millis() as u64, "Quiz worker started");

    let processed = app_state
        .queue
        .run_until(&app_state, poll, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(processed, "Shutdown signal received");
    store.close().await;
    Ok(())
}
