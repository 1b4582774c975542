use crate::config::Config;
use crate::database::pool::create_pool;
use crate::error::Result;
use sqlx::SqlitePool;

/// Owns the database handle. Opened and closed by the process entry point;
/// services borrow clones of the pool.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = create_pool(config).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url = %redact(&config.database_url), "Document store opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Document store closed");
    }
}

fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
