pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::database::store::DocumentStore;
use crate::services::{
    ai_service::AIService, document_service::DocumentService, queue_service::JobQueueService,
    submission_service::SubmissionService, test_service::TestService,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ai_service: AIService,
    pub document_service: DocumentService,
    pub test_service: TestService,
    pub submission_service: SubmissionService,
    pub queue: JobQueueService,
}

impl AppState {
    pub fn new(store: &DocumentStore, config: Config) -> error::Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        let pool = store.pool().clone();

        Ok(Self {
            ai_service: AIService::from_config(&config, http_client),
            document_service: DocumentService::new(pool.clone()),
            test_service: TestService::new(pool.clone()),
            submission_service: SubmissionService::new(pool.clone()),
            queue: JobQueueService::new(pool)
                .with_retry_base(Duration::from_millis(config.retry_base_ms)),
            config: Arc::new(config),
        })
    }
}
