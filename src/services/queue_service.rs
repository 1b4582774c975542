use crate::dto::job_dto::{GenerateQuizPayload, GradeSubmissionPayload, IngestDocumentPayload};
use crate::dto::test_dto::CreateTestPayload;
use crate::error::{Error, Result};
use crate::models::job::{Job, JobKind};
use crate::services::submission_service::GradeOptions;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// Retryable failures are put back in the queue until a job has been
/// claimed this many times.
pub const MAX_ATTEMPTS: i64 = 3;

pub const DEFAULT_RETRY_BASE: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct JobQueueService {
    pub pool: SqlitePool,
    retry_base: Duration,
}

impl JobQueueService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            retry_base: DEFAULT_RETRY_BASE,
        }
    }

    /// Sets the delay before the first retry. Each later retry waits twice
    /// as long as the one before.
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    fn retry_delay(&self, attempts: i64) -> Duration {
        let exponent = (attempts - 1).clamp(0, 10) as u32;
        self.retry_base.saturating_mul(2u32.pow(exponent))
    }

    pub async fn enqueue<P: Serialize>(&self, kind: JobKind, payload: &P) -> Result<Uuid> {
        let payload = serde_json::to_value(payload)?;
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (id, kind, payload, status, created_at)
            VALUES (?1, ?2, ?3, 'pending', ?4)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kind.as_str())
        .bind(Json(payload))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(job_id = %id, kind = kind.as_str(), "Job enqueued");
        Ok(id)
    }

    pub async fn get(&self, id: Uuid) -> Result<Job> {
        let job = sqlx::query_as::<_, Job>(
            r#"SELECT id, kind, payload, status, result, error, created_at, started_at, finished_at FROM jobs WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    /// Returns jobs left `running` by an interrupted worker to the queue.
    pub async fn requeue_stale(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"UPDATE jobs SET status = 'pending', started_at = NULL WHERE status = 'running'"#,
        )
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            tracing::warn!(count = result.rows_affected(), "Requeued interrupted jobs");
        }
        Ok(result.rows_affected())
    }

    /// Claims and executes the oldest pending job. Returns `false` when the
    /// queue is empty.
    pub async fn run_once(&self, app_state: &crate::AppState) -> Result<bool> {
        let claimed = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            UPDATE jobs SET status = 'running', started_at = ?1, attempts = attempts + 1
            WHERE id = (
                SELECT id FROM jobs
                WHERE status = 'pending' AND run_after <= ?2
                ORDER BY created_at ASC LIMIT 1
            )
            RETURNING id, attempts
            "#,
        )
        .bind(Utc::now())
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;
        let Some((job_id, attempts)) = claimed else {
            return Ok(false);
        };

        let job = self.get(job_id).await?;
        tracing::info!(job_id = %job_id, kind = %job.kind, attempt = attempts, "Processing job");

        match self.execute(&job, app_state).await {
            Ok(result) => {
                sqlx::query(
                    r#"UPDATE jobs SET status = 'succeeded', result = ?1, error = NULL, finished_at = ?2 WHERE id = ?3"#,
                )
                .bind(Json(result))
                .bind(Utc::now())
                .bind(job_id)
                .execute(&self.pool)
                .await?;
                tracing::info!(job_id = %job_id, "Job succeeded");
            }
            Err(e) => {
                let body = serde_json::to_string(&e.to_body())?;
                if e.is_retryable() && attempts < MAX_ATTEMPTS {
                    let delay = self.retry_delay(attempts);
                    tracing::warn!(
                        job_id = %job_id,
                        attempt = attempts,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %e,
                        "Job failed, will retry"
                    );
                    let run_after = Utc::now().timestamp_millis()
                        + i64::try_from(delay.as_millis()).unwrap_or(i64::MAX / 2);
                    sqlx::query(
                        r#"UPDATE jobs SET status = 'pending', error = ?1, started_at = NULL, run_after = ?2 WHERE id = ?3"#,
                    )
                    .bind(body)
                    .bind(run_after)
                    .bind(job_id)
                    .execute(&self.pool)
                    .await?;
                } else {
                    tracing::error!(job_id = %job_id, error = %e, "Job failed permanently");
                    sqlx::query(
                        r#"UPDATE jobs SET status = 'failed', error = ?1, finished_at = ?2 WHERE id = ?3"#,
                    )
                    .bind(body)
                    .bind(Utc::now())
                    .bind(job_id)
                    .execute(&self.pool)
                    .await?;
                }
            }
        }

        Ok(true)
    }

    /// Runs jobs until `shutdown` resolves, sleeping `poll` whenever the
    /// queue is empty. The signal is watched while a job runs and while the
    /// worker sleeps. Returns the number of jobs processed.
    pub async fn run_until<F>(&self, app_state: &crate::AppState, poll: Duration, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut processed = 0;

        loop {
            let idle = tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.run_once(app_state) => match outcome {
                    Ok(true) => {
                        processed += 1;
                        None
                    }
                    Ok(false) => Some(poll),
                    Err(e) => {
                        tracing::error!(error = ?e, "Job worker error");
                        Some(Duration::from_secs(1))
                    }
                },
            };

            if let Some(delay) = idle {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        processed
    }

    async fn execute(&self, job: &Job, app_state: &crate::AppState) -> Result<JsonValue> {
        let kind = JobKind::parse(&job.kind)
            .ok_or_else(|| Error::BadRequest(format!("Unknown job kind '{}'", job.kind)))?;

        match kind {
            JobKind::IngestDocument => {
                let payload: IngestDocumentPayload = decode_payload(job)?;
                payload.validate()?;
                let doc = app_state
                    .document_service
                    .ingest_file(Path::new(&payload.path), payload.title)
                    .await?;
                Ok(serde_json::json!({
                    "document_id": doc.id,
                    "title": doc.title,
                    "chars": doc.content.chars().count(),
                }))
            }
            JobKind::GenerateQuiz => {
                let payload: GenerateQuizPayload = decode_payload(job)?;
                payload.validate()?;
                let doc = app_state
                    .document_service
                    .get_document(payload.document_id)
                    .await?;

                let num_q = payload.num_questions.min(app_state.config.max_ai_questions);
                let gen_output = app_state
                    .ai_service
                    .generate_questions(&doc.content, num_q, &payload.question_types)
                    .await?;

                let test = app_state
                    .test_service
                    .create_test(CreateTestPayload {
                        document_id: Some(doc.id),
                        title: payload
                            .title
                            .unwrap_or_else(|| format!("Quiz: {}", doc.title)),
                        questions: gen_output.questions,
                    })
                    .await?;
                Ok(serde_json::json!({
                    "test_id": test.id,
                    "questions": test.questions.len(),
                    "logs": gen_output.logs,
                }))
            }
            JobKind::GradeSubmission => {
                let payload: GradeSubmissionPayload = decode_payload(job)?;
                let opts = GradeOptions {
                    with_feedback: payload.with_feedback && app_state.config.llm_feedback,
                    with_comparison: payload.with_comparison,
                    subjective: app_state.config.subjective_grading,
                };
                let (_, summary) = app_state
                    .submission_service
                    .grade_submission(payload.submission_id, &app_state.ai_service, &opts)
                    .await?;
                Ok(serde_json::json!({
                    "submission_id": payload.submission_id,
                    "total_score": summary.total_score,
                    "max_possible_score": summary.max_possible_score,
                    "percentage": summary.percentage,
                }))
            }
        }
    }
}

fn decode_payload<T: DeserializeOwned>(job: &Job) -> Result<T> {
    serde_json::from_value(job.payload.0.clone())
        .map_err(|e| Error::BadRequest(format!("Invalid {} payload: {}", job.kind, e)))
}
