use crate::dto::test_dto::CreateTestPayload;
use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::test::Test;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedTests {
    #[serde(rename = "items")]
    pub tests: Vec<Test>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct TestService {
    pool: SqlitePool,
}

impl TestService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_test(&self, payload: CreateTestPayload) -> Result<Test> {
        payload.validate()?;
        let questions = assign_question_ids(payload.questions)?;

        let test = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (id, document_id, title, questions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payload.document_id)
        .bind(&payload.title)
        .bind(Json(&questions))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(test_id = %test.id, questions = test.questions.len(), "Test created");
        Ok(test)
    }

    pub async fn get_test_by_id(&self, test_id: Uuid) -> Result<Test> {
        let test = sqlx::query_as::<_, Test>(r#"SELECT * FROM tests WHERE id = ?1"#)
            .bind(test_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(test)
    }

    pub async fn list_tests(
        &self,
        page: i64,
        per_page: i64,
        document_id: Option<Uuid>,
    ) -> Result<PaginatedTests> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM tests WHERE (?1 IS NULL OR document_id = ?1)"#,
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;

        let tests = sqlx::query_as::<_, Test>(
            r#"
            SELECT * FROM tests
            WHERE (?1 IS NULL OR document_id = ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(document_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total_pages = (total + per_page - 1) / per_page;
        Ok(PaginatedTests {
            tests,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub async fn delete_test(&self, test_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tests WHERE id = ?1")
            .bind(test_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Fills blank ids with their 1-based position and rejects duplicates.
fn assign_question_ids(questions: Vec<Question>) -> Result<Vec<Question>> {
    let mut seen = HashSet::new();
    questions
        .into_iter()
        .enumerate()
        .map(|(idx, mut q)| {
            if q.id.trim().is_empty() {
                q.id = format!("q{}", idx + 1);
            }
            if !seen.insert(q.id.clone()) {
                return Err(Error::BadRequest(format!("Duplicate question id '{}'", q.id)));
            }
            Ok(q)
        })
        .collect()
}
