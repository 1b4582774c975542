use crate::config::SubjectivePolicy;
use crate::dto::test_dto::CreateSubmissionPayload;
use crate::error::{Error, Result};
use crate::models::grading::{GradingResult, TestResult};
use crate::models::question::Question;
use crate::models::submission::{Submission, STATUS_GRADED, STATUS_PENDING};
use crate::models::answer::UserAnswer;
use crate::services::ai_service::{fallback_feedback, AIService};
use crate::services::document_service::DocumentService;
use crate::services::grading_service::{round_to, GradingService, Score};
use crate::services::report_service::ReportService;
use crate::services::test_service::TestService;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy)]
pub struct GradeOptions {
    pub with_feedback: bool,
    pub with_comparison: bool,
    pub subjective: SubjectivePolicy,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            with_feedback: true,
            with_comparison: false,
            subjective: SubjectivePolicy::AutoAward,
        }
    }
}

#[derive(Clone)]
pub struct SubmissionService {
    pool: SqlitePool,
}

impl SubmissionService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_submission(&self, payload: CreateSubmissionPayload) -> Result<Submission> {
        payload.validate()?;
        let test = TestService::new(self.pool.clone())
            .get_test_by_id(payload.test_id)
            .await?;

        let unknown: Vec<&str> = payload
            .answers
            .iter()
            .filter(|a| test.question(&a.question_id).is_none())
            .map(|a| a.question_id.as_str())
            .collect();
        if !unknown.is_empty() {
            tracing::warn!(test_id = %test.id, ?unknown, "Submission contains answers for unknown questions");
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (id, test_id, answers, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(test.id)
        .bind(Json(&payload.answers))
        .bind(STATUS_PENDING)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(submission)
    }

    pub async fn get_submission(&self, id: Uuid) -> Result<Submission> {
        let submission = sqlx::query_as::<_, Submission>(r#"SELECT * FROM submissions WHERE id = ?1"#)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(submission)
    }

    pub async fn list_for_test(&self, test_id: Uuid) -> Result<Vec<Submission>> {
        let rows = sqlx::query_as::<_, Submission>(
            r#"SELECT * FROM submissions WHERE test_id = ?1 ORDER BY created_at ASC"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Runs the grading pass for a pending submission: local scoring, optional
    /// rubric grading and feedback, the aggregate report and an optional
    /// comparison. Provider failures never abort the pass.
    pub async fn grade_submission(
        &self,
        id: Uuid,
        ai: &AIService,
        opts: &GradeOptions,
    ) -> Result<(Submission, TestResult)> {
        let submission = self.get_submission(id).await?;
        if submission.is_graded() {
            return Err(Error::BadRequest(format!(
                "Submission {} has already been graded",
                id
            )));
        }

        let test = TestService::new(self.pool.clone())
            .get_test_by_id(submission.test_id)
            .await?;
        let source = match test.document_id {
            Some(doc_id) => match DocumentService::new(self.pool.clone()).get_document(doc_id).await {
                Ok(doc) => Some(doc.content),
                Err(e) => {
                    tracing::warn!(document_id = %doc_id, error = %e, "Source document unavailable for grading");
                    None
                }
            },
            None => None,
        };

        let mut results = Vec::with_capacity(test.questions.len());
        for question in test.questions.iter() {
            let answer = submission.answer_for(&question.id);
            let result = grade_one(question, answer, source.as_deref(), ai, opts).await;
            results.push(result);
        }

        let summary = ReportService::summarize(results);
        let comparison = if opts.with_comparison {
            Some(ai.compare_results(&test.questions, &submission.answers, &summary).await)
        } else {
            None
        };

        let updated = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = ?1, results = ?2, total_score = ?3, max_possible_score = ?4,
                percentage = ?5, comparison = ?6, graded_at = ?7
            WHERE id = ?8 AND status = ?9
            RETURNING *
            "#,
        )
        .bind(STATUS_GRADED)
        .bind(Json(&summary.results))
        .bind(summary.total_score)
        .bind(summary.max_possible_score)
        .bind(summary.percentage)
        .bind(comparison.as_ref().map(Json))
        .bind(Utc::now())
        .bind(id)
        .bind(STATUS_PENDING)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::BadRequest(format!("Submission {} was graded concurrently", id)))?;

        tracing::info!(
            submission_id = %id,
            score = summary.total_score,
            max_score = summary.max_possible_score,
            percentage = summary.percentage,
            "Submission graded"
        );
        Ok((updated, summary))
    }
}

async fn grade_one(
    question: &Question,
    answer: Option<&UserAnswer>,
    source: Option<&str>,
    ai: &AIService,
    opts: &GradeOptions,
) -> GradingResult {
    let mut score = GradingService::score(Some(question), answer);
    let answered = answer.filter(|a| !a.is_blank());

    if opts.subjective == SubjectivePolicy::Rubric && question.question_type.is_subjective() {
        if let Some(a) = answered {
            match ai
                .grade_with_rubric(question, &a.answer, score.max_score, source)
                .await
            {
                Ok(grade) => {
                    score = award(score, grade.score);
                    let feedback = if grade.feedback.trim().is_empty() {
                        fallback_feedback(&score)
                    } else {
                        grade.feedback.trim().to_string()
                    };
                    return score.into_result(question.id.clone(), feedback);
                }
                Err(e) => {
                    tracing::warn!(question_id = %question.id, error = %e, "Rubric grading failed, keeping local score");
                }
            }
        }
    }

    let feedback = if opts.with_feedback {
        ai.generate_feedback(question, answer.map(|a| a.answer.as_str()), &score, source)
            .await
    } else {
        fallback_feedback(&score)
    };
    score.into_result(question.id.clone(), feedback)
}

fn award(score: Score, points: f64) -> Score {
    let points = round_to(points.clamp(0.0, score.max_score), 2);
    Score {
        score: points,
        is_correct: points == score.max_score,
        ..score
    }
}
