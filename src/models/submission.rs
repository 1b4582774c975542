use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::answer::UserAnswer;
use crate::models::grading::{Comparison, GradingResult, TestResult};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_GRADED: &str = "graded";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub test_id: Uuid,
    pub answers: Json<Vec<UserAnswer>>,
    pub status: String,
    pub results: Option<Json<Vec<GradingResult>>>,
    pub total_score: Option<f64>,
    pub max_possible_score: Option<f64>,
    pub percentage: Option<f64>,
    pub comparison: Option<Json<Comparison>>,
    pub created_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.status == STATUS_GRADED
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&UserAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    /// Totals of a graded submission.
    pub fn summary(&self) -> Option<TestResult> {
        Some(TestResult {
            results: self.results.as_ref()?.0.clone(),
            total_score: self.total_score?,
            max_possible_score: self.max_possible_score?,
            percentage: self.percentage?,
        })
    }
}
