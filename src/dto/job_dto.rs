use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::QuestionType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestDocumentPayload {
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerateQuizPayload {
    pub document_id: Uuid,
    #[validate(range(min = 1, max = 100))]
    pub num_questions: usize,
    #[serde(default)]
    pub question_types: Vec<QuestionType>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeSubmissionPayload {
    pub submission_id: Uuid,
    #[serde(default = "default_true")]
    pub with_feedback: bool,
    #[serde(default)]
    pub with_comparison: bool,
}

fn default_true() -> bool {
    true
}
