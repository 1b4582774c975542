use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    IngestDocument,
    GenerateQuiz,
    GradeSubmission,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::IngestDocument => "ingest_document",
            JobKind::GenerateQuiz => "generate_quiz",
            JobKind::GradeSubmission => "grade_submission",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ingest_document" => Some(JobKind::IngestDocument),
            "generate_quiz" => Some(JobKind::GenerateQuiz),
            "grade_submission" => Some(JobKind::GradeSubmission),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub kind: String,
    pub payload: Json<JsonValue>,
    pub status: String,
    pub result: Option<Json<JsonValue>>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}
