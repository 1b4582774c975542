use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::answer::UserAnswer;
use crate::models::question::Question;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestPayload {
    pub document_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubmissionPayload {
    pub test_id: Uuid,
    #[validate(length(min = 1))]
    pub answers: Vec<UserAnswer>,
}
