use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnswer {
    #[serde(alias = "questionId")]
    pub question_id: String,
    /// Raw answer text. Multi-choice selections are comma-joined.
    #[serde(default)]
    pub answer: String,
}

impl UserAnswer {
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.answer.trim().is_empty()
    }
}
