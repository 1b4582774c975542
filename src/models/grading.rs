use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub question_id: String,
    pub score: f64,
    pub max_score: f64,
    pub is_correct: bool,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub results: Vec<GradingResult>,
    pub total_score: f64,
    pub max_possible_score: f64,
    pub percentage: f64,
}

/// Whole-submission analysis written by the LLM or by the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub correlation: String,
    pub analysis: String,
    pub recommendations: Vec<String>,
}
