use serde::{Deserialize, Serialize};

pub const DEFAULT_WEIGHT: f64 = 1.0;
pub const MIN_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(alias = "text", alias = "prompt")]
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, alias = "correctAnswer", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, alias = "correctAnswers", skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "yes-no", alias = "binary", alias = "yes_no")]
    Binary,
    #[serde(
        rename = "multiple-choice-single",
        alias = "single-choice",
        alias = "single_choice"
    )]
    SingleChoice,
    #[serde(
        rename = "multiple-choice-multi",
        alias = "multi-choice",
        alias = "multi_choice"
    )]
    MultiChoice,
    #[serde(rename = "scale", alias = "numeric-scale", alias = "numeric_scale")]
    NumericScale,
    #[serde(rename = "rating", alias = "star-rating", alias = "star_rating")]
    StarRating,
    #[serde(other, rename = "unsupported")]
    Unsupported,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Binary => "yes-no",
            QuestionType::SingleChoice => "multiple-choice-single",
            QuestionType::MultiChoice => "multiple-choice-multi",
            QuestionType::NumericScale => "scale",
            QuestionType::StarRating => "rating",
            QuestionType::Unsupported => "unsupported",
        }
    }

    /// Scale and rating questions have no right answer.
    pub fn is_subjective(&self) -> bool {
        matches!(self, QuestionType::NumericScale | QuestionType::StarRating)
    }
}

impl Question {
    /// Maximum achievable score. Absent or non-finite weights fall back to the
    /// default; anything below the minimum is raised to it.
    pub fn weight(&self) -> f64 {
        match self.weight {
            Some(w) if w.is_finite() => w.max(MIN_WEIGHT),
            _ => DEFAULT_WEIGHT,
        }
    }

    /// Correct selections for a multi-choice question, falling back to the
    /// single correct answer when no set is configured.
    pub fn correct_set(&self) -> Vec<&str> {
        match &self.correct_answers {
            Some(set) => set.iter().map(String::as_str).collect(),
            None => self.correct_answer.iter().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_historical_field_names() {
        let q: Question = serde_json::from_value(json!({
            "id": "q1",
            "type": "multiple-choice-multi",
            "question": "Pick primes",
            "options": ["2", "3", "4"],
            "correctAnswers": ["2", "3"],
            "weight": 10
        }))
        .unwrap();
        assert_eq!(q.question_type, QuestionType::MultiChoice);
        assert_eq!(q.correct_set(), vec!["2", "3"]);
        assert_eq!(q.weight(), 10.0);
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let q: Question = serde_json::from_value(json!({
            "id": "q9",
            "type": "essay",
            "question": "Discuss."
        }))
        .unwrap();
        assert_eq!(q.question_type, QuestionType::Unsupported);
    }

    #[test]
    fn weight_defaults_and_enforces_minimum() {
        let mut q: Question = serde_json::from_value(json!({
            "id": "q1", "type": "yes-no", "question": "?"
        }))
        .unwrap();
        assert_eq!(q.weight(), DEFAULT_WEIGHT);
        q.weight = Some(0.25);
        assert_eq!(q.weight(), MIN_WEIGHT);
        q.weight = Some(f64::NAN);
        assert_eq!(q.weight(), DEFAULT_WEIGHT);
    }

    #[test]
    fn single_correct_answer_is_promoted_to_set() {
        let q: Question = serde_json::from_value(json!({
            "id": "q1", "type": "multi-choice", "question": "?", "correct_answer": "A"
        }))
        .unwrap();
        assert_eq!(q.correct_set(), vec!["A"]);
    }
}
