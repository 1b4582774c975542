use std::collections::HashSet;

use crate::models::answer::UserAnswer;
use crate::models::grading::GradingResult;
use crate::models::question::{Question, QuestionType};

/// Max score reported when there is no question weight to read.
pub const FALLBACK_MAX_SCORE: f64 = 1.0;

/// Why a question was scored zero without comparing answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingIssue {
    MissingQuestion,
    MissingCorrectAnswer,
    NoUserAnswer,
    UnsupportedQuestionType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub score: f64,
    pub max_score: f64,
    pub is_correct: bool,
    pub issue: Option<GradingIssue>,
}

impl Score {
    fn full(max_score: f64) -> Self {
        Self {
            score: max_score,
            max_score,
            is_correct: true,
            issue: None,
        }
    }

    fn zero(max_score: f64) -> Self {
        Self {
            score: 0.0,
            max_score,
            is_correct: false,
            issue: None,
        }
    }

    fn failed(max_score: f64, issue: GradingIssue) -> Self {
        Self {
            issue: Some(issue),
            ..Self::zero(max_score)
        }
    }

    pub fn into_result(self, question_id: impl Into<String>, feedback: String) -> GradingResult {
        GradingResult {
            question_id: question_id.into(),
            score: self.score,
            max_score: self.max_score,
            is_correct: self.is_correct,
            feedback,
        }
    }
}

pub struct GradingService;

impl GradingService {
    /// Scores one answer using only local data. Never fails: malformed or
    /// missing input degrades to a zero score.
    pub fn score(question: Option<&Question>, answer: Option<&UserAnswer>) -> Score {
        let Some(q) = question else {
            return Score::failed(FALLBACK_MAX_SCORE, GradingIssue::MissingQuestion);
        };
        if q.question_type == QuestionType::Unsupported {
            return Score::failed(FALLBACK_MAX_SCORE, GradingIssue::UnsupportedQuestionType);
        }

        let weight = q.weight();
        let raw = answer.map(|a| a.answer.as_str()).unwrap_or("");

        let outcome = match q.question_type {
            QuestionType::Binary | QuestionType::SingleChoice => Self::score_exact(q, raw, weight),
            QuestionType::MultiChoice => Self::score_multi(q, raw, weight),
            QuestionType::NumericScale | QuestionType::StarRating => {
                Self::score_subjective(raw, weight)
            }
            QuestionType::Unsupported => {
                Score::failed(FALLBACK_MAX_SCORE, GradingIssue::UnsupportedQuestionType)
            }
        };

        if let Some(issue) = outcome.issue {
            tracing::debug!(question_id = %q.id, ?issue, "question scored zero");
        }
        clamp(outcome)
    }

    /// Exact, case-insensitive match. Surrounding whitespace is significant.
    fn score_exact(q: &Question, raw: &str, weight: f64) -> Score {
        let Some(correct) = q.correct_answer.as_deref() else {
            return Score::failed(weight, GradingIssue::MissingCorrectAnswer);
        };
        if raw.is_empty() {
            return Score::failed(weight, GradingIssue::NoUserAnswer);
        }
        if raw.to_lowercase() == correct.to_lowercase() {
            Score::full(weight)
        } else {
            Score::zero(weight)
        }
    }

    /// Net credit: each wrong selection cancels one right one, floored at zero.
    fn score_multi(q: &Question, raw: &str, weight: f64) -> Score {
        let correct: HashSet<String> = q
            .correct_set()
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        if correct.is_empty() {
            return Score::failed(weight, GradingIssue::MissingCorrectAnswer);
        }

        let selected = split_selections(raw);
        if selected.is_empty() {
            return Score::failed(weight, GradingIssue::NoUserAnswer);
        }

        let total = correct.len() as f64;
        let hits = selected.iter().filter(|s| correct.contains(*s)).count() as f64;
        let misses = selected.len() as f64 - hits;

        let credit = (hits / total - misses / total).max(0.0);
        let score = round_to(weight * credit, 2);
        Score {
            score,
            max_score: weight,
            is_correct: score == weight,
            issue: None,
        }
    }

    fn score_subjective(raw: &str, weight: f64) -> Score {
        if raw.trim().is_empty() {
            Score::failed(weight, GradingIssue::NoUserAnswer)
        } else {
            Score::full(weight)
        }
    }

    /// Scores every question of a test in order, matching answers by id.
    /// Feedback is left empty for the caller to fill.
    pub fn grade_all(questions: &[Question], answers: &[UserAnswer]) -> Vec<GradingResult> {
        questions
            .iter()
            .map(|q| {
                let answer = answers.iter().find(|a| a.question_id == q.id);
                Self::score(Some(q), answer).into_result(q.id.clone(), String::new())
            })
            .collect()
    }
}

/// Splits a comma-joined multi-choice answer into trimmed, case-folded,
/// de-duplicated selections. Option text containing a comma cannot be
/// represented.
pub fn split_selections(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn clamp(mut s: Score) -> Score {
    s.score = if s.score.is_finite() {
        s.score.clamp(0.0, s.max_score)
    } else {
        0.0
    };
    s
}
