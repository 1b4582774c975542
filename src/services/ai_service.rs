use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::answer::UserAnswer;
use crate::models::grading::{Comparison, TestResult};
use crate::models::question::{Question, QuestionType};
use crate::services::grading_service::Score;
use crate::utils::provider_json::parse_provider_json;
use crate::utils::text::truncate_chars;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::time::Duration;

pub const RECOMMENDATION_COUNT: usize = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub questions: Vec<Question>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RubricGrade {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Deserialize)]
struct FeedbackReply {
    feedback: String,
}

#[derive(Deserialize)]
struct ComparisonReply {
    correlation: String,
    analysis: String,
    #[serde(default)]
    recommendations: Vec<String>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    max_document_chars: usize,
}

impl AIService {
    pub fn new(api_key: Option<String>, base_url: String, model: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            max_document_chars: 12_000,
        }
    }

    pub fn from_config(config: &Config, client: Client) -> Self {
        let mut svc = Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            client,
        );
        svc.max_document_chars = config.max_document_chars;
        svc
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate_questions(
        &self,
        document_text: &str,
        num_questions: usize,
        allowed_types: &[QuestionType],
    ) -> Result<GenerationOutput> {
        let mut logs: Vec<String> = vec![];
        logs.push(format!(
            "Starting {} generation for {} questions.",
            self.model, num_questions
        ));

        let system_prompt = r#"You are an experienced teacher writing a quiz about the supplied document.
The output must be a valid JSON object containing a 'questions' array.

Rules:
1. Generate exactly the requested number of questions.
2. Only use the allowed question types.
3. Every question must be answerable from the document alone.
4. 'yes-no' questions use options ["Yes", "No"] and a correct_answer of "Yes" or "No".
5. 'multiple-choice-single' questions have 3-5 options and one correct_answer copied verbatim from the options.
6. 'multiple-choice-multi' questions have 4-6 options and a correct_answers array copied verbatim from the options.
7. 'scale' and 'rating' questions ask for the reader's opinion and have no correct answer.
8. Never put a comma inside option text.
"#;

        let types: Vec<&str> = if allowed_types.is_empty() {
            vec!["yes-no", "multiple-choice-single", "multiple-choice-multi"]
        } else {
            allowed_types.iter().map(QuestionType::as_str).collect()
        };

        let document = truncate_chars(document_text, self.max_document_chars);
        if document.len() < document_text.len() {
            logs.push(format!(
                "Document truncated to {} characters.",
                self.max_document_chars
            ));
        }

        let user_content = serde_json::json!({
            "required_count": num_questions,
            "allowed_types": types,
            "document": document,
            "schema_example": {
                "questions": [
                    {
                        "type": "multiple-choice-single",
                        "question": "Which ...?",
                        "options": ["Option 1", "Option 2", "Option 3", "Option 4"],
                        "correct_answer": "Option 3",
                        "weight": 1
                    },
                    {
                        "type": "multiple-choice-multi",
                        "question": "Which of these ...?",
                        "options": ["A", "B", "C", "D"],
                        "correct_answers": ["A", "C"],
                        "weight": 2
                    }
                ]
            }
        });

        logs.push("Sending request to LLM provider...".to_string());
        let raw: JsonValue = self
            .chat_json(system_prompt, user_content.to_string(), 0.8)
            .await?;
        logs.push("Response received. Parsing and sanitizing...".to_string());

        let questions = self.sanitize_questions(&raw, num_questions, allowed_types);
        if questions.is_empty() {
            return Err(Error::malformed(
                "provider response contained no usable questions",
                Some(raw.to_string().chars().take(500).collect()),
            ));
        }
        logs.push(format!("Finalized {} questions.", questions.len()));
        tracing::info!(count = questions.len(), "Generated quiz questions");

        Ok(GenerationOutput { questions, logs })
    }

    /// Short feedback for one graded answer. Falls back to a fixed message
    /// when the provider is unavailable or answers with something unusable.
    pub async fn generate_feedback(
        &self,
        question: &Question,
        answer: Option<&str>,
        score: &Score,
        source_text: Option<&str>,
    ) -> String {
        if !self.is_configured() {
            return fallback_feedback(score);
        }

        let system_prompt = "You are a supportive tutor. Given a quiz question, the learner's answer and the points awarded, \
            write two or three sentences of feedback that explain what was right or wrong. \
            Return a JSON object with a single field 'feedback'.";

        let user_content = serde_json::json!({
            "question": question.question,
            "type": question.question_type.as_str(),
            "options": question.options,
            "correct_answer": question.correct_answer,
            "correct_answers": question.correct_answers,
            "user_answer": answer.unwrap_or(""),
            "score": score.score,
            "max_score": score.max_score,
            "source_excerpt": source_text.map(|t| truncate_chars(t, self.max_document_chars / 4)),
        });

        match self
            .chat_json::<FeedbackReply>(system_prompt, user_content.to_string(), 0.4)
            .await
        {
            Ok(reply) if !reply.feedback.trim().is_empty() => reply.feedback.trim().to_string(),
            Ok(_) => {
                tracing::warn!(question_id = %question.id, "Provider returned empty feedback");
                fallback_feedback(score)
            }
            Err(e) => {
                tracing::warn!(question_id = %question.id, error = %e, "Feedback generation failed");
                fallback_feedback(score)
            }
        }
    }

    /// Grades a subjective answer against a rubric. Errors are returned so the
    /// caller can fall back to local scoring.
    pub async fn grade_with_rubric(
        &self,
        question: &Question,
        answer: &str,
        max_score: f64,
        source_text: Option<&str>,
    ) -> Result<RubricGrade> {
        let system_prompt = r#"You grade a learner's free-form response to a survey-style quiz question.
Rubric:
- Relevance: the response addresses the question.
- Justification: a rating or scale value is consistent with the document.
- Effort: the response is not empty or evasive.
Return JSON: { "score": <number between 0 and max_score>, "feedback": "<one or two sentences>" }."#;

        let user_content = serde_json::json!({
            "question": question.question,
            "type": question.question_type.as_str(),
            "options": question.options,
            "user_answer": answer,
            "max_score": max_score,
            "source_excerpt": source_text.map(|t| truncate_chars(t, self.max_document_chars / 4)),
        });

        let grade: RubricGrade = self
            .chat_json(system_prompt, user_content.to_string(), 0.1)
            .await?;
        if !grade.score.is_finite() {
            return Err(Error::malformed("rubric score is not a number", None));
        }
        Ok(grade)
    }

    /// Whole-submission analysis with exactly `RECOMMENDATION_COUNT`
    /// recommendations. Never fails.
    pub async fn compare_results(
        &self,
        questions: &[Question],
        answers: &[UserAnswer],
        summary: &TestResult,
    ) -> Comparison {
        if !self.is_configured() {
            return fallback_comparison(summary);
        }

        let system_prompt = format!(
            "You analyse a learner's quiz performance. Return a JSON object with fields \
            'correlation' (one sentence relating the answers to the correct answers), \
            'analysis' (one paragraph on strengths and gaps) and \
            'recommendations' (an array of exactly {} short study recommendations).",
            RECOMMENDATION_COUNT
        );

        let items: Vec<JsonValue> = questions
            .iter()
            .map(|q| {
                let result = summary.results.iter().find(|r| r.question_id == q.id);
                serde_json::json!({
                    "question": q.question,
                    "type": q.question_type.as_str(),
                    "correct_answer": q.correct_answer,
                    "correct_answers": q.correct_answers,
                    "user_answer": answers.iter().find(|a| a.question_id == q.id).map(|a| a.answer.as_str()),
                    "score": result.map(|r| r.score),
                    "max_score": result.map(|r| r.max_score),
                })
            })
            .collect();
        let user_content = serde_json::json!({
            "items": items,
            "total_score": summary.total_score,
            "max_possible_score": summary.max_possible_score,
            "percentage": summary.percentage,
        });

        match self
            .chat_json::<ComparisonReply>(&system_prompt, user_content.to_string(), 0.4)
            .await
        {
            Ok(reply) => {
                let fallback = fallback_comparison(summary);
                let mut recommendations: Vec<String> = reply
                    .recommendations
                    .into_iter()
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty())
                    .take(RECOMMENDATION_COUNT)
                    .collect();
                for extra in fallback.recommendations {
                    if recommendations.len() >= RECOMMENDATION_COUNT {
                        break;
                    }
                    recommendations.push(extra);
                }
                Comparison {
                    correlation: non_empty_or(reply.correlation, fallback.correlation),
                    analysis: non_empty_or(reply.analysis, fallback.analysis),
                    recommendations,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Comparison analysis failed");
                fallback_comparison(summary)
            }
        }
    }

    async fn chat_json<T: DeserializeOwned>(
        &self,
        system_prompt: &str,
        user_content: String,
        temperature: f32,
    ) -> Result<T> {
        let content = self.chat(system_prompt, user_content, temperature).await?;
        parse_provider_json(&content)
    }

    async fn chat(&self, system_prompt: &str, user_content: String, temperature: f32) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::Config("LLM provider is not configured".to_string()));
        };

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content}
            ],
            "response_format": { "type": "json_object" },
            "temperature": temperature
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Provider { status, body });
        }

        let body: ChatResponse = res.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::malformed("provider response had no message content", None))
    }

    pub fn sanitize_questions(
        &self,
        raw: &JsonValue,
        num_questions: usize,
        allowed_types: &[QuestionType],
    ) -> Vec<Question> {
        let arr_val = if let Some(arr) = raw.get("questions").and_then(|a| a.as_array()) {
            arr.as_slice()
        } else if let Some(arr) = raw.as_array() {
            arr.as_slice()
        } else {
            &[]
        };

        let mut rng = rand::thread_rng();
        let mut questions: Vec<Question> = arr_val
            .iter()
            .filter_map(|v| coerce_question(v, &mut rng))
            .filter(|q| allowed_types.is_empty() || allowed_types.contains(&q.question_type))
            .take(num_questions)
            .collect();

        for (idx, q) in questions.iter_mut().enumerate() {
            q.id = format!("q{}", idx + 1);
        }
        questions
    }
}

fn coerce_question(v: &JsonValue, rng: &mut impl rand::Rng) -> Option<Question> {
    let question_type: QuestionType = v
        .get("type")
        .and_then(|t| serde_json::from_value(t.clone()).ok())
        .unwrap_or(QuestionType::Unsupported);
    if question_type == QuestionType::Unsupported {
        return None;
    }

    let text = v
        .get("question")
        .or_else(|| v.get("text"))
        .and_then(|s| s.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let mut options: Vec<String> = v
        .get("options")
        .and_then(|o| o.as_array())
        .map(|a| a.iter().filter_map(value_to_string).collect())
        .unwrap_or_default();
    let correct = v
        .get("correct_answer")
        .or_else(|| v.get("correctAnswer"))
        .and_then(value_to_string);
    let correct_list: Option<Vec<String>> = v
        .get("correct_answers")
        .or_else(|| v.get("correctAnswers"))
        .and_then(|a| a.as_array())
        .map(|a| a.iter().filter_map(value_to_string).collect());
    let weight = v.get("weight").and_then(|w| w.as_f64());

    let mut correct_answer = None;
    let mut correct_answers = None;

    match question_type {
        QuestionType::Binary => {
            if options.len() < 2 {
                options = vec!["Yes".to_string(), "No".to_string()];
            }
            correct_answer = Some(match_option(&options, correct.as_deref()?)?);
        }
        QuestionType::SingleChoice => {
            if options.len() < 2 {
                return None;
            }
            correct_answer = Some(match_option(&options, correct.as_deref()?)?);
            options.shuffle(rng);
        }
        QuestionType::MultiChoice => {
            if options.len() < 2 {
                return None;
            }
            let wanted = correct_list.or_else(|| correct.map(|c| vec![c]))?;
            let mut seen = HashSet::new();
            let matched: Vec<String> = wanted
                .iter()
                .filter_map(|c| match_option(&options, c))
                .filter(|c| seen.insert(c.clone()))
                .collect();
            if matched.is_empty() {
                return None;
            }
            correct_answers = Some(matched);
            options.shuffle(rng);
        }
        QuestionType::NumericScale | QuestionType::StarRating => {}
        QuestionType::Unsupported => return None,
    }

    Some(Question {
        id: String::new(),
        question_type,
        question: text,
        options: if options.is_empty() { None } else { Some(options) },
        correct_answer,
        correct_answers,
        weight: weight.filter(|w| w.is_finite() && *w > 0.0),
    })
}

/// Returns the option text matching `wanted` case-insensitively.
fn match_option(options: &[String], wanted: &str) -> Option<String> {
    let wanted = wanted.trim().to_lowercase();
    options
        .iter()
        .find(|o| o.trim().to_lowercase() == wanted)
        .cloned()
}

fn value_to_string(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(true) => Some("Yes".to_string()),
        JsonValue::Bool(false) => Some("No".to_string()),
        _ => None,
    }
}

fn non_empty_or(value: String, fallback: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed.to_string()
    }
}

pub fn fallback_feedback(score: &Score) -> String {
    if score.is_correct {
        "Great job! Your answer is correct.".to_string()
    } else if score.score > 0.0 {
        format!(
            "Good effort! You earned {} of {} points. Review the options you missed.",
            score.score, score.max_score
        )
    } else {
        "Good effort, but this answer is not correct. Review the material and try again.".to_string()
    }
}

pub fn fallback_comparison(summary: &TestResult) -> Comparison {
    let answered = summary.results.len();
    let correct = summary.results.iter().filter(|r| r.is_correct).count();

    let correlation = format!(
        "You answered {} of {} questions fully correctly, scoring {} of {} points ({}%).",
        correct, answered, summary.total_score, summary.max_possible_score, summary.percentage
    );
    let analysis = if answered == 0 {
        "There were no gradable questions in this submission.".to_string()
    } else if summary.percentage >= 80.0 {
        "Strong result. Your answers closely match the source material, with only minor gaps.".to_string()
    } else if summary.percentage >= 50.0 {
        "Solid foundation. You understood the main ideas but missed several details covered in the document.".to_string()
    } else {
        "This topic needs more work. Many answers did not match the source material.".to_string()
    };

    Comparison {
        correlation,
        analysis,
        recommendations: vec![
            "Re-read the sections of the document behind the questions you missed.".to_string(),
            "For multi-select questions, choose only options you are sure about; wrong picks cost points.".to_string(),
            "Retake the quiz after reviewing to check your progress.".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::grading::GradingResult;
    use crate::services::report_service::ReportService;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(base_url: String) -> AIService {
        AIService::new(
            Some("test-key".into()),
            base_url,
            "gpt-4o".into(),
            Client::new(),
        )
    }

    fn chat_body(content: &str) -> JsonValue {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "index": 0}]
        })
    }

    fn yes_no() -> Question {
        Question {
            id: "q1".into(),
            question_type: QuestionType::Binary,
            question: "Is the sky blue?".into(),
            options: Some(vec!["Yes".into(), "No".into()]),
            correct_answer: Some("Yes".into()),
            correct_answers: None,
            weight: Some(2.0),
        }
    }

    fn score(score: f64, max_score: f64) -> Score {
        Score {
            score,
            max_score,
            is_correct: score == max_score,
            issue: None,
        }
    }

    #[tokio::test]
    async fn feedback_uses_provider_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                "```json\n{\"feedback\": \"Correct, the sky scatters blue light.\"}\n```",
            )))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let text = ai
            .generate_feedback(&yes_no(), Some("yes"), &score(2.0, 2.0), None)
            .await;
        assert_eq!(text, "Correct, the sky scatters blue light.");
    }

    #[tokio::test]
    async fn feedback_falls_back_on_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let text = ai
            .generate_feedback(&yes_no(), Some("no"), &score(0.0, 2.0), None)
            .await;
        assert!(text.starts_with("Good effort"));
    }

    #[tokio::test]
    async fn feedback_falls_back_on_malformed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Nice work!")))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let text = ai
            .generate_feedback(&yes_no(), Some("yes"), &score(2.0, 2.0), None)
            .await;
        assert!(text.starts_with("Great job!"));
    }

    #[tokio::test]
    async fn unconfigured_provider_uses_fallbacks() {
        let ai = AIService::new(None, "http://127.0.0.1:9".into(), "gpt-4o".into(), Client::new());
        assert!(!ai.is_configured());

        let text = ai
            .generate_feedback(&yes_no(), Some("yes"), &score(2.0, 2.0), None)
            .await;
        assert_eq!(text, "Great job! Your answer is correct.");

        let summary = ReportService::summarize(vec![]);
        let comparison = ai.compare_results(&[], &[], &summary).await;
        assert_eq!(comparison.recommendations.len(), RECOMMENDATION_COUNT);

        let err = ai.generate_questions("text", 3, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn comparison_pads_recommendations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(
                &json!({
                    "correlation": "Answers track the text closely.",
                    "analysis": "Good recall of facts.",
                    "recommendations": ["Review chapter 2", "  "]
                })
                .to_string(),
            )))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let summary = ReportService::summarize(vec![GradingResult {
            question_id: "q1".into(),
            score: 2.0,
            max_score: 2.0,
            is_correct: true,
            feedback: String::new(),
        }]);
        let comparison = ai
            .compare_results(&[yes_no()], &[UserAnswer::new("q1", "Yes")], &summary)
            .await;
        assert_eq!(comparison.correlation, "Answers track the text closely.");
        assert_eq!(comparison.recommendations.len(), RECOMMENDATION_COUNT);
        assert_eq!(comparison.recommendations[0], "Review chapter 2");
    }

    #[tokio::test]
    async fn rubric_grade_errors_propagate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let err = ai
            .grade_with_rubric(&yes_no(), "4", 5.0, None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn generate_questions_sanitizes_output() {
        let server = MockServer::start().await;
        let content = json!({
            "questions": [
                {"type": "yes-no", "question": "Is water wet?", "correct_answer": true},
                {"type": "multiple-choice-single", "question": "Capital of France?",
                 "options": ["Paris", "Rome", "Berlin"], "correct_answer": "paris", "weight": 3},
                {"type": "multiple-choice-single", "question": "Broken", "options": ["Only one"], "correct_answer": "Only one"},
                {"type": "essay", "question": "Discuss."},
                {"type": "multiple-choice-multi", "question": "Primes?",
                 "options": ["2", "3", "4", "6"], "correct_answers": ["2", "3", "9"]},
                {"type": "rating", "question": "Rate the text"}
            ]
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(&content.to_string())))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let out = ai.generate_questions("Some document", 10, &[]).await.unwrap();
        let qs = out.questions;
        assert_eq!(qs.len(), 4);
        assert_eq!(
            qs.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(),
            vec!["q1", "q2", "q3", "q4"]
        );
        assert_eq!(qs[0].correct_answer.as_deref(), Some("Yes"));
        assert_eq!(qs[1].correct_answer.as_deref(), Some("Paris"));
        assert_eq!(qs[1].weight(), 3.0);
        assert_eq!(
            qs[2].correct_answers.as_deref(),
            Some(&["2".to_string(), "3".to_string()][..])
        );
        assert_eq!(qs[3].question_type, QuestionType::StarRating);
        assert!(!out.logs.is_empty());
    }

    #[test]
    fn multi_choice_correct_answers_are_deduplicated() {
        let ai = service("http://127.0.0.1:9".into());
        let raw = json!({
            "questions": [
                {"type": "multiple-choice-multi", "question": "Pick letters",
                 "options": ["A", "B", "C"], "correct_answers": ["A", "B", "a", "A"]}
            ]
        });
        let qs = ai.sanitize_questions(&raw, 5, &[]);
        assert_eq!(qs.len(), 1);
        assert_eq!(
            qs[0].correct_answers.as_deref(),
            Some(&["A".to_string(), "B".to_string()][..])
        );
    }

    #[tokio::test]
    async fn generate_questions_with_nothing_usable_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("{\"questions\": []}")))
            .mount(&server)
            .await;

        let ai = service(server.uri());
        let err = ai.generate_questions("doc", 5, &[]).await.unwrap_err();
        assert!(matches!(err, Error::MalformedProviderResponse { .. }));
    }

    #[test]
    fn sanitize_respects_allowed_types_and_count() {
        let ai = AIService::new(None, "http://localhost".into(), "m".into(), Client::new());
        let raw = json!([
            {"type": "yes-no", "question": "A?", "correct_answer": "No"},
            {"type": "scale", "question": "B?"},
            {"type": "yes-no", "question": "C?", "correct_answer": "Yes"},
            {"type": "yes-no", "question": "D?", "correct_answer": "Yes"}
        ]);
        let qs = ai.sanitize_questions(&raw, 2, &[QuestionType::Binary]);
        assert_eq!(qs.len(), 2);
        assert!(qs.iter().all(|q| q.question_type == QuestionType::Binary));
        assert_eq!(qs[1].question, "C?");
    }

    #[test]
    fn fallback_feedback_distinguishes_partial_credit() {
        assert!(fallback_feedback(&score(2.0, 2.0)).starts_with("Great job!"));
        assert!(fallback_feedback(&score(1.0, 2.0)).contains("1 of 2 points"));
        assert!(fallback_feedback(&score(0.0, 2.0)).starts_with("Good effort, but"));
    }
}
