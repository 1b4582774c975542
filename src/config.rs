use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectivePolicy {
    /// Scale and rating answers earn full weight whenever present.
    AutoAward,
    /// Scale and rating answers go through the LLM rubric grader.
    Rubric,
}

impl FromStr for SubjectivePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "auto_award" => Ok(SubjectivePolicy::AutoAward),
            "rubric" | "llm" => Ok(SubjectivePolicy::Rubric),
            other => Err(format!("unknown subjective grading policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub max_ai_questions: usize,
    pub max_document_chars: usize,
    pub subjective_grading: SubjectivePolicy,
    pub llm_feedback: bool,
    pub worker_poll_ms: u64,
    pub retry_base_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            database_url: get_env_or("DATABASE_URL", "sqlite://quiz.db"),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: get_env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_model: get_env_or("OPENAI_MODEL", "gpt-4o"),
            max_ai_questions: get_env_parse_or("MAX_AI_QUESTIONS", 20)?,
            max_document_chars: get_env_parse_or("MAX_DOCUMENT_CHARS", 12_000)?,
            subjective_grading: get_env_parse_or("SUBJECTIVE_GRADING", SubjectivePolicy::AutoAward)?,
            llm_feedback: get_env_parse_or("LLM_FEEDBACK", true)?,
            worker_poll_ms: get_env_parse_or("WORKER_POLL_MS", 750)?,
            retry_base_ms: get_env_parse_or("RETRY_BASE_MS", 2_000)?,
        })
    }

    /// Settings for tests and embedding: in-memory database, no LLM provider.
    pub fn local(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-4o".to_string(),
            max_ai_questions: 20,
            max_document_chars: 12_000,
            subjective_grading: SubjectivePolicy::AutoAward,
            llm_feedback: true,
            worker_poll_ms: 750,
            retry_base_ms: 2_000,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjective_policy_parses_known_names() {
        assert_eq!("auto".parse(), Ok(SubjectivePolicy::AutoAward));
        assert_eq!(" Rubric ".parse(), Ok(SubjectivePolicy::Rubric));
        assert!("sometimes".parse::<SubjectivePolicy>().is_err());
    }

    #[test]
    fn parse_or_reports_invalid_values() {
        env::set_var("QUIZ_TEST_POLL_MS", "soon");
        let err = get_env_parse_or::<u64>("QUIZ_TEST_POLL_MS", 10).unwrap_err();
        assert!(err.to_string().contains("QUIZ_TEST_POLL_MS"));
        env::remove_var("QUIZ_TEST_POLL_MS");
        assert_eq!(get_env_parse_or::<u64>("QUIZ_TEST_POLL_MS", 10).unwrap(), 10);
    }
}
