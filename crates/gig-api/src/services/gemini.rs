//! Gemini text-generation client.
//!
//! The client only moves text: prompts in, raw candidate text out. Turning
//! that text into typed documents is left to the callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use gig_models::Quiz;

use crate::config::GeminiConfig;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("GEMINI_API_KEY is not configured")]
    NotConfigured,

    #[error("Gemini request failed: {0}")]
    Request(String),

    #[error("Gemini returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini response had no text")]
    EmptyResponse,

    #[error("Failed to parse Gemini response: {0}")]
    Decode(String),
}

/// Anything that turns a prompt into text.
#[async_trait]
pub trait TextOracle: Send + Sync {
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String, OracleError>;
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| OracleError::Request(e.to_string()))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextOracle for GeminiClient {
    async fn generate(&self, prompt: &str, max_output_tokens: u32) -> Result<String, OracleError> {
        let api_key = self.api_key.as_deref().ok_or(OracleError::NotConfigured)?;

        let request = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig { max_output_tokens },
        };

        debug!(model = %self.model, max_output_tokens, "Calling Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), model = %self.model, "Gemini call failed");
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Decode(e.without_url().to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(OracleError::EmptyResponse)
    }
}

/// Output budget for resume extraction.
pub const RESUME_MAX_TOKENS: u32 = 200;
/// Output budget for quiz generation.
pub const QUIZ_MAX_TOKENS: u32 = 500;
/// Output budget for quiz evaluation.
pub const EVALUATION_MAX_TOKENS: u32 = 200;

/// Prompt asking for contact details and skills as a JSON object.
pub fn build_resume_prompt(resume_text: &str) -> String {
    format!(
        "Extract name, email, phone number, and skills from this resume in JSON format: \
         {{\"name\":\"\", \"email\":\"\", \"phone\":\"\", \"skills\":\"\"}}. \
         Return only the JSON object.\n\nResume:\n{}",
        resume_text
    )
}

/// Prompt asking for a five-question multiple-choice quiz.
pub fn build_quiz_prompt(skills: &str) -> String {
    format!(
        r#"Generate a 5-question multiple-choice quiz based on these skills: {}.
Return the quiz in strict JSON with exactly 5 questions. Each question has a "question" string,
an "options" array with exactly 4 unique options, and an "answer" index (0-3) of the correct option.
Use this structure:
{{"questions": [{{"question": "Question text", "options": ["A", "B", "C", "D"], "answer": 0}}]}}
Return only the JSON object."#,
        skills
    )
}

/// Prompt asking the oracle to grade submitted answers.
pub fn build_evaluation_prompt(quiz: &Quiz, answers: &[u8]) -> String {
    let quiz_json = serde_json::to_string(quiz).unwrap_or_default();
    let answers = answers
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(",");

    format!(
        r#"You are evaluating a quiz. The quiz is given in JSON and the answers are comma-separated
option indices (0-3), one per question. Compare each answer with the question's "answer" field.
Return only {{"result": "Pass"}} if 3 or more answers match, otherwise {{"result": "Fail"}}.

Quiz: {}
Answers: {}"#,
        quiz_json, answers
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gig_models::QuizQuestion;

    #[test]
    fn test_request_wire_format() {
        let request = GeminiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: 200,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 200);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_evaluation_prompt_lists_answers() {
        let quiz = Quiz {
            questions: vec![QuizQuestion {
                question: "2+2?".to_string(),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                answer: 3,
            }],
        };
        let prompt = build_evaluation_prompt(&quiz, &[3, 1, 0]);
        assert!(prompt.contains("Answers: 3,1,0"));
        assert!(prompt.contains("2+2?"));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = GeminiClient::new(&GeminiConfig {
            base_url: "http://localhost:1234/v1beta/".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:1234/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = GeminiClient::new(&GeminiConfig::default()).unwrap();
        assert!(matches!(
            client.generate("prompt", 10).await,
            Err(OracleError::NotConfigured)
        ));
    }
}
