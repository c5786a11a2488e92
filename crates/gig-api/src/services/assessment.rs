//! Resume extraction and skills quizzes backed by the text oracle.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use gig_models::{parse_quiz, parse_resume, parse_verdict, DocumentError, Quiz, QuizVerdict, ResumeProfile};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::gemini::{
    build_evaluation_prompt, build_quiz_prompt, build_resume_prompt, OracleError, TextOracle,
    EVALUATION_MAX_TOKENS, QUIZ_MAX_TOKENS, RESUME_MAX_TOKENS,
};

#[derive(Clone)]
pub struct AssessmentService {
    oracle: Arc<dyn TextOracle>,
}

impl AssessmentService {
    pub fn new(oracle: Arc<dyn TextOracle>) -> Self {
        Self { oracle }
    }

    /// Extract a profile from resume text.
    ///
    /// An unreachable oracle yields the placeholder profile. A reply that
    /// lacks a name or email is an error.
    pub async fn extract_profile(&self, resume_text: &str) -> Result<ResumeProfile, DocumentError> {
        match self
            .call("resume", &build_resume_prompt(resume_text), RESUME_MAX_TOKENS)
            .await
        {
            Ok(raw) => parse_resume(&raw),
            Err(e) => {
                warn!(error = %e, "Resume extraction unavailable, using placeholder profile");
                Ok(ResumeProfile::placeholder())
            }
        }
    }

    /// Generate a quiz over the given skills. There is no fallback quiz.
    pub async fn generate_quiz(&self, skills: &str) -> ApiResult<Quiz> {
        let raw = self
            .call("quiz", &build_quiz_prompt(skills), QUIZ_MAX_TOKENS)
            .await
            .map_err(|e| ApiError::internal(format!("Quiz generation failed: {}", e)))?;

        parse_quiz(&raw)
            .map_err(|e| ApiError::internal(format!("Quiz generation returned an invalid quiz: {}", e)))
    }

    /// Grade submitted answers. Any oracle failure counts as a fail.
    pub async fn evaluate(&self, quiz: &Quiz, answers: &[u8]) -> QuizVerdict {
        match self
            .call("evaluation", &build_evaluation_prompt(quiz, answers), EVALUATION_MAX_TOKENS)
            .await
        {
            Ok(raw) => parse_verdict(&raw),
            Err(e) => {
                warn!(error = %e, "Quiz evaluation unavailable, recording a fail");
                QuizVerdict::Fail
            }
        }
    }

    async fn call(&self, purpose: &'static str, prompt: &str, max_tokens: u32) -> Result<String, OracleError> {
        let start = Instant::now();
        let result = self.oracle.generate(prompt, max_tokens).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::record_oracle_call(purpose, outcome, start.elapsed().as_secs_f64());
        if result.is_ok() {
            info!(purpose, "Oracle call completed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Canned(Result<&'static str, ()>);

    #[async_trait]
    impl TextOracle for Canned {
        async fn generate(&self, _prompt: &str, _max: u32) -> Result<String, OracleError> {
            self.0
                .map(str::to_string)
                .map_err(|_| OracleError::EmptyResponse)
        }
    }

    fn service(reply: Result<&'static str, ()>) -> AssessmentService {
        AssessmentService::new(Arc::new(Canned(reply)))
    }

    #[tokio::test]
    async fn test_profile_placeholder_on_failure() {
        let profile = service(Err(())).extract_profile("resume").await.unwrap();
        assert_eq!(profile, ResumeProfile::placeholder());
    }

    #[tokio::test]
    async fn test_profile_requires_email() {
        let err = service(Ok(r#"{"name": "Ada"}"#))
            .extract_profile("resume")
            .await
            .unwrap_err();
        assert_eq!(err, DocumentError::MissingField("email"));
    }

    #[tokio::test]
    async fn test_quiz_failure_is_an_error() {
        assert!(service(Err(())).generate_quiz("Rust").await.is_err());
        assert!(service(Ok(r#"{"questions": []}"#)).generate_quiz("Rust").await.is_err());
    }

    #[tokio::test]
    async fn test_evaluation_defaults_to_fail() {
        let quiz = Quiz { questions: vec![] };
        assert_eq!(service(Err(())).evaluate(&quiz, &[]).await, QuizVerdict::Fail);
        assert_eq!(
            service(Ok("```json\n{\"result\": \"Pass\"}\n```")).evaluate(&quiz, &[]).await,
            QuizVerdict::Pass
        );
    }
}
