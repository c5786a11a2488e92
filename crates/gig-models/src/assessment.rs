//! Typed readers for documents produced by the text-generation oracle.
//!
//! The oracle returns loosely shaped JSON, often wrapped in a markdown code
//! fence. Each reader checks the text against the shape it expects and
//! either fills in defaults or fails with a [`DocumentError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of questions a skills quiz must have.
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// Number of options per quiz question.
pub const QUIZ_OPTION_COUNT: usize = 4;

/// Minimum correct answers for a pass.
pub const QUIZ_PASS_MARK: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),

    #[error("unexpected document shape: {0}")]
    Shape(String),
}

/// Contact details and skills extracted from a resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: String,
}

impl ResumeProfile {
    /// Stand-in profile used when the oracle cannot be reached.
    pub fn placeholder() -> Self {
        Self {
            name: "Unknown".to_string(),
            email: "unknown@example.com".to_string(),
            phone: "0000000000".to_string(),
            skills: "Unknown".to_string(),
        }
    }
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index of the correct option
    pub answer: u8,
}

/// A generated skills quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

/// Outcome of a quiz evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuizVerdict {
    Pass,
    #[default]
    Fail,
}

impl QuizVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, QuizVerdict::Pass)
    }
}

/// Remove a surrounding markdown code fence, if any.
///
/// A fence that was opened but never closed (truncated output) is cut at the
/// last closing brace.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let body = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        return text;
    };

    let body = body.trim();
    if let Some(inner) = body.strip_suffix("```") {
        return inner.trim();
    }
    match body.rfind('}') {
        Some(end) => &body[..=end],
        None => body,
    }
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, DocumentError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NotAnObject),
    }
}

/// Read a field as text. Arrays are joined with ", "; blank values count as absent.
fn field_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match map.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Parse a resume extraction. `name` and `email` are required; `phone` and
/// `skills` default to empty.
pub fn parse_resume(raw: &str) -> Result<ResumeProfile, DocumentError> {
    let map = parse_object(raw)?;

    Ok(ResumeProfile {
        name: field_text(&map, "name").ok_or(DocumentError::MissingField("name"))?,
        email: field_text(&map, "email").ok_or(DocumentError::MissingField("email"))?,
        phone: field_text(&map, "phone").unwrap_or_default(),
        skills: field_text(&map, "skills").unwrap_or_default(),
    })
}

/// Parse a generated quiz: exactly five questions, four options each, answer in range.
pub fn parse_quiz(raw: &str) -> Result<Quiz, DocumentError> {
    let quiz: Quiz = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| DocumentError::InvalidJson(e.to_string()))?;

    if quiz.questions.len() != QUIZ_QUESTION_COUNT {
        return Err(DocumentError::Shape(format!(
            "expected {} questions, got {}",
            QUIZ_QUESTION_COUNT,
            quiz.questions.len()
        )));
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        if q.question.trim().is_empty() {
            return Err(DocumentError::Shape(format!("question {} has no text", i + 1)));
        }
        if q.options.len() != QUIZ_OPTION_COUNT {
            return Err(DocumentError::Shape(format!(
                "question {} has {} options",
                i + 1,
                q.options.len()
            )));
        }
        if usize::from(q.answer) >= QUIZ_OPTION_COUNT {
            return Err(DocumentError::Shape(format!(
                "question {} answer index {} out of range",
                i + 1,
                q.answer
            )));
        }
    }

    Ok(quiz)
}

/// Parse an evaluation result. Anything other than an explicit "Pass" is a fail.
pub fn parse_verdict(raw: &str) -> QuizVerdict {
    match parse_object(raw) {
        Ok(map) => match field_text(&map, "result") {
            Some(result) if result.eq_ignore_ascii_case("pass") => QuizVerdict::Pass,
            _ => QuizVerdict::Fail,
        },
        Err(_) => QuizVerdict::Fail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_json(question_count: usize) -> String {
        let questions: Vec<Value> = (0..question_count)
            .map(|i| {
                serde_json::json!({
                    "question": format!("Question {}", i + 1),
                    "options": ["A", "B", "C", "D"],
                    "answer": i % 4,
                })
            })
            .collect();
        serde_json::json!({ "questions": questions }).to_string()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        // Truncated fence
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\ntrailing"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_resume_defaults_optional_fields() {
        let profile = parse_resume(r#"{"name": " Ada ", "email": "ada@example.com"}"#).unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.phone, "");
        assert_eq!(profile.skills, "");
    }

    #[test]
    fn test_parse_resume_joins_skill_lists() {
        let raw = "```json\n{\"name\":\"Ada\",\"email\":\"ada@example.com\",\"phone\":5551234,\"skills\":[\"Rust\",\"SQL\"]}\n```";
        let profile = parse_resume(raw).unwrap();
        assert_eq!(profile.skills, "Rust, SQL");
        assert_eq!(profile.phone, "5551234");
    }

    #[test]
    fn test_parse_resume_requires_name_and_email() {
        assert_eq!(
            parse_resume(r#"{"name": "", "email": "ada@example.com"}"#),
            Err(DocumentError::MissingField("name"))
        );
        assert_eq!(
            parse_resume(r#"{"name": "Ada"}"#),
            Err(DocumentError::MissingField("email"))
        );
        assert_eq!(parse_resume("[1, 2]"), Err(DocumentError::NotAnObject));
        assert!(matches!(
            parse_resume("Error: no text"),
            Err(DocumentError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_quiz_shape() {
        let quiz = parse_quiz(&quiz_json(5)).unwrap();
        assert_eq!(quiz.questions.len(), 5);
        assert_eq!(quiz.questions[3].answer, 3);

        assert!(matches!(parse_quiz(&quiz_json(4)), Err(DocumentError::Shape(_))));

        let bad_answer = r#"{"questions":[
            {"question":"q","options":["a","b","c","d"],"answer":4},
            {"question":"q","options":["a","b","c","d"],"answer":0},
            {"question":"q","options":["a","b","c","d"],"answer":0},
            {"question":"q","options":["a","b","c","d"],"answer":0},
            {"question":"q","options":["a","b","c","d"],"answer":0}]}"#;
        assert!(matches!(parse_quiz(bad_answer), Err(DocumentError::Shape(_))));
    }

    #[test]
    fn test_parse_verdict() {
        assert_eq!(parse_verdict(r#"{"result": "Pass"}"#), QuizVerdict::Pass);
        assert_eq!(parse_verdict("```json\n{\"result\": \"pass\"}\n```"), QuizVerdict::Pass);
        assert_eq!(parse_verdict(r#"{"result": "Fail"}"#), QuizVerdict::Fail);
        assert_eq!(parse_verdict(r#"{"score": 5}"#), QuizVerdict::Fail);
        assert_eq!(parse_verdict("not json"), QuizVerdict::Fail);
    }
}
