#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gig_api::auth::{CredentialSource, Identity};
use gig_api::config::{ApiConfig, AuthConfig};
use gig_api::services::OracleError;
use gig_api::TextOracle;
use gig_models::{Role, User, UserId};
use gig_store::{MemoryStore, UserRepository};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const BOOTSTRAP: &str = "operator-bootstrap-credential";

pub fn test_config() -> ApiConfig {
    ApiConfig::new(
        AuthConfig::new(SECRET, BOOTSTRAP).with_admin_login("admin@gigboard.test", "admin-password"),
    )
}

pub fn identity(user_id: UserId, role: Role) -> Identity {
    Identity {
        user_id,
        role,
        source: CredentialSource::Signed,
    }
}

pub fn bootstrap_admin() -> Identity {
    Identity {
        user_id: UserId::BOOTSTRAP_ADMIN,
        role: Role::Admin,
        source: CredentialSource::Bootstrap,
    }
}

pub async fn seed_user(store: &MemoryStore, name: &str, role: Role) -> User {
    let email = format!("{}@example.com", name.to_lowercase());
    UserRepository::insert(store, User::draft(name, email, role))
        .await
        .expect("seed user")
}

/// Oracle that replays scripted replies in order and records prompts.
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<Vec<Result<String, ()>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<&str, ()>>) -> Arc<Self> {
        let mut replies: Vec<Result<String, ()>> = replies
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl TextOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str, _max_output_tokens: u32) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop() {
            Some(Ok(text)) => Ok(text),
            _ => Err(OracleError::Status {
                status: 503,
                body: "unavailable".to_string(),
            }),
        }
    }
}

pub fn quiz_json() -> String {
    let questions: Vec<serde_json::Value> = (0..5)
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
