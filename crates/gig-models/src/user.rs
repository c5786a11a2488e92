//! Users and roles.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Unique identifier for a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Identity the bootstrap credential resolves to. Never handed out to registered users.
    pub const BOOTSTRAP_ADMIN: UserId = UserId(1);

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Freelancer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Freelancer => "FREELANCER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Role::Client),
            "FREELANCER" => Ok(Role::Freelancer),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Salted password digest. Produced and checked by the API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPassword {
    pub salt: String,
    pub digest: String,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store on insert
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default, skip_serializing)]
    pub resume_text: Option<String>,
    pub role: Role,
    /// Clients start active; freelancers are activated by passing the skills quiz
    pub active: bool,
    #[serde(default)]
    pub earnings: f64,
    #[serde(skip)]
    pub password: Option<StoredPassword>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build an unsaved user. The id is a placeholder until the store assigns one.
    pub fn draft(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(0),
            name: name.into(),
            email: email.into(),
            phone: None,
            skills: None,
            resume_text: None,
            role,
            active: role != Role::Freelancer,
            earnings: 0.0,
            password: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

/// Client registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewClient {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// Details a freelancer supplies after passing the quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FreelancerDetails {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}
