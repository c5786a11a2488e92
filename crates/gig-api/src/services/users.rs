//! Accounts: registration, login, freelancer onboarding and admin views.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use gig_models::{FreelancerDetails, NewClient, Quiz, QuizVerdict, Role, User, UserId};
use gig_store::{StoreError, UserRepository};

use crate::auth::{Identity, IdentityResolver};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{hash_password, mask_email, sanitize_string, sanitize_title, verify_password};
use crate::services::assessment::AssessmentService;

/// A stored user together with a freshly issued credential.
#[derive(Debug, Serialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    assessment: AssessmentService,
    identity: Arc<IdentityResolver>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        assessment: AssessmentService,
        identity: Arc<IdentityResolver>,
    ) -> Self {
        Self {
            users,
            assessment,
            identity,
        }
    }

    /// Register an active client account.
    pub async fn register_client(&self, mut new_client: NewClient) -> ApiResult<User> {
        new_client.name = sanitize_title(&new_client.name);
        new_client.email = new_client.email.trim().to_lowercase();
        new_client.validate()?;

        let mut user = User::draft(new_client.name, new_client.email, Role::Client);
        user.phone = new_client.phone.filter(|p| !p.trim().is_empty());
        user.password = Some(hash_password(&new_client.password));

        let user = self.insert(user).await?;
        info!(user_id = %user.id, email = %mask_email(&user.email), "Client registered");
        metrics::record_registration(Role::Client.as_str());
        Ok(user)
    }

    /// Register an inactive freelancer from resume text.
    pub async fn register_freelancer(&self, resume_text: &str) -> ApiResult<User> {
        let resume_text = sanitize_string(resume_text);
        if resume_text.trim().is_empty() {
            return Err(ApiError::Validation("resume text is required".to_string()));
        }

        let profile = self
            .assessment
            .extract_profile(&resume_text)
            .await
            .map_err(|e| ApiError::Validation(format!("could not read resume: {}", e)))?;

        let mut user = User::draft(
            sanitize_title(&profile.name),
            profile.email.trim().to_lowercase(),
            Role::Freelancer,
        );
        user.phone = Some(profile.phone).filter(|p| !p.is_empty());
        user.skills = Some(profile.skills).filter(|s| !s.is_empty());
        user.resume_text = Some(resume_text);

        let user = self.insert(user).await?;
        info!(user_id = %user.id, "Freelancer registered from resume");
        metrics::record_registration(Role::Freelancer.as_str());
        Ok(user)
    }

    /// Exchange email and password for a signed credential.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let email = email.trim().to_lowercase();
        let user = self.users.find_by_email(&email).await?;

        let user = match user {
            Some(user)
                if user
                    .password
                    .as_ref()
                    .is_some_and(|stored| verify_password(password, stored)) =>
            {
                user
            }
            _ => {
                warn!(email = %mask_email(&email), "Login rejected");
                return Err(ApiError::unauthorized("Invalid email or password"));
            }
        };

        let token = self.identity.issue(&user)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok(Session { user, token })
    }

    pub async fn get(&self, user_id: UserId) -> ApiResult<User> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user {}", user_id)))
    }

    pub async fn list_by_role(&self, role: Role) -> ApiResult<Vec<User>> {
        Ok(self.users.list_by_role(role).await?)
    }

    /// Quiz over a freelancer's extracted skills.
    pub async fn generate_quiz(&self, user_id: UserId) -> ApiResult<Quiz> {
        let user = self.freelancer(user_id).await?;
        let skills = user.skills.as_deref().unwrap_or("general freelancing");
        self.assessment.generate_quiz(skills).await
    }

    /// Grade a quiz. Passing activates the freelancer.
    pub async fn evaluate_quiz(
        &self,
        user_id: UserId,
        quiz: &Quiz,
        answers: &[u8],
    ) -> ApiResult<QuizVerdict> {
        let mut user = self.freelancer(user_id).await?;
        let verdict = self.assessment.evaluate(quiz, answers).await;

        if verdict.passed() && !user.active {
            user.active = true;
            self.users.update(user).await?;
            info!(user_id = %user_id, "Freelancer passed quiz and was activated");
        } else {
            info!(user_id = %user_id, passed = verdict.passed(), "Quiz evaluated");
        }
        Ok(verdict)
    }

    /// Set a freelancer's name, email and password.
    ///
    /// Open to anyone until a password exists; after that only the freelancer
    /// may change these details.
    pub async fn complete_profile(
        &self,
        user_id: UserId,
        mut details: FreelancerDetails,
        caller: Option<&Identity>,
    ) -> ApiResult<User> {
        details.name = sanitize_title(&details.name);
        details.email = details.email.trim().to_lowercase();
        details.validate()?;

        let mut user = self.freelancer(user_id).await?;
        if user.has_password() && caller.map(|c| c.user_id) != Some(user_id) {
            warn!(user_id = %user_id, "Profile change refused for non-owner");
            return Err(ApiError::forbidden("only the freelancer may change this profile"));
        }

        user.name = details.name;
        user.email = details.email;
        user.password = Some(hash_password(&details.password));

        let user = self.users.update(user).await?;
        info!(user_id = %user.id, "Freelancer profile completed");
        Ok(user)
    }

    /// Remove an account. Admin only.
    pub async fn delete(&self, caller: &Identity, user_id: UserId) -> ApiResult<()> {
        require_admin(caller)?;
        self.users.delete(user_id).await.map_err(|e| match e {
            StoreError::NotFound(_) => ApiError::not_found(format!("user {}", user_id)),
            other => other.into(),
        })?;
        info!(user_id = %user_id, admin = %caller.user_id, "User deleted");
        Ok(())
    }

    async fn freelancer(&self, user_id: UserId) -> ApiResult<User> {
        let user = self.get(user_id).await?;
        if user.role != Role::Freelancer {
            return Err(ApiError::Validation(format!(
                "user {} is not a freelancer",
                user_id
            )));
        }
        Ok(user)
    }

    async fn insert(&self, user: User) -> ApiResult<User> {
        self.users.insert(user).await.map_err(|e| match e {
            StoreError::AlreadyExists(_) => ApiError::conflict("email is already registered"),
            other => other.into(),
        })
    }
}

/// Reject callers without the ADMIN role.
pub fn require_admin(caller: &Identity) -> ApiResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        warn!(caller = %caller.user_id, "Admin access refused");
        Err(ApiError::forbidden("Admin access required"))
    }
}
