//! Account handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use gig_models::{FreelancerDetails, NewClient, Quiz, QuizVerdict, Role, User, UserId};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::services::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FreelancerRegistration {
    pub resume_text: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub quiz: Quiz,
    pub answers: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub result: QuizVerdict,
    pub passed: bool,
}

pub async fn register_client(
    State(state): State<AppState>,
    Json(request): Json<NewClient>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.user_service.register_client(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Register a freelancer from pasted resume text.
pub async fn register_freelancer(
    State(state): State<AppState>,
    Json(request): Json<FreelancerRegistration>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .user_service
        .register_freelancer(&request.resume_text)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Session>> {
    Ok(Json(
        state
            .user_service
            .login(&request.email, &request.password)
            .await?,
    ))
}

/// Public profile.
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<i64>) -> ApiResult<Json<User>> {
    Ok(Json(state.user_service.get(UserId(user_id)).await?))
}

pub async fn list_freelancers(State(state): State<AppState>, _caller: Caller) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.user_service.list_by_role(Role::Freelancer).await?))
}

pub async fn list_clients(State(state): State<AppState>, _caller: Caller) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.user_service.list_by_role(Role::Client).await?))
}

pub async fn generate_quiz(State(state): State<AppState>, Path(user_id): Path<i64>) -> ApiResult<Json<Quiz>> {
    Ok(Json(state.user_service.generate_quiz(UserId(user_id)).await?))
}

pub async fn evaluate_quiz(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(submission): Json<QuizSubmission>,
) -> ApiResult<Json<QuizResult>> {
    let verdict = state
        .user_service
        .evaluate_quiz(UserId(user_id), &submission.quiz, &submission.answers)
        .await?;
    Ok(Json(QuizResult {
        result: verdict,
        passed: verdict.passed(),
    }))
}

/// Set name, email and password after onboarding.
pub async fn complete_profile(
    State(state): State<AppState>,
    caller: Option<Caller>,
    Path(user_id): Path<i64>,
    Json(details): Json<FreelancerDetails>,
) -> ApiResult<Json<User>> {
    let caller = caller.map(|Caller(identity)| identity);
    Ok(Json(
        state
            .user_service
            .complete_profile(UserId(user_id), details, caller.as_ref())
            .await?,
    ))
}
