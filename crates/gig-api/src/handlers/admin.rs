//! Admin handlers for account management and analytics.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use gig_models::{Role, User, UserId};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::security::mask_email;
use crate::services::require_admin;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub message: String,
}

/// Exchange the configured admin email and password for the bootstrap credential.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<AdminLoginRequest>,
) -> ApiResult<Json<AdminLoginResponse>> {
    let Some(admin) = state.config.auth.admin_login.as_ref() else {
        return Err(ApiError::not_found("admin login is not enabled"));
    };

    if !request.email.trim().eq_ignore_ascii_case(&admin.email) || request.password != admin.password {
        warn!(email = %mask_email(&request.email), "Admin login rejected");
        return Err(ApiError::unauthorized("Invalid admin credentials"));
    }

    info!("Admin logged in");
    Ok(Json(AdminLoginResponse {
        token: state.identity.bootstrap_credential().to_string(),
        message: "Admin login successful".to_string(),
    }))
}

pub async fn admin_list_freelancers(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&caller)?;
    Ok(Json(state.user_service.list_by_role(Role::Freelancer).await?))
}

pub async fn admin_list_clients(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<User>>> {
    require_admin(&caller)?;
    Ok(Json(state.user_service.list_by_role(Role::Client).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(user_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.user_service.delete(&caller, UserId(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Platform totals.
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub total_users: usize,
    pub total_clients: usize,
    pub total_freelancers: usize,
    pub active_freelancers: usize,
    pub total_jobs: usize,
    pub jobs_by_status: BTreeMap<String, usize>,
}

pub async fn analytics(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<AnalyticsResponse>> {
    require_admin(&caller)?;

    let clients = state.user_service.list_by_role(Role::Client).await?;
    let freelancers = state.user_service.list_by_role(Role::Freelancer).await?;
    let counts = state.workflow.status_counts().await?;

    let jobs_by_status: BTreeMap<String, usize> = counts
        .iter()
        .map(|(status, count)| (status.as_str().to_string(), *count))
        .collect();

    Ok(Json(AnalyticsResponse {
        total_users: clients.len() + freelancers.len(),
        total_clients: clients.len(),
        total_freelancers: freelancers.len(),
        active_freelancers: freelancers.iter().filter(|u| u.active).count(),
        total_jobs: counts.iter().map(|(_, count)| count).sum(),
        jobs_by_status,
    }))
}
