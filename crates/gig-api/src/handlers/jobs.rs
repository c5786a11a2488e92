//! Job lifecycle handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use gig_models::{Job, JobEdit, JobId, NewJob, UserId};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub freelancer_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price: u32,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub paid: bool,
}

/// Post a job owned by the caller.
pub async fn post_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(new_job): Json<NewJob>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let job = state.workflow.post(&caller, new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list_jobs(State(state): State<AppState>, _caller: Caller) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.workflow.list_all().await?))
}

/// Jobs the caller posted.
pub async fn list_client_jobs(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.workflow.list_for_client(&caller).await?))
}

/// Jobs assigned to a freelancer; only that freelancer may ask.
pub async fn list_freelancer_jobs(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(freelancer_id): Path<i64>,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(
        state
            .workflow
            .list_for_freelancer(&caller, UserId(freelancer_id))
            .await?,
    ))
}

pub async fn get_job(
    State(state): State<AppState>,
    _caller: Caller,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.workflow.get(JobId(job_id)).await?))
}

pub async fn edit_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
    Json(edit): Json<JobEdit>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.workflow.edit(&caller, JobId(job_id), edit).await?))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.workflow.delete(&caller, JobId(job_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_freelancer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
    Json(request): Json<AssignRequest>,
) -> ApiResult<Json<Job>> {
    Ok(Json(
        state
            .workflow
            .assign_freelancer(&caller, JobId(job_id), request.freelancer_id)
            .await?,
    ))
}

pub async fn set_price(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
    Json(request): Json<PriceRequest>,
) -> ApiResult<Json<Job>> {
    Ok(Json(
        state
            .workflow
            .set_price(&caller, JobId(job_id), request.price)
            .await?,
    ))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<Job>> {
    Ok(Json(
        state
            .workflow
            .update_payment(&caller, JobId(job_id), request.paid)
            .await?,
    ))
}

pub async fn accept_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.workflow.accept(&caller, JobId(job_id)).await?))
}

pub async fn ignore_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.workflow.ignore(&caller, JobId(job_id)).await?))
}

pub async fn complete_job(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(job_id): Path<i64>,
) -> ApiResult<Json<Job>> {
    Ok(Json(state.workflow.complete(&caller, JobId(job_id)).await?))
}
