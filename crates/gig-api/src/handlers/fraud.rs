//! Fraud report handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use gig_models::{FraudReport, NewFraudReport};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn report_fraud(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(report): Json<NewFraudReport>,
) -> ApiResult<(StatusCode, Json<FraudReport>)> {
    let report = state.fraud_service.report(&caller, report).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_fraud_reports(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<FraudReport>>> {
    Ok(Json(state.fraud_service.list(&caller).await?))
}
