//! API routes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::admin::{
    admin_list_clients, admin_list_freelancers, admin_login, analytics, delete_user,
};
use crate::handlers::fraud::{list_fraud_reports, report_fraud};
use crate::handlers::jobs::{
    accept_job, assign_freelancer, complete_job, delete_job, edit_job, get_job, ignore_job,
    list_client_jobs, list_freelancer_jobs, list_jobs, post_job, set_price, update_payment,
};
use crate::handlers::users::{
    complete_profile, evaluate_quiz, generate_quiz, get_user, list_clients, list_freelancers,
    login, register_client, register_freelancer,
};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/jobs", post(post_job).get(list_jobs))
        .route("/jobs/client", get(list_client_jobs))
        .route("/jobs/freelancer/:id", get(list_freelancer_jobs))
        .route("/jobs/:id", get(get_job).put(edit_job).delete(delete_job))
        .route("/jobs/:id/assign", put(assign_freelancer))
        .route("/jobs/:id/price", put(set_price))
        .route("/jobs/:id/payment", put(update_payment))
        .route("/jobs/:id/accept", put(accept_job))
        .route("/jobs/:id/ignore", put(ignore_job))
        .route("/jobs/:id/complete", put(complete_job));

    let user_routes = Router::new()
        .route("/users/register/client", post(register_client))
        .route("/users/register/freelancer", post(register_freelancer))
        .route("/users/login", post(login))
        .route("/users/freelancers", get(list_freelancers))
        .route("/users/clients", get(list_clients))
        .route("/users/:id", get(get_user))
        .route("/users/:id/quiz", get(generate_quiz).post(evaluate_quiz))
        .route("/users/:id/profile", post(complete_profile));

    let admin_routes = Router::new()
        .route("/admin/login", post(admin_login))
        .route("/admin/freelancers", get(admin_list_freelancers))
        .route("/admin/clients", get(admin_list_clients))
        .route("/admin/analytics", get(analytics))
        .route("/admin/users/:id", delete(delete_user));

    let fraud_routes = Router::new()
        .route("/fraud/report", post(report_fraud))
        .route("/fraud/reports", get(list_fraud_reports));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(fraud_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route(
            "/metrics",
            get(move || std::future::ready(handle.render())),
        ),
        None => Router::new(),
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(timeout_layer(state.config.request_timeout))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

/// Requests running past `limit` are answered with 408.
fn timeout_layer(limit: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(20)));

        let response = app
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
